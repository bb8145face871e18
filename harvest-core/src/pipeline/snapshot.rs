//! File-backed record snapshots.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SnapshotError;
use crate::types::SnapshotRecord;

/// Ordered, append-only array of records stored as one pretty-printed JSON file.
///
/// The file is read once when opened. Every append rewrites the whole file
/// through a temp file and a rename, so the file on disk is always a complete
/// JSON array even if the process is killed mid-run. Only one writer per path.
pub struct Snapshot<R> {
    path: PathBuf,
    records: Vec<R>,
    ids: HashSet<String>,
}

impl<R: SnapshotRecord> Snapshot<R> {
    /// Open a snapshot, loading its records. A missing file is an empty snapshot.
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        let records: Vec<R> = read_json_or_default(path)?;
        let mut ids = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            // Older hand-made files may repeat an id; first occurrence wins.
            if ids.insert(record.record_id().to_string()) {
                unique.push(record);
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            records: unique,
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids already present in the snapshot.
    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one record and persist. Returns false (and writes nothing) if
    /// a record with the same id is already present.
    pub fn append(&mut self, record: R) -> Result<bool, SnapshotError> {
        if !self.ids.insert(record.record_id().to_string()) {
            return Ok(false);
        }
        self.records.push(record);
        self.flush()?;
        Ok(true)
    }

    /// Append every record whose id is new, then persist once.
    /// Returns how many records were added.
    pub fn extend<I>(&mut self, records: I) -> Result<usize, SnapshotError>
    where
        I: IntoIterator<Item = R>,
    {
        let mut added = 0;
        for record in records {
            if self.ids.insert(record.record_id().to_string()) {
                self.records.push(record);
                added += 1;
            }
        }
        if added > 0 || !self.path.exists() {
            self.flush()?;
        }
        Ok(added)
    }

    /// Rewrite the file from the in-memory records.
    pub fn flush(&self) -> Result<(), SnapshotError> {
        write_json_atomic(&self.path, &self.records)
    }
}

/// Read a JSON file into `T`, treating a missing file as `T::default()`.
pub fn read_json_or_default<T>(path: &Path) -> Result<T, SnapshotError>
where
    T: DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content).map_err(|source| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON file that must exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let content = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` as pretty JSON via a sibling temp file and a rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| SnapshotError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let write_err = |source: std::io::Error| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceEntry;
    use tempfile::TempDir;

    fn entry(id: &str) -> ServiceEntry {
        ServiceEntry {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let snapshot: Snapshot<ServiceEntry> =
            Snapshot::open(&dir.path().join("services.json")).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.ids().is_empty());
    }

    #[test]
    fn append_persists_every_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.json");

        let mut snapshot = Snapshot::open(&path).unwrap();
        assert!(snapshot.append(entry("a")).unwrap());
        assert!(snapshot.append(entry("b")).unwrap());

        let on_disk: Vec<ServiceEntry> = read_json(&path).unwrap();
        let ids: Vec<_> = on_disk.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!dir.path().join("services.json.tmp").exists());
    }

    #[test]
    fn append_rejects_known_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.json");

        let mut snapshot = Snapshot::open(&path).unwrap();
        snapshot.append(entry("a")).unwrap();
        assert!(!snapshot.append(entry("a")).unwrap());
        assert_eq!(snapshot.len(), 1);

        let reopened: Snapshot<ServiceEntry> = Snapshot::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.contains("a"));
    }

    #[test]
    fn extend_skips_known_ids_and_writes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.json");

        let mut snapshot = Snapshot::open(&path).unwrap();
        snapshot.append(entry("a")).unwrap();
        let added = snapshot
            .extend(vec![entry("a"), entry("b"), entry("c")])
            .unwrap();
        assert_eq!(added, 2);

        let reopened: Snapshot<ServiceEntry> = Snapshot::open(&path).unwrap();
        let ids: Vec<_> = reopened.records().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.json");
        fs::write(&path, "[{\"id\": ").unwrap();

        let result: Result<Snapshot<ServiceEntry>, _> = Snapshot::open(&path);
        assert!(matches!(result, Err(SnapshotError::Corrupt { .. })));
    }

    #[test]
    fn duplicate_ids_on_disk_collapse_to_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.json");
        fs::write(&path, r#"[{"id":"a","Note":1},{"id":"a","Note":2},{"id":"b"}]"#).unwrap();

        let snapshot: Snapshot<ServiceEntry> = Snapshot::open(&path).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records()[0].extra["Note"], 1);
    }
}
