use anyhow::{Context, Result};
use harvest_core::ProjectedSpecialist;
use std::io::Write;
use std::path::Path;

const COLUMNS: [&str; 7] = [
    "Id",
    "FirstName",
    "LastName",
    "Title",
    "ShortDescription",
    "Presentation",
    "ServiceIds",
];

/// Write projected specialists as CSV, one row per specialist.
pub fn write_csv<W: Write>(writer: W, specialists: &[ProjectedSpecialist]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COLUMNS)?;
    for s in specialists {
        csv.write_record([
            s.id.as_str(),
            s.first_name.as_str(),
            s.last_name.as_str(),
            s.title.as_str(),
            s.short_description.as_str(),
            s.presentation.as_str(),
            s.services.join(", ").as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Export projected specialists to a CSV file.
pub fn export_csv(specialists: &[ProjectedSpecialist], output_path: &Path) -> Result<()> {
    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let file = std::fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
    write_csv(file, specialists)
        .with_context(|| format!("Failed to write CSV: {}", output_path.display()))?;

    tracing::info!(
        rows = specialists.len(),
        "CSV file has been saved to {}",
        output_path.display()
    );
    Ok(())
}
