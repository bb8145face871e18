//! Static request header sets.

/// Ordered list of request headers sent verbatim with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(Vec<(String, String)>);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, replacing any previous value with the same name.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.0.push((name.to_string(), value.to_string()));
        self
    }

    /// Headers the detail endpoints expect from the booking site's frontend.
    pub fn detail_api(subscription_key: &str, origin: &str, language: &str) -> Self {
        Self::new()
            .with("accept", "application/json, text/plain, */*")
            .with("accept-language", &format!("{}-{}", language, language.to_uppercase()))
            .with("ocp-apim-subscription-key", subscription_key)
            .with("origin", origin)
            .with("priority", "u=1, i")
            .with("sec-fetch-dest", "empty")
            .with("sec-fetch-mode", "cors")
            .with("sec-fetch-site", "same-site")
            .with("user-agent", BROWSER_USER_AGENT)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_api_headers_carry_key_and_origin() {
        let headers = HeaderSet::detail_api("secret", "https://booking.example", "fi");
        assert_eq!(headers.get("ocp-apim-subscription-key"), Some("secret"));
        assert_eq!(headers.get("Origin"), Some("https://booking.example"));
        assert_eq!(headers.get("accept-language"), Some("fi-FI"));
        assert!(headers.get("user-agent").is_some());
    }

    #[test]
    fn with_replaces_existing_header() {
        let headers = HeaderSet::new().with("accept", "a").with("Accept", "b");
        assert_eq!(headers.iter().count(), 1);
        assert_eq!(headers.get("accept"), Some("b"));
    }
}
