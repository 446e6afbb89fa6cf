use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "carebook";

pub const DEFAULT_API_URL: &str = "http://localhost:8084";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_URL_ENV: &str = "CAREBOOK_API_URL";
pub const TIMEOUT_ENV: &str = "CAREBOOK_TIMEOUT_SECS";

/// Where the appointment service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        ClientConfig {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    /// Defaults overridden by `CAREBOOK_API_URL` / `CAREBOOK_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable or blank values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let timeout_secs = lookup(TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.timeout_secs);

        Self::new(&base_url, timeout_secs)
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
            self.timeout_secs = secs;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, "http://localhost:8084");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://clinic.example.org/"),
            (TIMEOUT_ENV, "5"),
        ]));
        assert_eq!(config.base_url, "https://clinic.example.org");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_falls_back() {
        let config = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        let config = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "0")]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn flags_override_environment() {
        let config = ClientConfig::default()
            .with_base_url(Some("http://10.0.0.2:9000/".to_string()))
            .with_timeout(Some(12));
        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(
            config.endpoint("/api/appointments/7/status"),
            "http://10.0.0.2:9000/api/appointments/7/status"
        );
    }

    #[test]
    fn app_name_is_carebook() {
        assert_eq!(APP_NAME, "carebook");
    }
}
