use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/ows";
pub const DEFAULT_STORE_PATH: &str = "wfs.sqlite";

/// Service settings.
///
/// `base_url` is the endpoint advertised in the Capabilities document and
/// `store_path` the SQLite file holding the catalog and the layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WfsConfig {
    pub base_url: String,
    pub store_path: PathBuf,
}

impl Default for WfsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl WfsConfig {
    /// Defaults overridden by `WFS_BASE_URL` and `WFS_STORE_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("WFS_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(path) = lookup("WFS_STORE_PATH").filter(|v| !v.is_empty()) {
            self.store_path = PathBuf::from(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_service() {
        let config = WfsConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/ows");
        assert_eq!(config.store_path, PathBuf::from("wfs.sqlite"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = HashMap::from([
            ("WFS_BASE_URL", "https://maps.example.org/ows"),
            ("WFS_STORE_PATH", ""),
        ]);
        let mut config = WfsConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "https://maps.example.org/ows");
        // empty values are ignored
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }
}
