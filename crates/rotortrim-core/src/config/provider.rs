//! Single-initialization config loading
//!
//! A [`ConfigProvider`] parses its source at most once. Every caller of
//! [`ConfigProvider::load`], concurrent or not, receives the same
//! `Arc<Config>` (or the same [`ConfigError`]).

use super::Config;
use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Serialization format of a config document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn parse(self, text: &str) -> Result<Config, ConfigError> {
        match self {
            Self::Toml => Config::from_toml_str(text),
            Self::Json => Config::from_json_str(text),
        }
    }
}

/// Where the parameter set comes from
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// The set compiled into the crate
    Embedded,

    /// A `.toml` or `.json` file on disk
    Path(PathBuf),

    /// An in-memory document
    Inline { format: ConfigFormat, text: String },
}

impl ConfigSource {
    fn read(&self) -> Result<Config, ConfigError> {
        match self {
            Self::Embedded => Config::embedded(),
            Self::Path(path) => {
                let format = ConfigFormat::from_path(path)?;
                let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                format.parse(&text)
            }
            Self::Inline { format, text } => format.parse(text),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => f.write_str("embedded"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Inline { format, .. } => write!(f, "inline {:?}", format),
        }
    }
}

/// Loads a [`Config`] once and hands out shared references
#[derive(Debug)]
pub struct ConfigProvider {
    source: ConfigSource,
    cell: OnceLock<Result<Arc<Config>, ConfigError>>,
}

impl ConfigProvider {
    /// Create a provider for a source; nothing is read until `load`
    pub fn new(source: ConfigSource) -> Self {
        Self {
            source,
            cell: OnceLock::new(),
        }
    }

    /// Provider for the shipped parameter set
    pub fn embedded() -> Self {
        Self::new(ConfigSource::Embedded)
    }

    /// Provider for a config file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ConfigSource::Path(path.into()))
    }

    /// Provider wrapping an already-built config
    pub fn with_config(config: Config) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::new(config)));
        Self {
            source: ConfigSource::Embedded,
            cell,
        }
    }

    /// The configured source
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Whether a load has already been attempted
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Parse on first call, then return the cached outcome
    pub fn load(&self) -> Result<Arc<Config>, ConfigError> {
        self.cell
            .get_or_init(|| {
                let result = self.source.read().map(Arc::new);
                match &result {
                    Ok(_) => tracing::info!("Config loaded from {}", self.source),
                    Err(e) => tracing::error!("Config load failed: {}", e),
                }
                result
            })
            .clone()
    }
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_is_idempotent() {
        let provider = ConfigProvider::embedded();
        assert!(!provider.is_loaded());

        let first = provider.load().unwrap();
        let second = provider.load().unwrap();

        assert!(provider.is_loaded());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_callers_share_one_instance() {
        let provider = ConfigProvider::embedded();

        let loaded: Vec<Arc<Config>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| provider.load())).collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        for config in &loaded[1..] {
            assert!(Arc::ptr_eq(&loaded[0], config));
        }
    }

    #[test]
    fn test_failure_is_cached() {
        let provider = ConfigProvider::new(ConfigSource::Inline {
            format: ConfigFormat::Json,
            text: "{}".to_string(),
        });

        let first = provider.load().unwrap_err();
        let second = provider.load().unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first, ConfigError::MissingKey("track_pair_tol_in".into()));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let config = Config::embedded().unwrap();
        write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();

        let provider = ConfigProvider::from_path(file.path());
        assert_eq!(*provider.load().unwrap(), config);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", super::super::EMBEDDED_TOML).unwrap();

        let provider = ConfigProvider::from_path(file.path());
        assert_eq!(provider.load().unwrap().pair_separation_in, 1.75);
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let provider = ConfigProvider::from_path("params.yaml");
        assert!(matches!(
            provider.load(),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let provider = ConfigProvider::from_path("/nonexistent/rotortrim/params.toml");
        assert!(matches!(provider.load(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_with_config_skips_parsing() {
        let mut config = Config::embedded().unwrap();
        config.ground_ips_limit = 0.2;

        let provider = ConfigProvider::with_config(config);
        assert!(provider.is_loaded());
        assert_eq!(provider.load().unwrap().ground_ips_limit, 0.2);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ConfigProvider::embedded().source().to_string(), "embedded");
        assert_eq!(
            ConfigProvider::from_path("/etc/rotortrim/set.toml").source().to_string(),
            "/etc/rotortrim/set.toml"
        );
        let inline = ConfigSource::Inline {
            format: ConfigFormat::Toml,
            text: String::new(),
        };
        assert_eq!(inline.to_string(), "inline Toml");
    }
}
