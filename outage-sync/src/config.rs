use serde::Deserialize;
use site_api::ApiConfig;
use site_api::config::ValidationError;
use std::fmt;
use std::fs::File;
use std::path::Path;

pub const DEFAULT_SITE_ID: &str = "norwich-pear-tree";
pub const DEFAULT_LOG_LEVEL: &str = "info,site_api=debug,outage_sync=debug";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// A `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: DEFAULT_LOG_LEVEL.into(),
            sentry_dsn: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

/// Contents of the optional YAML config file. Secrets and the site are not
/// read from here, they come from the command line or the environment.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

/// Everything a run needs, resolved once at startup and passed to `run`.
#[derive(Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub api_key: String,
    pub site_id: String,
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
}

impl Config {
    /// Combines the file config with the values taken from the command line
    /// or environment. Empty values count as unset.
    pub fn resolve(
        file: FileConfig,
        api_key: Option<String>,
        site_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        file.api.validate()?;

        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let site_id = site_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_ID.to_string());

        Ok(Config {
            api: file.api,
            api_key,
            site_id,
            logging: file.logging,
            metrics: file.metrics,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api", &self.api)
            .field("api_key", &"<redacted>")
            .field("site_id", &self.site_id)
            .field("logging", &self.logging)
            .field("metrics", &self.metrics)
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("no API key found, set KRAKENFLEX_API_KEY or pass --api-key")]
    MissingApiKey,
    #[error("invalid api config: {0}")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config_file() {
        let yaml = r#"
            api:
                base_url: http://127.0.0.1:8080/v1
                max_attempts: 4
                retry_delay_ms: 250
            logging:
                level: debug
                sentry_dsn: https://public@sentry.example.com/1
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            "#;
        let tmp = write_tmp_file(yaml);
        let config = FileConfig::from_file(tmp.path()).expect("load config");

        assert_eq!(config.api.base_url, "http://127.0.0.1:8080/v1");
        assert_eq!(config.api.max_attempts, 4);
        assert_eq!(config.api.retry_delay_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.logging.sentry_dsn.as_deref(),
            Some("https://public@sentry.example.com/1")
        );
        assert_eq!(
            config.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125
            })
        );
    }

    #[test]
    fn empty_config_file_uses_defaults() {
        let tmp = write_tmp_file("{}");
        let config = FileConfig::from_file(tmp.path()).expect("load config");
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api.max_attempts, 3);
    }

    #[test]
    fn missing_file() {
        let result = FileConfig::from_file(Path::new("/nonexistent/outage-sync.yaml"));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn invalid_yaml() {
        let tmp = write_tmp_file("api: 42");
        let result = FileConfig::from_file(tmp.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn resolve_defaults_site_id() {
        let config =
            Config::resolve(FileConfig::default(), Some("secret".into()), None).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.site_id, DEFAULT_SITE_ID);

        let config = Config::resolve(
            FileConfig::default(),
            Some("secret".into()),
            Some("kingfisher".into()),
        )
        .unwrap();
        assert_eq!(config.site_id, "kingfisher");
    }

    #[test]
    fn resolve_requires_api_key() {
        let result = Config::resolve(FileConfig::default(), None, None);
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));

        let result = Config::resolve(FileConfig::default(), Some("".into()), None);
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn resolve_validates_api_section() {
        let mut file = FileConfig::default();
        file.api.max_attempts = 0;
        let result = Config::resolve(file, Some("secret".into()), None);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_hides_api_key() {
        let config =
            Config::resolve(FileConfig::default(), Some("secret".into()), None).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }
}
