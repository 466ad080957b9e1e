use engine::DocumentMeta;
use engine::classifier::{DEFAULT_PREFIX, DEFAULT_ROUTING_PREFIX, DEFAULT_URL_SCHEME, Namespaces};
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "Demo dashboard";
pub const DEFAULT_OUTPUT_PATH: &str = "config.yml";

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    /// Default filter when `RUST_LOG` is unset, e.g. `info` or `engine=debug`.
    pub level: Option<String>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: DEFAULT_OUTPUT_PATH.into(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct LabelsConfig {
    pub prefix: String,
    pub routing_prefix: String,
    pub url_scheme: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        LabelsConfig {
            prefix: DEFAULT_PREFIX.into(),
            routing_prefix: DEFAULT_ROUTING_PREFIX.into(),
            url_scheme: DEFAULT_URL_SCHEME.into(),
        }
    }
}

impl From<&LabelsConfig> for Namespaces {
    fn from(labels: &LabelsConfig) -> Self {
        Namespaces {
            prefix: labels.prefix.clone(),
            routing_prefix: labels.routing_prefix.clone(),
            url_scheme: labels.url_scheme.clone(),
        }
    }
}

/// Metadata the document starts with, and returns to on every rescan.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    pub title: String,
    pub subtitle: String,
    pub logo: String,
    pub icon: String,
    pub header: bool,
    pub footer: String,
    pub theme: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            title: DEFAULT_TITLE.into(),
            subtitle: String::new(),
            logo: String::new(),
            icon: String::new(),
            header: false,
            footer: String::new(),
            theme: String::new(),
        }
    }
}

impl From<&DocumentConfig> for DocumentMeta {
    fn from(document: &DocumentConfig) -> Self {
        DocumentMeta {
            title: document.title.clone(),
            subtitle: document.subtitle.clone(),
            logo: document.logo.clone(),
            icon: document.icon.clone(),
            header: document.header,
            footer: document.footer.clone(),
            theme: document.theme.clone(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct DockerConfig {
    /// Also read labels from swarm services.
    pub include_services: bool,
}

impl Default for DockerConfig {
    fn default() -> Self {
        DockerConfig {
            include_services: true,
        }
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.output.path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOutputPath);
        }

        for prefix in [&self.labels.prefix, &self.labels.routing_prefix] {
            if prefix.is_empty() {
                return Err(ValidationError::EmptyPrefix);
            }
            if prefix.starts_with('.') || prefix.ends_with('.') {
                return Err(ValidationError::InvalidPrefix(prefix.clone()));
            }
        }

        if namespaces_overlap(&self.labels.prefix, &self.labels.routing_prefix) {
            return Err(ValidationError::OverlappingPrefixes(
                self.labels.prefix.clone(),
                self.labels.routing_prefix.clone(),
            ));
        }

        if self.labels.url_scheme.is_empty() {
            return Err(ValidationError::EmptyUrlScheme);
        }

        if let Some(metrics) = &self.metrics
            && metrics.statsd_port == 0
        {
            return Err(ValidationError::InvalidPort);
        }

        Ok(())
    }
}

// True when one prefix equals the other or lies under it.
fn namespaces_overlap(a: &str, b: &str) -> bool {
    let under = |inner: &str, outer: &str| {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    };
    under(a, b) || under(b, a)
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Output path cannot be empty")]
    EmptyOutputPath,

    #[error("Label prefix cannot be empty")]
    EmptyPrefix,

    #[error("Label prefix cannot start or end with a dot: {0}")]
    InvalidPrefix(String),

    #[error("Label prefix {0} and routing prefix {1} overlap")]
    OverlappingPrefixes(String, String),

    #[error("URL scheme cannot be empty")]
    EmptyUrlScheme,

    #[error("Port cannot be 0")]
    InvalidPort,
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
    fn test_full_config() {
        let yaml = r#"
            output:
                path: /srv/homer/assets/config.yml
            labels:
                prefix: dash
                routing_prefix: traefik.http.routers
                url_scheme: http
            document:
                title: Homelab
                header: true
                theme: dark
            docker:
                include_services: false
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
                level: debug
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.validate().is_ok());

        assert_eq!(config.output.path, PathBuf::from("/srv/homer/assets/config.yml"));
        assert_eq!(config.labels.prefix, "dash");
        assert_eq!(config.labels.url_scheme, "http");
        assert!(!config.docker.include_services);
        assert_eq!(
            config.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125
            })
        );
        assert_eq!(
            config.logging.and_then(|l| l.level),
            Some("debug".to_string())
        );

        let meta = DocumentMeta::from(&config.document);
        assert_eq!(meta.title, "Homelab");
        assert!(meta.header);
        assert_eq!(meta.theme, "dark");
        assert_eq!(meta.subtitle, "");
    }

    #[test]
    fn test_defaults() {
        let tmp = write_tmp_file("{}");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert_eq!(config, Config::default());

        assert_eq!(config.output.path, PathBuf::from("config.yml"));
        assert_eq!(Namespaces::from(&config.labels), Namespaces::default());
        assert_eq!(DocumentMeta::from(&config.document).title, "Demo dashboard");
        assert!(config.docker.include_services);
        assert!(config.metrics.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_default_title() {
        let tmp = write_tmp_file("document:\n  subtitle: Homelab\n");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert_eq!(config.document.title, "Demo dashboard");
        assert_eq!(config.document.subtitle, "Homelab");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.labels.prefix = "".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyPrefix
        ));

        let mut config = Config::default();
        config.labels.routing_prefix = "traefik.http.routers.".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPrefix(_)
        ));

        let mut config = Config::default();
        config.labels.url_scheme = "".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyUrlScheme
        ));

        let mut config = Config::default();
        config.output.path = PathBuf::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyOutputPath
        ));

        let config = Config {
            metrics: Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 0,
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));
    }

    #[test]
    fn test_overlapping_prefixes() {
        for (prefix, routing_prefix) in [
            ("homer", "homer"),
            ("homer", "homer.routers"),
            ("traefik.http.routers.dash", "traefik.http.routers"),
        ] {
            let mut config = Config::default();
            config.labels.prefix = prefix.into();
            config.labels.routing_prefix = routing_prefix.into();
            assert!(matches!(
                config.validate().unwrap_err(),
                ValidationError::OverlappingPrefixes(_, _)
            ));
        }

        // Sharing leading characters is fine as long as the segments differ
        let mut config = Config::default();
        config.labels.prefix = "traefik-dash".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/dashsync.yaml")),
            Err(ConfigError::LoadError(_))
        ));

        let tmp = write_tmp_file("metrics:\n  statsd_host: localhost\n  statsd_port: not_a_number\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
