use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::StatsiteError;

/// Flat, typed configuration. The dotted keys in the config file
/// (`store.port`, `metrics.ms.percentile`, ...) are a TOML-table surface
/// notation only; they flatten into this struct at load time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub flush_interval: u64,
    pub collector: Collector,
    pub store: Store,
    pub metrics: Metrics,
    pub aliveness_check: AlivenessCheck,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Collector {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Store {
    pub host: String,
    pub port: u16,
    pub prefix: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub ms: MsMetrics,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MsMetrics {
    pub percentile: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlivenessCheck {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flush_interval: 10,
            collector: Collector {
                host: "0.0.0.0".to_string(),
                port: 8125,
            },
            store: Store {
                host: "localhost".to_string(),
                port: 2003,
                prefix: "statsite".to_string(),
                attempts: 3,
            },
            metrics: Metrics {
                ms: MsMetrics { percentile: 90 },
            },
            aliveness_check: AlivenessCheck {
                enabled: false,
                host: "0.0.0.0".to_string(),
                port: 8325,
            },
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Config::default().collector
    }
}

impl Default for Store {
    fn default() -> Self {
        Config::default().store
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Config::default().metrics
    }
}

impl Default for MsMetrics {
    fn default() -> Self {
        Config::default().metrics.ms
    }
}

impl Default for AlivenessCheck {
    fn default() -> Self {
        Config::default().aliveness_check
    }
}

impl Config {
    /// Loads a TOML config file, falling back to defaults for any key the
    /// file omits. A missing file is not an error; a present-but-unparsable
    /// one is.
    pub fn load(path: &Path) -> Result<Self, StatsiteError> {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|source| StatsiteError::ConfigParse { path: path.to_path_buf(), source }),
            Err(_) => Ok(Config::default()),
        }
    }

    pub fn validate(&self) -> Result<(), StatsiteError> {
        if self.store.attempts < 2 {
            return Err(StatsiteError::InvalidConfig {
                reason: format!("store.attempts must be >= 2, got {}", self.store.attempts),
            });
        }
        if !(1..=99).contains(&self.metrics.ms.percentile) {
            return Err(StatsiteError::InvalidConfig {
                reason: format!(
                    "metrics.ms.percentile must be in 1..99, got {}",
                    self.metrics.ms.percentile
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_documented_table() {
        let cfg = Config::default();
        assert_eq!(cfg.flush_interval, 10);
        assert_eq!(cfg.collector.port, 8125);
        assert_eq!(cfg.store.port, 2003);
        assert_eq!(cfg.store.prefix, "statsite");
        assert_eq!(cfg.store.attempts, 3);
        assert_eq!(cfg.metrics.ms.percentile, 90);
        assert!(!cfg.aliveness_check.enabled);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load(Path::new("/nonexistent/statsite.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_only_overrides_given_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "flush_interval = 30\n[store]\nprefix = \"custom\"").unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.flush_interval, 30);
        assert_eq!(cfg.store.prefix, "custom");
        assert_eq!(cfg.store.port, 2003);
    }

    #[test]
    fn rejects_too_few_attempts() {
        let mut cfg = Config::default();
        cfg.store.attempts = 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_percentile_out_of_range() {
        let mut cfg = Config::default();
        cfg.metrics.ms.percentile = 100;
        assert!(cfg.validate().is_err());
    }
}
