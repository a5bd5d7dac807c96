use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("audit_log_capacity must be at least 1")]
    ZeroAuditCapacity,
}

/// Engine-wide settings shared by every loaded project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Applied when `recalculate` is called without an explicit deadline.
    pub default_timeout_ms: Option<u64>,
    /// In-memory audit records kept per project; the oldest are evicted first.
    pub audit_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: None,
            audit_log_capacity: 1_000,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit_log_capacity == 0 {
            return Err(ConfigError::ZeroAuditCapacity);
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"default_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.default_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.audit_log_capacity, 1_000);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = EngineConfig {
            audit_log_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroAuditCapacity)));
    }
}
