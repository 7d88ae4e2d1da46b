use serde::{Deserialize, Serialize};

use crate::error::{DfeError, Result};

/// Environment variable holding `key=value` overrides for [`EngineConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "DFE_CONFIG";

/// Per-session configuration.
///
/// Zero for `target_partitions` / `worker_threads` means "let the engine or
/// runtime pick" (usually the number of CPU cores).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub batch_size_rows: usize,
    pub target_partitions: usize,
    pub worker_threads: usize,
    pub information_schema: bool,
    pub default_catalog: String,
    pub default_schema: String,
    /// Maximum number of rows rendered by `show`; `None` renders everything.
    pub show_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size_rows: 8192,
            target_partitions: 0,
            worker_threads: 0,
            information_schema: false,
            default_catalog: "datafusion".to_string(),
            default_schema: "public".to_string(),
            show_limit: None,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON-encoded config. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(raw)
            .map_err(|e| DfeError::InvalidConfig(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from key/value pairs (`key=value,key=value`).
    pub fn from_kv(raw: &str) -> Result<Self> {
        let mut config = EngineConfig::default();
        config.apply_kv(raw)?;
        Ok(config)
    }

    /// Default config with overrides from `DFE_CONFIG`, if set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(raw) => Self::from_kv(&raw),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(DfeError::InvalidConfig(format!("{CONFIG_ENV_VAR}: {e}"))),
        }
    }

    /// Applies `key=value` pairs separated by `,` or `;`. Keys are
    /// case-insensitive. The config is validated after all pairs are applied.
    pub fn apply_kv(&mut self, kv: &str) -> Result<()> {
        for pair in kv
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let Some((k, v)) = pair.split_once('=') else {
                return Err(DfeError::InvalidConfig(format!(
                    "invalid config pair '{pair}', expected key=value"
                )));
            };
            let key = k.trim().to_ascii_lowercase();
            let value = v.trim();
            match key.as_str() {
                "batch_size_rows" => self.batch_size_rows = parse_usize(&key, value)?,
                "target_partitions" => self.target_partitions = parse_usize(&key, value)?,
                "worker_threads" => self.worker_threads = parse_usize(&key, value)?,
                "information_schema" => self.information_schema = parse_bool(value)?,
                "default_catalog" => self.default_catalog = value.to_string(),
                "default_schema" => self.default_schema = value.to_string(),
                "show_limit" => {
                    self.show_limit = match value.to_ascii_lowercase().as_str() {
                        "" | "none" | "off" => None,
                        _ => Some(parse_usize(&key, value)?),
                    }
                }
                other => {
                    return Err(DfeError::InvalidConfig(format!(
                        "unknown config key '{other}'"
                    )));
                }
            }
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size_rows == 0 {
            return Err(DfeError::InvalidConfig(
                "batch_size_rows must be greater than zero".to_string(),
            ));
        }
        if self.default_catalog.trim().is_empty() {
            return Err(DfeError::InvalidConfig(
                "default_catalog must not be empty".to_string(),
            ));
        }
        if self.default_schema.trim().is_empty() {
            return Err(DfeError::InvalidConfig(
                "default_schema must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.parse()
        .map_err(|e| DfeError::InvalidConfig(format!("invalid {key} '{raw}': {e}")))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(DfeError::InvalidConfig(format!(
            "invalid bool value '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kv_updates_config() {
        let mut cfg = EngineConfig::default();
        cfg.apply_kv("batch_size_rows=1024; TARGET_PARTITIONS=4,information_schema=on")
            .expect("kv parse");
        assert_eq!(cfg.batch_size_rows, 1024);
        assert_eq!(cfg.target_partitions, 4);
        assert!(cfg.information_schema);
        assert_eq!(cfg.default_catalog, "datafusion");
    }

    #[test]
    fn show_limit_accepts_none() {
        let cfg = EngineConfig::from_kv("show_limit=10").expect("kv");
        assert_eq!(cfg.show_limit, Some(10));
        let cfg = EngineConfig::from_kv("show_limit=none").expect("kv");
        assert_eq!(cfg.show_limit, None);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let err = EngineConfig::from_kv("spill_dir=/tmp").expect_err("unknown key");
        assert!(err.to_string().contains("unknown config key 'spill_dir'"));

        let err = EngineConfig::from_kv("batch_size_rows").expect_err("missing value");
        assert!(err.to_string().contains("expected key=value"));

        let err = EngineConfig::from_kv("information_schema=maybe").expect_err("bad bool");
        assert!(err.to_string().contains("invalid bool value"));

        let err = EngineConfig::from_kv("batch_size_rows=0").expect_err("zero batch");
        assert!(err.to_string().contains("batch_size_rows"));
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let cfg = EngineConfig::from_json(r#"{"target_partitions": 2}"#).expect("json");
        assert_eq!(cfg.target_partitions, 2);
        assert_eq!(cfg.batch_size_rows, EngineConfig::default().batch_size_rows);

        let err = EngineConfig::from_json(r#"{"default_schema": " "}"#).expect_err("empty schema");
        assert!(matches!(err, DfeError::InvalidConfig(_)));
    }
}
