use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_CLIENTS_FILE: &str = "clients.json";
const DEFAULT_INVOICES_FILE: &str = "invoices.json";
const DEFAULT_RECENT_LIMIT: usize = 5;

/// Configuration for billbook, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillbookConfig {
    /// File holding the clients collection, relative to the data dir
    #[serde(default = "default_clients_file")]
    pub clients_file: String,

    /// File holding the invoices collection, relative to the data dir
    #[serde(default = "default_invoices_file")]
    pub invoices_file: String,

    /// How many recent clients and invoices the dashboard shows
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_clients_file() -> String {
    DEFAULT_CLIENTS_FILE.to_string()
}

fn default_invoices_file() -> String {
    DEFAULT_INVOICES_FILE.to_string()
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for BillbookConfig {
    fn default() -> Self {
        Self {
            clients_file: default_clients_file(),
            invoices_file: default_invoices_file(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl BillbookConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: BillbookConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BillbookConfig::default();
        assert_eq!(config.clients_file, "clients.json");
        assert_eq!(config.invoices_file, "invoices.json");
        assert_eq!(config.recent_limit, 5);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = BillbookConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, BillbookConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"{"recent_limit": 10}"#,
        )
        .unwrap();

        let config = BillbookConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.clients_file, "clients.json");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("books");

        let config = BillbookConfig {
            invoices_file: "bills.json".to_string(),
            ..BillbookConfig::default()
        };
        config.save(&nested).unwrap();

        let loaded = BillbookConfig::load(&nested).unwrap();
        assert_eq!(loaded, config);
    }
}
