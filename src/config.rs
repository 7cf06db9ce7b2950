use crate::providers::FolderType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    /// Maildir++ root of the account
    pub path: PathBuf,
    /// Local/offline account (reported with type "none")
    #[serde(default)]
    pub local: bool,
    /// Folder path -> type, for folders the layout cannot tag by itself
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub folder_types: HashMap<String, FolderType>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub locale: Option<String>,
    pub skip_local_account: Option<bool>,
    pub page_size: Option<usize>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("junk-sweeper")
}

fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let dir = config_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path(), content)?;
        Ok(())
    }

    /// Configured locale, then $LANG, then English
    pub fn locale(&self) -> String {
        self.locale
            .clone()
            .or_else(|| std::env::var("LANG").ok())
            .unwrap_or_else(|| "en".to_string())
    }

    pub fn skip_local_account(&self) -> bool {
        self.skip_local_account.unwrap_or(false)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    pub fn account(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "locale": "fr",
            "skip_local_account": true,
            "page_size": 25,
            "accounts": [
                {
                    "name": "Work",
                    "path": "/home/me/Mail/work",
                    "folder_types": { "/Junk E-mail": "junk", "/Deleted Items": "trash" }
                },
                { "name": "Local Folders", "path": "/home/me/Mail/local", "local": true }
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.locale(), "fr");
        assert!(config.skip_local_account());
        assert_eq!(config.page_size(), 25);
        let work = config.account("Work").unwrap();
        assert!(!work.local);
        assert_eq!(work.folder_types.get("/Junk E-mail"), Some(&FolderType::Junk));
        assert!(config.account("Local Folders").unwrap().local);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(!config.skip_local_account());
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_page_size_never_zero() {
        let config = Config {
            page_size: Some(0),
            ..Config::default()
        };
        assert_eq!(config.page_size(), 1);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_invalid_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
