use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::DB_FILE;
use crate::error::{ContiError, Result};
use crate::importer::DictionaryKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub import: ImportSettings,
}

/// Where the dictionary workbooks live. A relative `base_dir` is resolved against `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    #[serde(default = "default_vat_file")]
    pub vat_file: String,
    #[serde(default = "default_withholding_file")]
    pub withholding_file: String,
}

fn default_base_dir() -> String {
    "import".to_string()
}

fn default_accounts_file() -> String {
    "Piano dei conti.XLSX".to_string()
}

fn default_vat_file() -> String {
    "Codici IVA.XLSX".to_string()
}

fn default_withholding_file() -> String {
    "Tabella Ritenute.XLSX".to_string()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            accounts_file: default_accounts_file(),
            vat_file: default_vat_file(),
            withholding_file: default_withholding_file(),
        }
    }
}

impl ImportSettings {
    pub fn file_name(&self, kind: DictionaryKind) -> &str {
        match kind {
            DictionaryKind::Accounts => &self.accounts_file,
            DictionaryKind::VatCodes => &self.vat_file,
            DictionaryKind::WithholdingTypes => &self.withholding_file,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            import: ImportSettings::default(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }

    pub fn import_dir(&self) -> PathBuf {
        let base = PathBuf::from(&self.import.base_dir);
        if base.is_absolute() {
            base
        } else {
            PathBuf::from(&self.data_dir).join(base)
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("conti")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("conti")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ContiError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            import: ImportSettings {
                base_dir: "/srv/xlsx".to_string(),
                ..Default::default()
            },
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.import.base_dir, "/srv/xlsx");
        assert_eq!(loaded.import.vat_file, "Codici IVA.XLSX");
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("missing.json"));
        assert!(!s.data_dir.is_empty());
        assert_eq!(s.import, ImportSettings::default());
    }

    #[test]
    fn test_load_returns_defaults_when_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let s = load_settings_from(&path);
        assert_eq!(s.import.base_dir, "import");
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "import": {"vat_file": "iva.xlsx"}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.import.vat_file, "iva.xlsx");
        assert_eq!(s.import.accounts_file, "Piano dei conti.XLSX");
        assert_eq!(s.import.file_name(DictionaryKind::VatCodes), "iva.xlsx");
    }

    #[test]
    fn test_import_dir_resolution() {
        let mut s = Settings {
            data_dir: "/data/conti".to_string(),
            import: ImportSettings::default(),
        };
        assert_eq!(s.import_dir(), PathBuf::from("/data/conti/import"));
        assert_eq!(s.db_path(), PathBuf::from("/data/conti/conti.db"));
        s.import.base_dir = "/elsewhere".to_string();
        assert_eq!(s.import_dir(), PathBuf::from("/elsewhere"));
    }
}
