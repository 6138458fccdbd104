use crate::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredReport {
    #[serde(default)]
    report: ReportSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReportSection {
    #[serde(default)]
    text: String,
}

/// Хранилище текста доклада: `[report] text = "..."` в TOML-файле
#[derive(Debug, Clone)]
pub struct MessageStore {
    path: PathBuf,
}

impl MessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Отсутствующий файл читается как пустой текст
    pub fn load(&self) -> Result<String> {
        if !self.path.exists() {
            debug!("Файл текста {:?} ещё не создан", self.path);
            return Ok(String::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        let stored: StoredReport = toml::from_str(&raw)
            .with_context(|| format!("Не удалось разобрать {:?}", self.path))?;

        Ok(stored.report.text)
    }

    pub fn save(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredReport {
            report: ReportSection {
                text: text.to_string(),
            },
        };
        let raw = toml::to_string(&stored)
            .with_context(|| format!("Не удалось сериализовать текст для {:?}", self.path))?;
        fs::write(&self.path, raw)?;

        debug!("Текст сохранён в {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(dir.path().join("report.toml"));
        assert_eq!(store.load().unwrap(), "");
    }

    #[test]
    fn save_creates_parent_dirs_and_keeps_unicode_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(dir.path().join("auto-report").join("report.toml"));
        let text = "Доповідь: усе \"штатно\"\nбез змін";

        store.save(text).unwrap();
        assert_eq!(store.load().unwrap(), text);
    }

    #[test]
    fn broken_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        fs::write(&path, "[report\ntext = ").unwrap();

        let err = MessageStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
