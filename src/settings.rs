//! Persisted preferences. Loaded once at start-up, written through on every change.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::currency::Currency;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(Error::UnknownTheme(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Where downloaded PDFs and the live preview go. `~` is expanded.
    pub output_dir: String,
    pub theme: Theme,
    pub currency: Currency,
    pub typst_bin: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/Documents/Invoices".to_string(),
            theme: Theme::default(),
            currency: Currency::default(),
            typst_bin: "typst".to_string(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "sample-invoice", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

/// Scratch space for engine input/output files.
pub fn scratch_dir() -> PathBuf {
    ProjectDirs::from("com", "sample-invoice", "app")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("sample-invoice"))
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

impl AppSettings {
    /// Persisted settings, or defaults if none were saved yet or the file is unreadable.
    pub fn load() -> Self {
        Self::load_or_default(&config_path())
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring settings file; using defaults");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Updates the theme and writes the settings to `path` immediately.
    pub fn set_theme(&mut self, theme: Theme, path: &Path) -> Result<()> {
        self.theme = theme;
        self.save_to(path)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.output_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.theme, Theme::System);
    }

    #[test]
    fn theme_change_is_written_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let mut settings = AppSettings::default();
        settings.set_theme(Theme::Dark, &path).unwrap();

        let reloaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(reloaded.theme, Theme::Dark);
        assert!(fs::read_to_string(&path).unwrap().contains("theme = \"dark\""));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "currency = \"EUR\"\n").unwrap();
        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.currency, Currency::Eur);
        assert_eq!(settings.typst_bin, "typst");
    }

    #[test]
    fn bad_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "theme = 42\n").unwrap();
        let err = AppSettings::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::SettingsParse { .. }));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "theme = \"solarized\"\n").unwrap();
        assert!(AppSettings::load_from(&path).is_err());
        assert_eq!(AppSettings::load_or_default(&path), AppSettings::default());

        let mut settings = AppSettings::load_or_default(&path);
        settings.set_theme(Theme::Light, &path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap().theme, Theme::Light);
    }

    #[test]
    fn parses_theme_names() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
