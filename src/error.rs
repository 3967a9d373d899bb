use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// The PDF engine ran but did not produce a document.
    #[error("PDF engine failed for {job}: {reason}")]
    Engine { job: String, reason: String },

    #[error("could not parse settings at {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    #[error("prompt cancelled: {0}")]
    Prompt(#[from] inquire::InquireError),
}
