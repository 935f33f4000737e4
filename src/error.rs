//! Error types shared by the calculator and its collaborators

use std::path::PathBuf;

/// Errors surfaced by the library.
///
/// The core pipeline (tiers, expansion, layout, routing) only ever returns
/// [`CalcError::InvalidInput`]; the remaining variants belong to the catalog
/// store, the importer and the settings loader.
#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    /// Rejected at the boundary before any expansion work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A catalog source could not be read or understood.
    #[error("catalog source '{source_name}': {detail}")]
    Catalog { source_name: String, detail: String },

    #[error("settings file {}: {detail}", file.display())]
    Settings { file: PathBuf, detail: String },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CalcError>;
