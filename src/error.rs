use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors surfaced by the catalog engine.
///
/// Missing or unreadable root folders are not errors; they simply
/// contribute nothing to a scan. Empty filter results are valid results.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The load was superseded by a newer request and stopped early.
    /// The UI sink has already been told to clear.
    #[error("load canceled by a newer request")]
    Canceled,

    /// An unexpected I/O failure mid-scan. Absent folders never produce
    /// this; it means something went wrong while reading a folder that
    /// was supposed to be readable.
    #[error("scan failed under {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// True for the low-severity cancellation case, which callers log
    /// quietly instead of reporting to the user.
    pub fn is_canceled(&self) -> bool {
        matches!(self, CatalogError::Canceled)
    }
}
