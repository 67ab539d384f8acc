//! Folder scanning for platform catalogs.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::{CatalogError, Result};
use crate::models::CatalogEntry;

/// Collect playable files from a platform's root folders.
///
/// Folders are visited in the configured order and walked recursively;
/// the first file seen for a given case-insensitive filename wins, so
/// earlier folders shadow later ones. A missing or inaccessible folder
/// contributes nothing and is not an error. Cancellation is checked
/// before each folder is entered.
pub fn collect_platform_files(
    root_folders: &[PathBuf],
    extensions: &[String],
    cancel: &CancelToken,
) -> Result<Vec<CatalogEntry>> {
    let accepted = normalize_extensions(extensions);
    let mut entries = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for root in root_folders {
        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        if !root.is_dir() {
            log::debug!("skipping missing folder {}", root.display());
            continue;
        }

        for result in WalkDir::new(root).follow_links(false) {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) if is_skippable(&err) => {
                    log::debug!("skipping inaccessible path under {}: {}", root.display(), err);
                    continue;
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| root.clone());
                    return Err(CatalogError::Scan {
                        path,
                        source: err.into(),
                    });
                }
            };

            if entry.file_type().is_dir() {
                if cancel.is_canceled() {
                    return Err(CatalogError::Canceled);
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let matches_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| accepted.iter().any(|a| a.eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if !matches_extension {
                continue;
            }

            let candidate = CatalogEntry::new(path);
            if candidate.file_name.is_empty() {
                continue;
            }
            if seen.insert(candidate.dedup_key()) {
                entries.push(candidate);
            }
        }
    }

    Ok(entries)
}

/// Strips leading dots so both `".zip"` and `"zip"` work in platform
/// definitions.
fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Absent or permission-denied paths degrade to an empty contribution;
/// anything else is an unexpected failure and propagates.
fn is_skippable(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|io_err| {
            matches!(
                io_err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            )
        })
        .unwrap_or(false)
}
