//! Ordering of catalog lists before pagination.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::models::{CatalogEntry, PlatformDefinition};

/// Orders a list according to the platform's presentation preferences.
///
/// Default ordering is the filename, case-insensitive. Arcade platforms
/// with the description preference sort by the description lookup value
/// instead, falling back to the filename when a set has no description.
/// The folder-grouping collapse, when enabled, is applied before the
/// final sort.
pub fn sort_entries(
    entries: &mut Vec<CatalogEntry>,
    platform: &PlatformDefinition,
    descriptions: &HashMap<String, String>,
) {
    if platform.is_arcade && platform.group_by_folder {
        *entries = collapse_folder_groups(std::mem::take(entries), &platform.root_folders);
    }

    if platform.is_arcade && platform.sort_by_description {
        entries.sort_by_key(|entry| {
            descriptions
                .get(entry.stem())
                .map(|desc| desc.to_lowercase())
                .unwrap_or_else(|| entry.file_name.to_lowercase())
        });
    } else {
        entries.sort_by_key(|entry| entry.file_name.to_lowercase());
    }
}

/// Collapses entries that live below the configured roots: one
/// representative (the first seen) per distinct subdirectory. Entries
/// directly inside a root folder stay individually listed.
fn collapse_folder_groups(entries: Vec<CatalogEntry>, roots: &[PathBuf]) -> Vec<CatalogEntry> {
    let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.path.parent() {
            Some(parent) if !roots.iter().any(|root| root.as_path() == parent) => {
                if seen_dirs.insert(parent.to_path_buf()) {
                    kept.push(entry);
                }
            }
            _ => kept.push(entry),
        }
    }
    kept
}
