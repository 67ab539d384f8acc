//! Filename matching for the filter, search and achievements modes.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::models::{AchievementTitle, CatalogEntry};

/// Reserved pseudo-letter grouping every filename whose first character
/// is not alphabetic.
pub const NON_ALPHA_BUCKET: char = '#';

/// Default acceptance threshold for similarity scoring. Literal
/// containment is always checked first.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.92;

/// Pluggable similarity strategy for achievements matching. The score
/// is expected in `[0.0, 1.0]`.
pub type SimilarityFn = Arc<dyn Fn(&str, &str) -> f64 + Send + Sync>;

/// The stock strategy: Jaro-Winkler.
pub fn default_similarity() -> SimilarityFn {
    Arc::new(|a, b| strsim::jaro_winkler(a, b))
}

/// Keeps entries whose filename starts with `letter`, case-insensitive.
/// [`NON_ALPHA_BUCKET`] selects everything that starts with a digit or
/// symbol.
pub fn filter_by_letter(entries: &[CatalogEntry], letter: char) -> Vec<CatalogEntry> {
    let wanted = letter.to_ascii_lowercase();
    entries
        .iter()
        .filter(|entry| {
            let first = match entry.file_name.chars().next() {
                Some(c) => c,
                None => return false,
            };
            if wanted == NON_ALPHA_BUCKET {
                !first.is_alphabetic()
            } else {
                first.to_lowercase().eq(wanted.to_lowercase())
            }
        })
        .cloned()
        .collect()
}

/// Keeps entries whose filename contains `query`, case-insensitive. For
/// arcade platforms the description lookup value is searched as well,
/// so `mario` finds a set whose opaque name says nothing but whose
/// description mentions Mario.
pub fn filter_by_text(
    entries: &[CatalogEntry],
    query: &str,
    descriptions: Option<&HashMap<String, String>>,
) -> Vec<CatalogEntry> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return entries.to_vec();
    }
    entries
        .iter()
        .filter(|entry| {
            if entry.file_name.to_lowercase().contains(&needle) {
                return true;
            }
            descriptions
                .and_then(|lookup| lookup.get(entry.stem()))
                .map(|desc| desc.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Keeps entries with at least one accepted achievement title.
///
/// Per entry: literal containment against each title first (the cheap
/// path), then similarity scoring with acceptance at `threshold` or
/// above. Scoring is parallelized since title databases run to tens of
/// thousands of rows.
pub fn filter_by_achievements(
    entries: &[CatalogEntry],
    titles: &[AchievementTitle],
    threshold: f64,
    similarity: &SimilarityFn,
) -> Vec<CatalogEntry> {
    if titles.is_empty() {
        return Vec::new();
    }
    let lowered: Vec<String> = titles.iter().map(|t| t.title.to_lowercase()).collect();

    entries
        .par_iter()
        .filter(|entry| {
            let stem = entry.stem().to_lowercase();
            if lowered
                .iter()
                .any(|title| title.contains(&stem) || stem.contains(title.as_str()))
            {
                return true;
            }
            lowered
                .iter()
                .any(|title| similarity(&stem, title) >= threshold)
        })
        .cloned()
        .collect()
}
