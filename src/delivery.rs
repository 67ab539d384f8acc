//! Batched conversion of catalog entries into UI-ready items.

use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::{CatalogError, Result};
use crate::models::{CatalogEntry, ExternalData, GameListItem, PageInfo, PlatformDefinition};

/// Items pushed to the sink per flush, bounding per-flush UI-thread cost
/// on large catalogs.
pub const DELIVERY_BATCH_SIZE: usize = 100;

/// Image formats probed when checking for cover art.
const ART_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// UI-bound consumer of delivered batches. The presentation layer owns
/// marshaling these calls onto its rendering thread.
pub trait ItemSink: Send + Sync {
    /// One ordered batch of items. Within a load, batches arrive in the
    /// order they were produced.
    fn push_batch(&self, items: Vec<GameListItem>);
    /// Final pagination metadata once every batch has been flushed.
    fn finish(&self, page: PageInfo);
    /// Drop everything shown so far; the load was superseded and the UI
    /// must not keep partial or stale content.
    fn clear(&self);
}

/// Converts the page's entries into items and flushes them in bounded
/// batches. Cancellation is polled before each flush; on cancellation
/// the built-but-unflushed batch is discarded and the sink is cleared.
///
/// Returns the number of items delivered.
pub fn deliver_page(
    entries: &[CatalogEntry],
    platform: &PlatformDefinition,
    data: &ExternalData,
    page: PageInfo,
    cancel: &CancelToken,
    sink: &dyn ItemSink,
) -> Result<usize> {
    let favorite_names: Vec<String> = data
        .favorites
        .iter()
        .filter(|fav| fav.platform_id == platform.id)
        .map(|fav| fav.file_name.to_lowercase())
        .collect();

    let mut delivered = 0;
    for chunk in entries.chunks(DELIVERY_BATCH_SIZE) {
        if cancel.is_canceled() {
            sink.clear();
            return Err(CatalogError::Canceled);
        }
        let items: Vec<GameListItem> = chunk
            .iter()
            .map(|entry| build_item(entry, data, &favorite_names))
            .collect();
        delivered += items.len();
        sink.push_batch(items);
    }

    if cancel.is_canceled() {
        sink.clear();
        return Err(CatalogError::Canceled);
    }
    sink.finish(page);
    Ok(delivered)
}

fn build_item(
    entry: &CatalogEntry,
    data: &ExternalData,
    favorite_names: &[String],
) -> GameListItem {
    let stem = entry.stem();
    let display_title = data
        .descriptions
        .get(stem)
        .cloned()
        .unwrap_or_else(|| stem.to_string());
    let key = entry.dedup_key();

    GameListItem {
        path: entry.path.clone(),
        file_name: entry.file_name.clone(),
        display_title,
        is_favorite: favorite_names.iter().any(|name| *name == key),
        has_cover_art: cover_art_exists(stem, &data.asset_dirs),
    }
}

/// Probes each asset folder for `<stem>.<ext>` across the known image
/// formats. Presence only; decoding is the presentation layer's job.
fn cover_art_exists(stem: &str, asset_dirs: &[PathBuf]) -> bool {
    for dir in asset_dirs {
        for ext in &ART_EXTENSIONS {
            if dir.join(format!("{stem}.{ext}")).exists() {
                return true;
            }
        }
    }
    false
}
