//! The catalog engine: resolves a load request's retrieval mode into an
//! ordered list, pages it, and streams UI-ready batches to the sink.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;

use crate::cache::CatalogCache;
use crate::cancel::{CancelSlot, CancelToken};
use crate::delivery::{deliver_page, ItemSink};
use crate::error::{CatalogError, Result};
use crate::match_utils::{
    filter_by_achievements, filter_by_letter, filter_by_text, default_similarity, SimilarityFn,
};
use crate::models::{
    CatalogEntry, ExternalData, FavoriteRecord, LoadRequest, LoadSummary, PlatformDefinition,
    RetrievalMode,
};
use crate::paginate::paginate;
use crate::scan_utils::collect_platform_files;
use crate::sort_utils::sort_entries;

/// Owns the shared catalog state and serves load requests.
///
/// `load` is a blocking call meant to run on a background worker; the
/// engine is `Send + Sync`, so one instance can be shared across worker
/// threads. Each `load` supersedes the previous one issued through the
/// same engine: the prior operation's token is canceled and it stops at
/// its next poll point without touching shared state or the sink.
pub struct CatalogEngine {
    cache: CatalogCache,
    loads: CancelSlot,
    similarity: SimilarityFn,
}

impl CatalogEngine {
    pub fn new() -> Self {
        Self::with_similarity(default_similarity())
    }

    /// The similarity function scores achievement-title candidates; the
    /// constants are a tuning choice, so the strategy is swappable.
    pub fn with_similarity(similarity: SimilarityFn) -> Self {
        Self {
            cache: CatalogCache::new(),
            loads: CancelSlot::new(),
            similarity,
        }
    }

    /// Page count of the most recently completed load, for pagination
    /// controls.
    pub fn page_count(&self) -> usize {
        self.cache.page_count()
    }

    /// The retrieval mode currently shaping the active list, for filter
    /// status display.
    pub fn active_mode(&self) -> RetrievalMode {
        self.cache.active_mode()
    }

    /// Cancels the in-flight load without starting a new one.
    pub fn cancel_pending(&self) {
        self.loads.cancel_current();
    }

    /// No platform selected: cancel any in-flight load and forget all
    /// cached state.
    pub fn clear_platform(&self) {
        self.loads.cancel_current();
        self.cache.clear();
    }

    /// Runs one load operation, superseding the engine's previous load.
    pub fn load(
        &self,
        request: &LoadRequest,
        data: &ExternalData,
        sink: &dyn ItemSink,
    ) -> Result<LoadSummary> {
        let token = self.loads.begin();
        self.load_with_token(request, data, sink, &token)
    }

    /// Runs one load operation under a caller-owned token. Callers that
    /// manage several independent consumers issue their own tokens and
    /// keep their own supersede policy.
    pub fn load_with_token(
        &self,
        request: &LoadRequest,
        data: &ExternalData,
        sink: &dyn ItemSink,
        cancel: &CancelToken,
    ) -> Result<LoadSummary> {
        match self.run_load(request, data, sink, cancel) {
            Ok(summary) => Ok(summary),
            Err(err) if err.is_canceled() => {
                log::debug!(
                    "load for {} canceled by a newer request",
                    request.platform.id
                );
                sink.clear();
                Err(err)
            }
            // Unexpected failures propagate; the caller owns developer
            // logging and user notification.
            Err(err) => Err(err),
        }
    }

    fn run_load(
        &self,
        request: &LoadRequest,
        data: &ExternalData,
        sink: &dyn ItemSink,
        cancel: &CancelToken,
    ) -> Result<LoadSummary> {
        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        let platform = &request.platform;
        let mut stale_favorites = 0;

        let list: Vec<CatalogEntry> = match &request.mode {
            RetrievalMode::Default => {
                let files = self.default_list(request, data, cancel)?;
                self.cache.activate_catalog(cancel)?;
                files
            }
            RetrievalMode::LetterFilter(letter) => {
                let base = self.default_list(request, data, cancel)?;
                let filtered = filter_by_letter(&base, *letter);
                self.cache
                    .commit_result_set(request.mode.clone(), filtered.clone(), cancel)?;
                filtered
            }
            RetrievalMode::TextSearch(query) => {
                let base = self.default_list(request, data, cancel)?;
                let descriptions = platform.is_arcade.then_some(&data.descriptions);
                let filtered = filter_by_text(&base, query, descriptions);
                self.cache
                    .commit_result_set(request.mode.clone(), filtered.clone(), cancel)?;
                filtered
            }
            RetrievalMode::Favorites => {
                // Favorites resolve through a fresh folder walk, not
                // through the catalog cache.
                let (mut resolved, stale) =
                    resolve_favorites(platform, &data.favorites, cancel)?;
                stale_favorites = stale;
                sort_entries(&mut resolved, platform, &data.descriptions);
                self.cache
                    .commit_result_set(request.mode.clone(), resolved.clone(), cancel)?;
                resolved
            }
            RetrievalMode::Random => {
                let base = self.default_list(request, data, cancel)?;
                let picked = pick_random(&base);
                self.cache
                    .commit_result_set(request.mode.clone(), picked.clone(), cancel)?;
                picked
            }
            RetrievalMode::AchievementsEligible(threshold) => {
                let base = self.default_list(request, data, cancel)?;
                let filtered = filter_by_achievements(
                    &base,
                    &data.achievement_titles,
                    *threshold,
                    &self.similarity,
                );
                self.cache
                    .commit_result_set(request.mode.clone(), filtered.clone(), cancel)?;
                filtered
            }
            RetrievalMode::ResortExisting => self.cache.resort_active(cancel, |files| {
                sort_entries(files, platform, &data.descriptions)
            })?,
        };

        let (page_entries, info) = paginate(&list, request.page_size, request.page_index);
        self.cache.set_page_count(info.page_count, cancel)?;
        let delivered = deliver_page(&page_entries, platform, data, info, cancel, sink)?;

        log::info!(
            "load platform={} mode={} total={} page={}/{} delivered={}",
            platform.id,
            request.mode.name(),
            list.len(),
            info.page_index + 1,
            info.page_count,
            delivered
        );
        Ok(LoadSummary {
            total_entries: list.len(),
            page: info,
            delivered,
            stale_favorites,
        })
    }

    /// The default-mode list: cache hit, or a scan that populates the
    /// cache. The catalog is stored already sorted so every derived
    /// mode inherits its order.
    fn default_list(
        &self,
        request: &LoadRequest,
        data: &ExternalData,
        cancel: &CancelToken,
    ) -> Result<Vec<CatalogEntry>> {
        let platform = &request.platform;
        self.cache.get_or_scan(&platform.id, cancel, || {
            let started = Instant::now();
            let mut files =
                collect_platform_files(&platform.root_folders, &platform.extensions, cancel)?;
            sort_entries(&mut files, platform, &data.descriptions);
            log::info!(
                "scanned {} files for {} in {}ms",
                files.len(),
                platform.name,
                started.elapsed().as_millis()
            );
            Ok(files)
        })
    }
}

impl Default for CatalogEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves this platform's favorites with the same folder walk the
/// scanner uses, so any file the catalog can list is reachable as a
/// favorite, subfolders included. Records that resolve nowhere are
/// counted as stale and skipped; removing them from the store is the
/// caller's decision.
fn resolve_favorites(
    platform: &PlatformDefinition,
    favorites: &[FavoriteRecord],
    cancel: &CancelToken,
) -> Result<(Vec<CatalogEntry>, usize)> {
    let files = collect_platform_files(&platform.root_folders, &platform.extensions, cancel)?;
    let by_name: HashMap<String, CatalogEntry> = files
        .into_iter()
        .map(|entry| (entry.dedup_key(), entry))
        .collect();

    let mut resolved = Vec::new();
    let mut stale = 0;
    for favorite in favorites.iter().filter(|f| f.platform_id == platform.id) {
        match by_name.get(&favorite.file_name.to_lowercase()) {
            Some(entry) => resolved.push(entry.clone()),
            None => {
                stale += 1;
                log::debug!(
                    "favorite {} no longer resolves for {}",
                    favorite.file_name,
                    platform.id
                );
            }
        }
    }
    Ok((resolved, stale))
}

fn pick_random(base: &[CatalogEntry]) -> Vec<CatalogEntry> {
    if base.is_empty() {
        return Vec::new();
    }
    let idx = rand::thread_rng().gen_range(0..base.len());
    vec![base[idx].clone()]
}
