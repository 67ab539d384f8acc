//! Shared engine state: the per-platform catalog and the active result
//! set, behind a single mutex.

use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::error::{CatalogError, Result};
use crate::models::{CatalogEntry, RetrievalMode};

#[derive(Debug, Default)]
struct CacheState {
    platform_id: Option<String>,
    catalog: Vec<CatalogEntry>,
    /// Transient list produced by a non-default mode. Coexists with the
    /// catalog so a later resort can reorder whichever is active.
    result_set: Option<Vec<CatalogEntry>>,
    active_mode: RetrievalMode,
    page_count: usize,
}

/// Last-known file list for the currently selected platform.
///
/// All reads and writes of the catalog and the active result set go
/// through one mutex. A separate scan lane serializes miss-populate
/// sequences so two racing callers cannot both scan the same platform;
/// the filesystem scan itself never runs under the state mutex.
#[derive(Debug, Default)]
pub struct CatalogCache {
    state: Mutex<CacheState>,
    scan_lane: Mutex<()>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list if present and current. A different platform id than
    /// what is cached is a miss, not an error.
    pub fn cached(&self, platform_id: &str) -> Option<Vec<CatalogEntry>> {
        let state = self.state.lock();
        if state.platform_id.as_deref() == Some(platform_id) {
            Some(state.catalog.clone())
        } else {
            None
        }
    }

    /// Returns the cached catalog for the platform, scanning and
    /// populating on a miss.
    ///
    /// The commit is skipped if the token was canceled while the scan
    /// ran; a canceled operation must never write into shared state.
    pub fn get_or_scan(
        &self,
        platform_id: &str,
        cancel: &CancelToken,
        scan: impl FnOnce() -> Result<Vec<CatalogEntry>>,
    ) -> Result<Vec<CatalogEntry>> {
        if let Some(files) = self.cached(platform_id) {
            return Ok(files);
        }

        // One miss-populate sequence at a time. A racing caller waits
        // here and finds the catalog populated on re-check.
        let _lane = self.scan_lane.lock();
        if let Some(files) = self.cached(platform_id) {
            return Ok(files);
        }

        let files = scan()?;

        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        let mut state = self.state.lock();
        if state.platform_id.as_deref() != Some(platform_id) {
            // Platform switch: whatever result set was active is stale.
            state.result_set = None;
            state.active_mode = RetrievalMode::Default;
            state.page_count = 0;
        }
        state.platform_id = Some(platform_id.to_string());
        state.catalog = files.clone();
        Ok(files)
    }

    /// Makes the full catalog the active view again (a default-mode
    /// load), dropping any transient result set.
    pub fn activate_catalog(&self, cancel: &CancelToken) -> Result<()> {
        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        let mut state = self.state.lock();
        state.result_set = None;
        state.active_mode = RetrievalMode::Default;
        Ok(())
    }

    /// Installs a transient result set as the active view.
    pub fn commit_result_set(
        &self,
        mode: RetrievalMode,
        files: Vec<CatalogEntry>,
        cancel: &CancelToken,
    ) -> Result<()> {
        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        let mut state = self.state.lock();
        state.result_set = Some(files);
        state.active_mode = mode;
        Ok(())
    }

    /// Whichever ordered list is currently active: the transient result
    /// set if one exists, otherwise the catalog.
    pub fn active_list(&self) -> Vec<CatalogEntry> {
        let state = self.state.lock();
        match &state.result_set {
            Some(files) => files.clone(),
            None => state.catalog.clone(),
        }
    }

    /// Reorders the active list in place without rescanning or
    /// re-filtering, and returns the reordered copy.
    pub fn resort_active(
        &self,
        cancel: &CancelToken,
        sort: impl FnOnce(&mut Vec<CatalogEntry>),
    ) -> Result<Vec<CatalogEntry>> {
        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match &mut state.result_set {
            Some(files) => {
                sort(files);
                Ok(files.clone())
            }
            None => {
                sort(&mut state.catalog);
                Ok(state.catalog.clone())
            }
        }
    }

    pub fn set_page_count(&self, page_count: usize, cancel: &CancelToken) -> Result<()> {
        if cancel.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        self.state.lock().page_count = page_count;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.state.lock().page_count
    }

    pub fn active_mode(&self) -> RetrievalMode {
        self.state.lock().active_mode.clone()
    }

    /// No platform selected: drop everything.
    pub fn clear(&self) {
        *self.state.lock() = CacheState::default();
    }
}
