use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A configured gaming system: where its files live, which extensions
/// count as playable, and how its list should be presented.
///
/// Read-only input owned by the configuration layer; the engine never
/// writes platform definitions back anywhere.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformDefinition {
    pub id: String,
    pub name: String,
    /// Ordered; on filename collisions the earliest folder wins.
    pub root_folders: Vec<PathBuf>,
    /// Case-insensitive, with or without a leading dot.
    pub extensions: Vec<String>,
    /// Arcade/MAME platforms have opaque filenames resolved to human
    /// descriptions through an external lookup table.
    pub is_arcade: bool,
    pub group_by_folder: bool,
    pub sort_by_description: bool,
}

/// One playable file in a platform's catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub path: PathBuf,
    pub file_name: String,
}

impl CatalogEntry {
    pub fn new(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, file_name }
    }

    /// Filename without its extension; the key used for description and
    /// artwork lookups.
    pub fn stem(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(idx) if idx > 0 => &self.file_name[..idx],
            _ => &self.file_name,
        }
    }

    /// Case-insensitive deduplication key.
    pub fn dedup_key(&self) -> String {
        self.file_name.to_lowercase()
    }
}

/// Retrieval strategy for one load request. Closed set; every consumer
/// matches exhaustively.
#[derive(Clone, Debug, PartialEq)]
pub enum RetrievalMode {
    /// Cached catalog, scanning on a miss.
    Default,
    /// Filenames starting with the given letter. Non-alphabetic first
    /// characters bucket under [`NON_ALPHA_BUCKET`](crate::match_utils::NON_ALPHA_BUCKET).
    LetterFilter(char),
    /// Filename contains the query; on arcade platforms the description
    /// lookup value is searched too.
    TextSearch(String),
    /// Externally supplied favorites resolved against the platform roots.
    Favorites,
    /// One uniformly random entry from the default result.
    Random,
    /// Filenames matching an achievement title, literally or by
    /// similarity score at or above the given threshold.
    AchievementsEligible(f64),
    /// Reorder whichever set is currently active without rescanning.
    ResortExisting,
}

impl RetrievalMode {
    pub fn name(&self) -> &'static str {
        match self {
            RetrievalMode::Default => "default",
            RetrievalMode::LetterFilter(_) => "letter filter",
            RetrievalMode::TextSearch(_) => "text search",
            RetrievalMode::Favorites => "favorites",
            RetrievalMode::Random => "random",
            RetrievalMode::AchievementsEligible(_) => "achievements",
            RetrievalMode::ResortExisting => "resort",
        }
    }
}

impl Default for RetrievalMode {
    fn default() -> Self {
        RetrievalMode::Default
    }
}

/// Page sizes the UI offers. Closed set so pagination controls can
/// enumerate them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    TwentyFive,
    Fifty,
    OneHundred,
    TwoFifty,
    FiveHundred,
}

impl PageSize {
    pub fn all() -> Vec<PageSize> {
        vec![
            PageSize::TwentyFive,
            PageSize::Fifty,
            PageSize::OneHundred,
            PageSize::TwoFifty,
            PageSize::FiveHundred,
        ]
    }

    pub fn as_usize(&self) -> usize {
        match self {
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::OneHundred => 100,
            PageSize::TwoFifty => 250,
            PageSize::FiveHundred => 500,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::OneHundred
    }
}

/// Position of the delivered page within the full result list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_count: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// UI-ready row built during batch delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct GameListItem {
    pub path: PathBuf,
    pub file_name: String,
    /// Description-lookup value, falling back to the file stem.
    pub display_title: String,
    pub is_favorite: bool,
    pub has_cover_art: bool,
}

/// One favorite as recorded by the favorites store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub file_name: String,
    pub platform_id: String,
}

/// One known achievement set title.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AchievementTitle {
    pub title: String,
    pub console_id: u32,
}

/// Read-only snapshots of the external collaborators, captured per load
/// call. The engine never mutates any of this.
#[derive(Clone, Debug, Default)]
pub struct ExternalData {
    pub favorites: Vec<FavoriteRecord>,
    /// Filename stem to human description (the MAME titles table).
    pub descriptions: HashMap<String, String>,
    pub achievement_titles: Vec<AchievementTitle>,
    /// Folders probed for cover art when building list items.
    pub asset_dirs: Vec<PathBuf>,
}

/// One end-to-end catalog retrieval request.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    pub platform: PlatformDefinition,
    pub mode: RetrievalMode,
    pub page_size: PageSize,
    /// Signed so callers can pass out-of-range values; clamped into the
    /// valid page range.
    pub page_index: i64,
}

impl LoadRequest {
    pub fn new(platform: PlatformDefinition, mode: RetrievalMode) -> Self {
        Self {
            platform,
            mode,
            page_size: PageSize::default(),
            page_index: 0,
        }
    }
}

/// What a completed load produced.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadSummary {
    /// Entries in the full result list, before pagination.
    pub total_entries: usize,
    pub page: PageInfo,
    /// Items actually pushed into the sink.
    pub delivered: usize,
    /// Favorites that no longer resolve to a file on disk. Removal is
    /// the caller's decision; the engine only reports the count.
    pub stale_favorites: usize,
}
