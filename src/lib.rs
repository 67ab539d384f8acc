//! Game catalog & retrieval engine for an emulator frontend.
//!
//! Scans configured folders for playable files, keeps a per-platform
//! in-memory catalog, and serves filtered, sorted, paginated views as
//! batched UI-ready items through a caller-supplied sink. The engine
//! renders no UI, launches no processes and persists nothing; platform
//! definitions, favorites, descriptions and achievement titles arrive
//! as read-only snapshots from the surrounding application.

pub mod cache;
pub mod cancel;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod match_utils;
pub mod models;
pub mod paginate;
pub mod scan_utils;
pub mod sort_utils;

pub use cancel::{CancelSlot, CancelSource, CancelToken};
pub use delivery::{ItemSink, DELIVERY_BATCH_SIZE};
pub use engine::CatalogEngine;
pub use error::{CatalogError, Result};
pub use match_utils::{
    default_similarity, SimilarityFn, DEFAULT_SIMILARITY_THRESHOLD, NON_ALPHA_BUCKET,
};
pub use models::{
    AchievementTitle, CatalogEntry, ExternalData, FavoriteRecord, GameListItem, LoadRequest,
    LoadSummary, PageInfo, PageSize, PlatformDefinition, RetrievalMode,
};
