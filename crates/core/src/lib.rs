//! Creative Hub core — shared domain types, configuration, error taxonomy and
//! the platform-compatibility rules used by every other crate.

pub mod compatibility;
pub mod config;
pub mod error;
pub mod types;

pub use compatibility::{compatible_platforms, is_compatible, is_compatible_id};
pub use config::AppConfig;
pub use error::{CreativeError, CreativeResult};
pub use types::{
    AdObject, Creative, CreativeId, Dimension, FileFingerprint, Game, HistoryRecord, HistoryStatus,
    MediaKind, Platform, UploadStatusMap,
};
