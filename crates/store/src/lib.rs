//! Durable state for the creative dashboard: the creative catalog, publish
//! history, per-creative upload status and the ad-network credential, plus
//! the catalog/history views built on top of them.

pub mod backend;
pub mod catalog;
pub mod history;
pub mod ingest;
pub mod seed;
pub mod store;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use catalog::{CreativeFilter, StepOneFilter};
pub use history::{export_csv, HistoryFilter, HistoryStats};
pub use ingest::{IngestFile, IngestReport};
pub use store::{CreativeUpdate, DataStore};
