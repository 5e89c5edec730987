//! Publish job fan-out: one asynchronous job per selected platform, each
//! moving `queued → in-progress → success | failed`, recording outcomes in
//! the durable store.

pub mod backend;
pub mod durations;
pub mod job;
pub mod simulator;

pub use backend::{JobContext, MetaPublishBackend, PublishBackend};
pub use durations::{DurationSource, FixedDurations, RandomizedDurations};
pub use job::{JobStatus, PublishJob};
pub use simulator::{JobBatch, PublishRun, PublishSimulator};
