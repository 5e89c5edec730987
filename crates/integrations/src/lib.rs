//! Ad-network clients: listing campaigns and ad sets, uploading creatives
//! and deploying ads.

pub mod client;
pub mod error;
pub mod meta;

pub use client::{AdCopy, AdNetworkClient, SandboxSeed};
pub use error::{AdNetworkError, Result};
pub use meta::{mock_ad_sets, mock_campaigns, MetaAdsClient};
