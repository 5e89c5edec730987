//! Ad-network client trait.

use creative_core::AdObject;
use serde::{Deserialize, Serialize};

use crate::error::{AdNetworkError, Result};

/// Copy attached to an ad creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopy {
    pub name: String,
    pub message: String,
    pub link: String,
    pub call_to_action: String,
}

/// Campaign and ad set created by the one-time sandbox setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxSeed {
    pub campaign_id: String,
    pub ad_set_id: String,
}

/// Operations against an ad network on behalf of one access token.
///
/// Every method fails with [`AdNetworkError::Auth`] when the token is empty
/// after trimming. Reads never fail otherwise: they fall back to a fixed
/// dataset. Writes propagate failures.
#[async_trait::async_trait]
pub trait AdNetworkClient: Send + Sync {
    async fn fetch_campaigns(&self, token: &str) -> Result<Vec<AdObject>>;

    async fn fetch_ad_sets(&self, token: &str) -> Result<Vec<AdObject>>;

    /// Upload an image and return its network hash. `image_ref` is a local
    /// path.
    async fn upload_image(&self, image_ref: &str, token: &str) -> Result<String>;

    async fn create_ad_creative(&self, image_hash: &str, copy: &AdCopy, token: &str)
        -> Result<String>;

    /// Create one paused ad per creative in `ad_set_id`; returns the ad ids
    /// in input order.
    async fn deploy_ads_batch(
        &self,
        creative_ids: &[String],
        ad_set_id: &str,
        token: &str,
    ) -> Result<Vec<String>>;

    async fn seed_sandbox(&self, token: &str) -> Result<SandboxSeed>;
}

/// Trimmed token, or an auth error when nothing is left.
pub fn require_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AdNetworkError::Auth("Access token is required".into()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_are_rejected() {
        assert!(matches!(require_token(""), Err(AdNetworkError::Auth(_))));
        assert!(matches!(require_token("  \n"), Err(AdNetworkError::Auth(_))));
        assert_eq!(require_token(" EAAB_TEST ").unwrap(), "EAAB_TEST");
    }
}
