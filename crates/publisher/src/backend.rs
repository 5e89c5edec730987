//! Network work performed while a publish job is in progress.

use std::sync::Arc;

use chrono::NaiveDate;
use creative_core::config::MetaConfig;
use creative_core::{CreativeError, CreativeId, CreativeResult, Platform};
use creative_integrations::{AdCopy, AdNetworkClient};
use creative_store::{CreativeUpdate, DataStore};
use creative_wizard::{render_ad_name, EntryMode, PlatformSetupData};
use tracing::info;

/// Everything a backend needs to publish one platform's share of a batch.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub platform: Platform,
    pub game_id: String,
    pub creative_ids: Vec<CreativeId>,
    pub setup: Option<PlatformSetupData>,
    pub campaign_label: String,
    pub date: NaiveDate,
}

/// Performs the real work of a job. An error marks the job failed with the
/// error's message.
#[async_trait::async_trait]
pub trait PublishBackend: Send + Sync {
    /// Returns the ids the network assigned to the created ads.
    async fn publish(&self, job: &JobContext) -> CreativeResult<Vec<String>>;
}

/// Uploads images, creates ad creatives and deploys them into the chosen
/// ad set through an [`AdNetworkClient`].
pub struct MetaPublishBackend {
    client: Arc<dyn AdNetworkClient>,
    store: Arc<DataStore>,
    config: MetaConfig,
}

impl MetaPublishBackend {
    pub fn new(client: Arc<dyn AdNetworkClient>, store: Arc<DataStore>, config: MetaConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    async fn resolve_ad_set(&self, setup: &PlatformSetupData, token: &str) -> CreativeResult<String> {
        match (setup.ad_set_mode, setup.ad_set_id.as_deref()) {
            (EntryMode::Existing, Some(id)) if !id.is_empty() => Ok(id.to_string()),
            _ => {
                let seed = self.client.seed_sandbox(token).await?;
                info!(ad_set_id = %seed.ad_set_id, "Using sandbox ad set for new ad set");
                Ok(seed.ad_set_id)
            }
        }
    }

    /// Stored image hash, uploading the creative first when there is none.
    async fn image_hash(
        &self,
        creative_id: &CreativeId,
        thumb: &str,
        stored: Option<String>,
        token: &str,
    ) -> CreativeResult<String> {
        if let Some(hash) = stored {
            return Ok(hash);
        }
        let hash = self.client.upload_image(thumb, token).await?;
        self.store.update_creative(
            creative_id,
            CreativeUpdate {
                meta_image_hash: Some(hash.clone()),
                ..Default::default()
            },
        )?;
        Ok(hash)
    }
}

#[async_trait::async_trait]
impl PublishBackend for MetaPublishBackend {
    async fn publish(&self, job: &JobContext) -> CreativeResult<Vec<String>> {
        let token = self
            .store
            .meta_token()
            .ok_or_else(|| CreativeError::Auth("Meta account is not connected".into()))?;
        let setup = job.setup.clone().unwrap_or_default();
        let ad_set_id = self.resolve_ad_set(&setup, &token).await?;

        let mut network_creatives = Vec::with_capacity(job.creative_ids.len());
        for creative_id in &job.creative_ids {
            let creative = self
                .store
                .creative(creative_id)
                .ok_or_else(|| CreativeError::Validation(format!("Unknown creative {creative_id}")))?;
            let hash = self
                .image_hash(creative_id, &creative.thumb, creative.meta_image_hash.clone(), &token)
                .await?;
            let copy = AdCopy {
                name: render_ad_name(&setup.naming, &job.campaign_label, job.date, &creative.name),
                message: creative.name.clone(),
                link: self.config.destination_url.clone(),
                call_to_action: self.config.call_to_action.clone(),
            };
            network_creatives.push(self.client.create_ad_creative(&hash, &copy, &token).await?);
        }

        let ad_ids = self
            .client
            .deploy_ads_batch(&network_creatives, &ad_set_id, &token)
            .await?;
        info!(
            game_id = %job.game_id,
            ads = ad_ids.len(),
            ad_set_id = %ad_set_id,
            "Meta ads deployed"
        );
        Ok(ad_ids)
    }
}
