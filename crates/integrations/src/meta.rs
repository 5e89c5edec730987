//! Meta Marketing (Graph) API client.
//!
//! Reads go to the Graph API unless the token is a mock token, and fall back
//! to a fixed sandbox dataset on any failure. Writes are simulated unless
//! `live_writes` is enabled in [`MetaConfig`].

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use creative_core::config::MetaConfig;
use creative_core::{AdObject, CreativeError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::client::{require_token, AdCopy, AdNetworkClient, SandboxSeed};
use crate::error::{AdNetworkError, Result};

/// Above this many ads, deployment goes through the Graph batch endpoint.
pub const BATCH_THRESHOLD: usize = 5;

const AD_STATUS: &str = "PAUSED";

pub fn mock_campaigns() -> Vec<AdObject> {
    vec![AdObject::new("6923708839550", "Test Sandbox Campaign")]
}

pub fn mock_ad_sets() -> Vec<AdObject> {
    vec![AdObject::new("6923710021950", "MVP Test Ad Set")]
}

fn sandbox_seed() -> SandboxSeed {
    SandboxSeed {
        campaign_id: "6000000000001".into(),
        ad_set_id: "6000000000002".into(),
    }
}

fn random_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{prefix}{}", suffix.to_lowercase())
}

// ─── Graph response shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Option<Vec<AdObject>>,
    #[serde(default)]
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: std::collections::HashMap<String, ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    code: u16,
    #[serde(default)]
    body: Option<String>,
}

// ─── Client ─────────────────────────────────────────────────────────────────

pub struct MetaAdsClient {
    config: MetaConfig,
    http: Client,
}

impl MetaAdsClient {
    pub fn new(config: MetaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &MetaConfig {
        &self.config
    }

    fn is_mock_token(&self, token: &str) -> bool {
        !self.config.mock_token_prefix.is_empty() && token.starts_with(&self.config.mock_token_prefix)
    }

    fn account_url(&self, edge: &str) -> String {
        format!("{}/{}/{}", self.config.graph_url(), self.config.ad_account_id, edge)
    }

    async fn simulate_latency(&self) {
        if self.config.simulated_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.simulated_latency_ms)).await;
        }
    }

    async fn list_edge(&self, edge: &str, token: &str) -> Result<Vec<AdObject>> {
        let url = self.account_url(edge);
        debug!(url = %url, "Meta API list request");
        let response = self
            .http
            .get(&url)
            .query(&[("fields", "name,id"), ("access_token", token)])
            .send()
            .await?;
        let status = response.status();
        let body: ListResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(AdNetworkError::Api {
                status: status.as_u16(),
                message: error.message,
            });
        }
        if !status.is_success() {
            return Err(AdNetworkError::Api {
                status: status.as_u16(),
                message: "request failed".into(),
            });
        }
        Ok(body.data.unwrap_or_default())
    }

    /// Read with mock-token short-circuit and fallback on any failure.
    async fn read_with_fallback(
        &self,
        edge: &str,
        token: &str,
        fallback: fn() -> Vec<AdObject>,
    ) -> Result<Vec<AdObject>> {
        let token = require_token(token)?;
        if self.is_mock_token(token) {
            info!(edge, "Mock token detected, returning sandbox data");
            self.simulate_latency().await;
            return Ok(fallback());
        }
        match self.list_edge(edge, token).await {
            Ok(objects) if !objects.is_empty() => Ok(objects),
            Ok(_) => {
                info!(edge, "No objects found, using sandbox data");
                Ok(fallback())
            }
            Err(e) => {
                let fallback_err = CreativeError::NetworkFallback(e.to_string());
                warn!(edge, "{fallback_err}");
                Ok(fallback())
            }
        }
    }

    async fn post_form<T: DeserializeOwned>(&self, url: &str, form: &[(&str, String)]) -> Result<T> {
        debug!(url, "Meta API write request");
        let response = self.http.post(url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdNetworkError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn create_ads_individually(
        &self,
        creative_ids: &[String],
        ad_set_id: &str,
        token: &str,
    ) -> Result<Vec<String>> {
        let url = self.account_url("ads");
        let mut ad_ids = Vec::with_capacity(creative_ids.len());
        for creative_id in creative_ids {
            let form = [
                ("name", format!("Ad_{creative_id}")),
                ("creative", json!({ "creative_id": creative_id }).to_string()),
                ("adset_id", ad_set_id.to_string()),
                ("status", AD_STATUS.to_string()),
                ("access_token", token.to_string()),
            ];
            let created: IdResponse = self.post_form(&url, &form).await?;
            ad_ids.push(created.id);
        }
        Ok(ad_ids)
    }

    async fn create_ads_batched(
        &self,
        creative_ids: &[String],
        ad_set_id: &str,
        token: &str,
    ) -> Result<Vec<String>> {
        let relative_url = format!("{}/ads", self.config.ad_account_id);
        let batch: Vec<serde_json::Value> = creative_ids
            .iter()
            .map(|creative_id| {
                json!({
                    "method": "POST",
                    "relative_url": relative_url,
                    "body": format!(
                        "name=Ad_{creative_id}&creative={}&adset_id={ad_set_id}&status={AD_STATUS}",
                        json!({ "creative_id": creative_id })
                    ),
                })
            })
            .collect();
        let form = [
            ("batch", serde_json::to_string(&batch)?),
            ("access_token", token.to_string()),
        ];
        let items: Vec<BatchItem> = self.post_form(&self.config.graph_url(), &form).await?;

        items
            .into_iter()
            .map(|item| {
                let body = item.body.unwrap_or_default();
                if item.code >= 400 {
                    return Err(AdNetworkError::Api {
                        status: item.code,
                        message: body,
                    });
                }
                let created: IdResponse = serde_json::from_str(&body)?;
                Ok(created.id)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AdNetworkClient for MetaAdsClient {
    async fn fetch_campaigns(&self, token: &str) -> Result<Vec<AdObject>> {
        self.read_with_fallback("campaigns", token, mock_campaigns).await
    }

    async fn fetch_ad_sets(&self, token: &str) -> Result<Vec<AdObject>> {
        self.read_with_fallback("adsets", token, mock_ad_sets).await
    }

    async fn upload_image(&self, image_ref: &str, token: &str) -> Result<String> {
        let token = require_token(token)?;
        info!(account = %self.config.ad_account_id, image = image_ref, "Syncing image");
        if !self.config.live_writes {
            self.simulate_latency().await;
            let hash = random_id("h");
            info!(hash = %hash, "Image sync simulated");
            return Ok(hash);
        }

        let bytes = tokio::fs::read(Path::new(image_ref)).await?;
        let form = [
            ("bytes", BASE64.encode(bytes)),
            ("access_token", token.to_string()),
        ];
        let uploaded: ImagesResponse = self.post_form(&self.account_url("adimages"), &form).await?;
        let hash = uploaded
            .images
            .into_values()
            .next()
            .map(|entry| entry.hash)
            .ok_or_else(|| AdNetworkError::UnexpectedResponse("no image hash returned".into()))?;
        info!(hash = %hash, "Image synced");
        Ok(hash)
    }

    async fn create_ad_creative(&self, image_hash: &str, copy: &AdCopy, token: &str) -> Result<String> {
        let token = require_token(token)?;
        info!(name = %copy.name, "Creating ad creative");
        if !self.config.live_writes {
            self.simulate_latency().await;
            return Ok(random_id("cr_"));
        }

        let call_to_action = if copy.call_to_action.is_empty() {
            self.config.call_to_action.clone()
        } else {
            copy.call_to_action.clone()
        };
        let story = json!({
            "page_id": self.config.page_id,
            "link_data": {
                "image_hash": image_hash,
                "message": copy.message,
                "link": copy.link,
                "call_to_action": { "type": call_to_action },
            }
        });
        let form = [
            ("name", copy.name.clone()),
            ("object_story_spec", story.to_string()),
            ("access_token", token.to_string()),
        ];
        let created: IdResponse = self.post_form(&self.account_url("adcreatives"), &form).await?;
        Ok(created.id)
    }

    async fn deploy_ads_batch(
        &self,
        creative_ids: &[String],
        ad_set_id: &str,
        token: &str,
    ) -> Result<Vec<String>> {
        let token = require_token(token)?;
        let batched = creative_ids.len() > BATCH_THRESHOLD;
        info!(count = creative_ids.len(), ad_set_id, batched, "Deploying ads");
        if !self.config.live_writes {
            self.simulate_latency().await;
            return Ok(creative_ids.iter().map(|_| random_id("ad_")).collect());
        }
        if batched {
            self.create_ads_batched(creative_ids, ad_set_id, token).await
        } else {
            self.create_ads_individually(creative_ids, ad_set_id, token).await
        }
    }

    async fn seed_sandbox(&self, token: &str) -> Result<SandboxSeed> {
        let token = require_token(token)?;
        info!(account = %self.config.ad_account_id, "Seeding sandbox campaign and ad set");
        if !self.config.live_writes {
            self.simulate_latency().await;
            return Ok(sandbox_seed());
        }

        let campaign: IdResponse = self
            .post_form(
                &self.account_url("campaigns"),
                &[
                    ("name", "Sandbox Seed Campaign".to_string()),
                    ("objective", "OUTCOME_TRAFFIC".to_string()),
                    ("status", AD_STATUS.to_string()),
                    ("special_ad_categories", "[]".to_string()),
                    ("access_token", token.to_string()),
                ],
            )
            .await?;
        let ad_set: IdResponse = self
            .post_form(
                &self.account_url("adsets"),
                &[
                    ("name", "Sandbox Seed Ad Set".to_string()),
                    ("campaign_id", campaign.id.clone()),
                    ("daily_budget", "1000".to_string()),
                    ("billing_event", "IMPRESSIONS".to_string()),
                    ("optimization_goal", "LINK_CLICKS".to_string()),
                    ("bid_amount", "100".to_string()),
                    (
                        "targeting",
                        json!({ "geo_locations": { "countries": ["US"] } }).to_string(),
                    ),
                    ("status", AD_STATUS.to_string()),
                    ("access_token", token.to_string()),
                ],
            )
            .await?;
        Ok(SandboxSeed {
            campaign_id: campaign.id,
            ad_set_id: ad_set.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(base_url: &str) -> MetaConfig {
        MetaConfig {
            api_base_url: base_url.to_string(),
            simulated_latency_ms: 0,
            request_timeout_ms: 2_000,
            ..MetaConfig::default()
        }
    }

    /// Serve `body` with `status` to every connection on a local port.
    async fn serve(status: u16, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        request.extend_from_slice(&buf[..n]);
                        let text = String::from_utf8_lossy(&request);
                        if let Some(end) = text.find("\r\n\r\n") {
                            let content_length = text[..end]
                                .lines()
                                .find_map(|l| {
                                    let (name, value) = l.split_once(':')?;
                                    name.eq_ignore_ascii_case("content-length")
                                        .then(|| value.trim().parse::<usize>().ok())
                                        .flatten()
                                })
                                .unwrap_or(0);
                            if request.len() >= end + 4 + content_length {
                                break;
                            }
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn empty_token_is_an_auth_error() {
        let client = MetaAdsClient::new(config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(client.fetch_campaigns("  ").await, Err(AdNetworkError::Auth(_))));
        assert!(matches!(client.fetch_ad_sets("").await, Err(AdNetworkError::Auth(_))));
        assert!(matches!(client.upload_image("a.png", "").await, Err(AdNetworkError::Auth(_))));
        assert!(matches!(client.seed_sandbox("").await, Err(AdNetworkError::Auth(_))));
        assert!(matches!(
            client.deploy_ads_batch(&["cr_1".into()], "as1", " ").await,
            Err(AdNetworkError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn mock_token_returns_sandbox_data() {
        let client = MetaAdsClient::new(config("http://127.0.0.1:9")).unwrap();
        assert_eq!(client.fetch_campaigns(" EAAB_TEST_123 ").await.unwrap(), mock_campaigns());
        assert_eq!(client.fetch_ad_sets("EAAB_TEST").await.unwrap(), mock_ad_sets());
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back_to_mocks() {
        let client = MetaAdsClient::new(config("http://127.0.0.1:9")).unwrap();
        let campaigns = client.fetch_campaigns("EAAG_real").await.unwrap();
        assert_eq!(campaigns, mock_campaigns());
    }

    #[tokio::test]
    async fn live_listing_is_returned() {
        let base = serve(200, r#"{"data":[{"id":"42","name":"Live Campaign"}]}"#).await;
        let client = MetaAdsClient::new(config(&base)).unwrap();
        let campaigns = client.fetch_campaigns("EAAG_real").await.unwrap();
        assert_eq!(campaigns, vec![AdObject::new("42", "Live Campaign")]);
    }

    #[tokio::test]
    async fn api_error_and_empty_listing_fall_back() {
        let base = serve(400, r#"{"error":{"message":"Invalid OAuth access token"}}"#).await;
        let client = MetaAdsClient::new(config(&base)).unwrap();
        assert_eq!(client.fetch_ad_sets("EAAG_bad").await.unwrap(), mock_ad_sets());

        let base = serve(200, r#"{"data":[]}"#).await;
        let client = MetaAdsClient::new(config(&base)).unwrap();
        assert_eq!(client.fetch_campaigns("EAAG_real").await.unwrap(), mock_campaigns());
    }

    #[tokio::test]
    async fn simulated_writes_generate_ids() {
        let client = MetaAdsClient::new(config("http://127.0.0.1:9")).unwrap();
        let hash = client.upload_image("hero.png", "tok").await.unwrap();
        assert!(hash.starts_with('h'));

        let copy = AdCopy {
            name: "Ad".into(),
            message: "Play now".into(),
            link: "https://example.com".into(),
            call_to_action: String::new(),
        };
        assert!(client.create_ad_creative(&hash, &copy, "tok").await.unwrap().starts_with("cr_"));

        let creatives: Vec<String> = (0..7).map(|i| format!("cr_{i}")).collect();
        let ads = client.deploy_ads_batch(&creatives, "as1", "tok").await.unwrap();
        assert_eq!(ads.len(), 7);
        assert!(ads.iter().all(|id| id.starts_with("ad_")));

        assert_eq!(client.seed_sandbox("tok").await.unwrap(), sandbox_seed());
    }

    #[tokio::test]
    async fn live_creative_creation_returns_network_id() {
        let base = serve(200, r#"{"id":"120200000000001"}"#).await;
        let client = MetaAdsClient::new(MetaConfig {
            live_writes: true,
            ..config(&base)
        })
        .unwrap();
        let copy = AdCopy {
            name: "Ad".into(),
            message: "Play now".into(),
            link: "https://example.com".into(),
            call_to_action: "INSTALL_MOBILE_APP".into(),
        };
        let id = client.create_ad_creative("h123", &copy, "tok").await.unwrap();
        assert_eq!(id, "120200000000001");
    }

    #[tokio::test]
    async fn live_batch_deploy_reports_item_errors() {
        let base = serve(
            200,
            r#"[{"code":200,"body":"{\"id\":\"1\"}"},{"code":400,"body":"{\"error\":{\"message\":\"bad\"}}"}]"#,
        )
        .await;
        let client = MetaAdsClient::new(MetaConfig {
            live_writes: true,
            ..config(&base)
        })
        .unwrap();
        let creatives: Vec<String> = (0..6).map(|i| format!("cr_{i}")).collect();
        let err = client.deploy_ads_batch(&creatives, "as1", "tok").await.unwrap_err();
        assert!(matches!(err, AdNetworkError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn live_image_upload_reads_local_file() {
        let base = serve(200, r#"{"images":{"hero.png":{"hash":"abc123"}}}"#).await;
        let client = MetaAdsClient::new(MetaConfig {
            live_writes: true,
            ..config(&base)
        })
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.png");
        std::fs::write(&path, [0u8, 1, 2, 3]).unwrap();
        let hash = client
            .upload_image(path.to_str().unwrap(), "tok")
            .await
            .unwrap();
        assert_eq!(hash, "abc123");

        let missing = client.upload_image("/nonexistent/file.png", "tok").await;
        assert!(matches!(missing, Err(AdNetworkError::Io(_))));
    }
}
