use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CREATIVE_HUB__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_game_id")]
    pub default_game_id: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub meta: MetaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per persisted key.
    #[serde(default = "default_store_dir")]
    pub dir: String,
    /// Owner recorded on ingested creatives.
    #[serde(default = "default_ingest_owner")]
    pub ingest_owner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Job `i` starts `(i + 1) * stagger_ms` after the publish action.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,
    /// Upper bound of the random extra processing time.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    #[serde(default = "default_campaign_label")]
    pub campaign_label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaConfig {
    #[serde(default = "default_meta_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_meta_api_version")]
    pub api_version: String,
    #[serde(default = "default_ad_account_id")]
    pub ad_account_id: String,
    #[serde(default = "default_page_id")]
    pub page_id: String,
    /// Tokens starting with this prefix are served from the mock dataset.
    #[serde(default = "default_mock_token_prefix")]
    pub mock_token_prefix: String,
    /// Send write calls to the Graph API instead of the sandbox simulation.
    #[serde(default)]
    pub live_writes: bool,
    /// Route Meta publish jobs through the ad-network client.
    #[serde(default)]
    pub live_publish: bool,
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_destination_url")]
    pub destination_url: String,
    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,
}

// Default functions
fn default_game_id() -> String {
    "g1".to_string()
}
fn default_store_dir() -> String {
    ".creative-hub".to_string()
}
fn default_ingest_owner() -> String {
    "Me".to_string()
}
fn default_stagger_ms() -> u64 {
    800
}
fn default_min_duration_ms() -> u64 {
    2000
}
fn default_jitter_ms() -> u64 {
    2000
}
fn default_campaign_label() -> String {
    "New Campaign".to_string()
}
fn default_meta_base_url() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_meta_api_version() -> String {
    "v18.0".to_string()
}
fn default_ad_account_id() -> String {
    "act_1402861321434339".to_string()
}
fn default_page_id() -> String {
    "904230746110414".to_string()
}
fn default_mock_token_prefix() -> String {
    "EAAB_TEST".to_string()
}
fn default_simulated_latency_ms() -> u64 {
    400
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_destination_url() -> String {
    "https://play.google.com/store".to_string()
}
fn default_call_to_action() -> String {
    "LEARN_MORE".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            ingest_owner: default_ingest_owner(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            min_duration_ms: default_min_duration_ms(),
            jitter_ms: default_jitter_ms(),
            campaign_label: default_campaign_label(),
        }
    }
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_meta_base_url(),
            api_version: default_meta_api_version(),
            ad_account_id: default_ad_account_id(),
            page_id: default_page_id(),
            mock_token_prefix: default_mock_token_prefix(),
            live_writes: false,
            live_publish: false,
            simulated_latency_ms: default_simulated_latency_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            destination_url: default_destination_url(),
            call_to_action: default_call_to_action(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_game_id: default_game_id(),
            store: StoreConfig::default(),
            publish: PublishConfig::default(),
            meta: MetaConfig::default(),
        }
    }
}

impl MetaConfig {
    /// Versioned Graph API root, e.g. `https://graph.facebook.com/v18.0`.
    pub fn graph_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_version
        )
    }
}

impl AppConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/creative-hub").required(false))
            .add_source(
                config::Environment::with_prefix("CREATIVE_HUB")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
