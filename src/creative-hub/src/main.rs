//! Creative Hub — manage game-ad creatives and publish them to ad networks.
//!
//! Command-line front end over the catalog store, the create-ads wizard and
//! the publish job simulator.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use creative_core::config::AppConfig;
use creative_core::{CreativeId, MediaKind, Platform};
use creative_integrations::{AdNetworkClient, MetaAdsClient};
use creative_publisher::{MetaPublishBackend, PublishSimulator};
use creative_store::history::{export_file_name, HistoryStats};
use creative_store::seed::{find_game, seed_games};
use creative_store::{
    export_csv, CreativeFilter, DataStore, FileBackend, HistoryFilter, IngestFile,
};
use creative_wizard::{
    build_ad_groups, incompatible_platforms, CampaignChoice, CreateAdsWizard, EntryMode,
    ReviewList, SelectionKey, SetupForm,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "creative-hub")]
#[command(about = "Manage game-ad creatives and publish them to ad networks")]
#[command(version)]
struct Cli {
    /// Directory holding persisted state (overrides config)
    #[arg(long, env = "CREATIVE_HUB__STORE__DIR")]
    store_dir: Option<String>,

    /// Game to work on (overrides config)
    #[arg(long, short, env = "CREATIVE_HUB__DEFAULT_GAME_ID")]
    game: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List games
    Games,

    /// List the game's creatives
    Creatives {
        /// Case-insensitive match on name or owner
        #[arg(long, default_value = "")]
        search: String,

        /// Only these kinds (repeatable): video, image, playable
        #[arg(long = "kind")]
        kinds: Vec<MediaKind>,

        /// Only creatives deliverable on these platforms (repeatable)
        #[arg(long = "platform")]
        platforms: Vec<Platform>,
    },

    /// Add media files to the game's catalog
    Ingest {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Owner recorded on new creatives (overrides config)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Delete creatives by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Store a Meta access token
    Connect { token: String },

    /// Forget the stored Meta access token
    Disconnect,

    /// List Meta campaigns and ad sets for the connected account
    Campaigns,

    /// Create the seed campaign and ad set in the sandbox account
    SeedSandbox,

    /// Publish creatives through the create-ads wizard
    Publish {
        /// Creative to publish in all its dimensions (repeatable)
        #[arg(long = "creative")]
        creatives: Vec<String>,

        /// Single creative version as `<id>-<dimension>` (repeatable)
        #[arg(long = "select")]
        versions: Vec<SelectionKey>,

        /// Target platforms in order (repeatable)
        #[arg(long = "platform", required = true)]
        platforms: Vec<Platform>,

        /// Existing campaign id, or the name of a new campaign
        #[arg(long)]
        campaign: String,

        /// Existing ad set id
        #[arg(long, conflicts_with = "new_ad_set")]
        ad_set: Option<String>,

        /// Name of a new ad set
        #[arg(long)]
        new_ad_set: Option<String>,

        /// Ad naming template ({Campaign}, {Date}, {Creative})
        #[arg(long)]
        naming: Option<String>,
    },

    /// Show publish history
    History {
        #[arg(long, default_value = "")]
        search: String,

        /// Success, Partial or Failed
        #[arg(long)]
        status: Option<creative_core::HistoryStatus>,

        /// Write the filtered history as CSV into this directory
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creative_hub=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(dir) = cli.store_dir {
        config.store.dir = dir;
    }
    if let Some(game) = cli.game {
        config.default_game_id = game;
    }
    info!(
        store_dir = %config.store.dir,
        game = %config.default_game_id,
        live_writes = config.meta.live_writes,
        "Configuration loaded"
    );

    let store = Arc::new(DataStore::load(Arc::new(FileBackend::new(&config.store.dir))));
    let app = App { config, store };

    let result = match cli.command {
        Commands::Games => app.cmd_games(),
        Commands::Creatives {
            search,
            kinds,
            platforms,
        } => app.cmd_creatives(search, kinds, platforms),
        Commands::Ingest { files, owner } => app.cmd_ingest(files, owner),
        Commands::Delete { ids } => app.cmd_delete(ids),
        Commands::Connect { token } => app.cmd_connect(&token),
        Commands::Disconnect => app.cmd_disconnect(),
        Commands::Campaigns => app.cmd_campaigns().await,
        Commands::SeedSandbox => app.cmd_seed_sandbox().await,
        Commands::Publish {
            creatives,
            versions,
            platforms,
            campaign,
            ad_set,
            new_ad_set,
            naming,
        } => {
            let targets = PublishTargets {
                creatives,
                versions,
                platforms,
                campaign,
                ad_set,
                new_ad_set,
                naming,
            };
            app.cmd_publish(targets).await
        }
        Commands::History {
            search,
            status,
            csv,
        } => app.cmd_history(search, status, csv),
    };

    app.store.flush_all();
    result
}

struct PublishTargets {
    creatives: Vec<String>,
    versions: Vec<SelectionKey>,
    platforms: Vec<Platform>,
    campaign: String,
    ad_set: Option<String>,
    new_ad_set: Option<String>,
    naming: Option<String>,
}

struct App {
    config: AppConfig,
    store: Arc<DataStore>,
}

impl App {
    fn game_id(&self) -> &str {
        &self.config.default_game_id
    }

    fn meta_client(&self) -> anyhow::Result<MetaAdsClient> {
        MetaAdsClient::new(self.config.meta.clone()).context("Failed to build Meta client")
    }

    fn require_token(&self) -> anyhow::Result<String> {
        self.store
            .meta_token()
            .context("No Meta account connected; run `creative-hub connect <token>` first")
    }

    // ─── Catalog ───────────────────────────────────────────────────────────

    fn cmd_games(&self) -> anyhow::Result<()> {
        for game in seed_games() {
            let count = self.store.creatives_for_game(&game.id).len();
            println!("{:<4} {:<18} {:<16} {count} creatives", game.id, game.name, game.genre);
        }
        Ok(())
    }

    fn cmd_creatives(
        &self,
        search: String,
        kinds: Vec<MediaKind>,
        platforms: Vec<Platform>,
    ) -> anyhow::Result<()> {
        let mut filter = CreativeFilter::for_game(self.game_id());
        filter.search = search;
        if !kinds.is_empty() {
            filter.kinds = kinds.into_iter().collect();
        }
        if !platforms.is_empty() {
            filter.platforms = platforms.into_iter().collect();
        }

        let uploaded = self.store.uploaded_status();
        let creatives = filter.apply(&self.store.creatives());
        for c in &creatives {
            let dims: Vec<&str> = c.dimensions.iter().map(|d| d.as_str()).collect();
            let live: Vec<String> = uploaded
                .get(&c.id)
                .map(|p| p.iter().map(|p| p.to_string()).collect())
                .unwrap_or_default();
            println!(
                "{:<12} {:<24} {:<9} {:<20} {:<14} {}  {} units{}",
                c.id,
                c.name,
                c.kind,
                dims.join(","),
                c.owner,
                c.created_on.format("%b %d"),
                c.ad_units(),
                if live.is_empty() {
                    String::new()
                } else {
                    format!("  live: {}", live.join(","))
                }
            );
        }
        println!("{} creatives", creatives.len());
        Ok(())
    }

    fn cmd_ingest(&self, files: Vec<PathBuf>, owner: Option<String>) -> anyhow::Result<()> {
        let owner = owner.unwrap_or_else(|| self.config.store.ingest_owner.clone());
        let mut described = Vec::with_capacity(files.len());
        for path in &files {
            let file = IngestFile::probe(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            described.push(file);
        }

        let report = creative_store::ingest::ingest(&self.store, self.game_id(), &owner, described);
        for c in &report.added {
            let dims: Vec<&str> = c.dimensions.iter().map(|d| d.as_str()).collect();
            println!("added    {} {} [{}]", c.id, c.name, dims.join(","));
        }
        for name in &report.duplicates {
            println!("skipped  {name} (already uploaded)");
        }
        for (name, err) in &report.rejected {
            println!("rejected {name}: {err}");
        }
        Ok(())
    }

    fn cmd_delete(&self, ids: Vec<String>) -> anyhow::Result<()> {
        let ids: Vec<CreativeId> = ids.into_iter().map(CreativeId::new).collect();
        let removed = self.store.delete_creatives(&ids);
        println!("Deleted {removed} creative(s)");
        Ok(())
    }

    // ─── Ad network ────────────────────────────────────────────────────────

    fn cmd_connect(&self, token: &str) -> anyhow::Result<()> {
        if token.trim().is_empty() {
            bail!("Access token must not be empty");
        }
        self.store.set_meta_token(token);
        println!("Meta account connected");
        Ok(())
    }

    fn cmd_disconnect(&self) -> anyhow::Result<()> {
        self.store.clear_meta_token();
        println!("Meta account disconnected");
        Ok(())
    }

    async fn cmd_campaigns(&self) -> anyhow::Result<()> {
        let token = self.require_token()?;
        let client = self.meta_client()?;
        println!("Campaigns:");
        for c in client.fetch_campaigns(&token).await? {
            println!("  {:<16} {}", c.id, c.name);
        }
        println!("Ad sets:");
        for a in client.fetch_ad_sets(&token).await? {
            println!("  {:<16} {}", a.id, a.name);
        }
        Ok(())
    }

    async fn cmd_seed_sandbox(&self) -> anyhow::Result<()> {
        let token = self.require_token()?;
        let seed = self.meta_client()?.seed_sandbox(&token).await?;
        println!("Campaign: {}", seed.campaign_id);
        println!("Ad set:   {}", seed.ad_set_id);
        Ok(())
    }

    // ─── Publishing ────────────────────────────────────────────────────────

    async fn setup_form(&self) -> anyhow::Result<SetupForm> {
        let Some(token) = self.store.meta_token() else {
            return Ok(SetupForm::new());
        };
        let client = self.meta_client()?;
        let campaigns = client.fetch_campaigns(&token).await?;
        let ad_sets = client.fetch_ad_sets(&token).await?;
        Ok(SetupForm::with_catalog(campaigns, ad_sets))
    }

    async fn cmd_publish(&self, targets: PublishTargets) -> anyhow::Result<()> {
        let catalog = self.store.creatives_for_game(self.game_id());
        let mut wizard = CreateAdsWizard::new(self.game_id());

        // 1. Select creatives
        for id in &targets.creatives {
            let creative = catalog
                .iter()
                .find(|c| c.id.as_str() == id)
                .with_context(|| format!("Unknown creative '{id}' for game {}", self.game_id()))?;
            wizard.selection_mut().toggle_all_dimensions(creative);
        }
        for key in &targets.versions {
            wizard
                .selection_mut()
                .toggle_dimension(&key.creative_id, &key.dimension);
        }
        wizard.next().context("Select at least one creative")?;

        // 2. Choose platforms
        for platform in &targets.platforms {
            wizard.platforms_mut().insert(*platform);
        }
        wizard.next().context("Select at least one platform")?;
        for issue in incompatible_platforms(wizard.selection(), wizard.platforms(), &catalog) {
            println!("warning: {}", issue.message());
        }

        // 3. Platform setup
        let form = self.setup_form().await?;
        let campaign_choice = if form.campaigns().iter().any(|c| c.id == targets.campaign) {
            CampaignChoice::Existing(targets.campaign.clone())
        } else {
            CampaignChoice::New(targets.campaign.clone())
        };
        let mut wizard = wizard.with_setup_form(form);
        let platforms: Vec<Platform> = wizard.platforms().iter().collect();
        for platform in &platforms {
            let setup = wizard.setup_mut();
            setup.set_campaign(*platform, campaign_choice.clone());
            match (&targets.ad_set, &targets.new_ad_set) {
                (_, Some(name)) => {
                    setup.set_ad_set_mode(*platform, EntryMode::New);
                    setup.set_new_ad_set_name(*platform, name.clone());
                }
                (Some(id), None) => setup.select_existing_ad_set(*platform, id.clone()),
                (None, None) => {}
            }
            if let Some(naming) = &targets.naming {
                setup.set_naming(*platform, naming.clone());
            }
        }
        if let Err(e) = wizard.next() {
            for platform in &platforms {
                if let Some(data) = wizard.setup().data(*platform) {
                    let missing = data.missing_fields();
                    if !missing.is_empty() {
                        println!("{}: missing {}", platform.display_name(), missing.join(", "));
                    }
                }
            }
            return Err(e).context("Platform setup is incomplete");
        }

        // 4. Review
        let review = ReviewList::new(build_ad_groups(wizard.selection(), wizard.platforms(), &catalog));
        for group in review.groups() {
            let dims: Vec<&str> = group.dimensions.iter().map(|d| d.as_str()).collect();
            println!(
                "{:<10} {:<24} [{}]{}",
                group.platform.display_name(),
                group.creative_name,
                dims.join(","),
                if group.compatible { "" } else { "  (incompatible)" }
            );
        }
        println!("{} ads to create", review.total_ads());

        // 5. Publish
        let request = wizard.publish()?;
        let mut simulator = PublishSimulator::from_config(self.store.clone(), &self.config.publish);
        if self.config.meta.live_publish {
            let client: Arc<dyn AdNetworkClient> = Arc::new(self.meta_client()?);
            let backend = MetaPublishBackend::new(client, self.store.clone(), self.config.meta.clone());
            simulator = simulator.with_backend(Platform::Meta, Arc::new(backend));
        }

        let jobs = simulator.start_publish(request).wait().await;
        let mut failed = 0;
        for job in &jobs {
            match &job.error {
                Some(err) => {
                    failed += 1;
                    println!("{:<10} {}: {err}", job.platform.display_name(), job.status.display_name());
                }
                None => println!(
                    "{:<10} {} ({} creatives)",
                    job.platform.display_name(),
                    job.status.display_name(),
                    job.items
                ),
            }
        }
        if failed > 0 {
            bail!("{failed} of {} publish jobs failed", jobs.len());
        }
        Ok(())
    }

    // ─── History ───────────────────────────────────────────────────────────

    fn cmd_history(
        &self,
        search: String,
        status: Option<creative_core::HistoryStatus>,
        csv: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let all = self.store.history();
        let filter = HistoryFilter {
            game_id: Some(self.game_id().to_string()),
            search,
            status,
        };
        let records = filter.apply(&all);
        let stats = HistoryStats::compute(&records, &all);

        for r in &records {
            println!(
                "{} {:<24} {:<9} {:<8} {:>3} {}",
                r.id,
                r.campaign,
                r.platform,
                r.status,
                r.creatives,
                r.date.format("%Y-%m-%d")
            );
        }
        println!(
            "{} jobs, {}% success, last activity {}",
            stats.total,
            stats.success_rate,
            stats
                .last_activity
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".into())
        );

        if let Some(dir) = csv {
            let Some(content) = export_csv(&records) else {
                println!("Nothing to export");
                return Ok(());
            };
            let game_name = find_game(&seed_games(), self.game_id())
                .map(|g| g.name)
                .unwrap_or_else(|| self.game_id().to_string());
            let path = dir.join(export_file_name(&game_name, Local::now().date_naive()));
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }
}
