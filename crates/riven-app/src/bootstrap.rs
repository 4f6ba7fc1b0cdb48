use std::path::PathBuf;
use std::sync::Arc;

use riven_config::{ConfigService, Settings, default_settings};
use riven_data::ItemRepository;
use riven_debrid::CooldownRegistry;
use riven_download::DownloadOrchestrator;
use riven_events::EventBus;
use riven_harvester::HarvesterClient;
use riven_postprocess::EpisodeValidator;
use riven_scheduler::{EventManager, Service};
use riven_telemetry::{LoggingConfig, init_logging};
use riven_vfs::{InMemoryVfsHost, RetentionEnforcer, VfsRegistrar};
use tracing::info;

use crate::debrid_providers::build_providers;
use crate::error::{AppError, AppResult};
use crate::metadata::{TmdbClient, TmdbEpisodeCountProvider};
use crate::services::{DownloaderService, FilesystemService, IndexerService, PostProcessingService, ScraperService};

const DEFAULT_WORKER_COUNT: usize = 4;

/// Wired dependencies the acquisition pipeline runs against.
pub(crate) struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    repo: Arc<ItemRepository>,
    events: EventBus,
    services: Vec<Arc<dyn Service>>,
}

impl BootstrapDependencies {
    /// Assemble production dependencies from an optional `RIVEN_CONFIG_PATH` TOML
    /// file layered under `RIVEN_`-prefixed environment variables.
    pub(crate) fn from_env() -> AppResult<Self> {
        let logging = LoggingConfig::default();

        let config_path = std::env::var("RIVEN_CONFIG_PATH").ok().map(PathBuf::from);
        let defaults = default_settings();
        let config = Arc::new(ConfigService::load(config_path, &defaults).map_err(|err| AppError::config("config.load", err))?);
        let settings = config.current();

        let repo = Arc::new(ItemRepository::new());
        let events = EventBus::new();

        let providers = build_providers(&settings.providers);
        let harvester = harvester_client(&settings);
        let metadata = Arc::new(TmdbClient::new(settings.metadata.clone()));

        let services = build_services(&repo, &events, &config, &settings, providers, harvester, metadata);

        Ok(Self { logging, repo, events, services })
    }
}

fn harvester_client(settings: &Settings) -> Option<Arc<HarvesterClient>> {
    if settings.harvester.enabled {
        Some(Arc::new(HarvesterClient::new(settings.harvester.clone())))
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn build_services(
    repo: &Arc<ItemRepository>,
    events: &EventBus,
    config: &Arc<ConfigService>,
    settings: &Settings,
    providers: Vec<Arc<dyn riven_debrid::DebridProvider>>,
    harvester: Option<Arc<HarvesterClient>>,
    metadata: Arc<TmdbClient>,
) -> Vec<Arc<dyn Service>> {
    let indexer = IndexerService::new(Arc::clone(repo), Arc::clone(&metadata), events.clone());

    let scraper = ScraperService::new(
        Arc::clone(repo),
        harvester.clone(),
        providers.clone(),
        Arc::clone(config),
        events.clone(),
    );

    let keep_versions: u32 = settings.ranking_profiles.iter().map(|p| p.keep_versions_per_item).sum::<u32>().max(1);
    let orchestrator = DownloadOrchestrator::new(Arc::clone(repo), providers.clone(), Arc::new(CooldownRegistry::new()), events.clone());
    let downloader = DownloaderService::new(Arc::clone(repo), orchestrator, keep_versions);

    let host = Arc::new(InMemoryVfsHost::new());
    let registrar = VfsRegistrar::new(host, events.clone());
    let retention = RetentionEnforcer::new(events.clone());
    let filesystem = FilesystemService::new(registrar, retention, Arc::clone(config));

    let episode_count_provider = Arc::new(TmdbEpisodeCountProvider::new(metadata));
    let validator = EpisodeValidator::new(Arc::clone(repo), harvester, providers, episode_count_provider, events.clone());
    let postprocessing = PostProcessingService::new(Arc::clone(repo), validator);

    vec![
        Arc::new(indexer),
        Arc::new(scraper),
        Arc::new(downloader),
        Arc::new(filesystem),
        Arc::new(postprocessing),
    ]
}

/// Entry point for the pipeline's boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or logging setup fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    init_logging(&dependencies.logging)
        .map_err(|err| AppError::InvalidConfig { field: "logging", reason: "init_failed", value: Some(err.to_string()) })?;

    info!("acquisition pipeline bootstrap starting");

    let BootstrapDependencies { logging: _, repo, events, services } = dependencies;

    let manager = Arc::new(EventManager::new(repo, events, services));
    let workers = manager.spawn_workers(DEFAULT_WORKER_COUNT);

    info!(worker_count = DEFAULT_WORKER_COUNT, "dispatch workers running");

    tokio::signal::ctrl_c().await.map_err(|source| AppError::Io { operation: "signal.ctrl_c", path: None, source })?;

    info!("shutdown signal received");
    manager.request_shutdown();
    for worker in workers {
        let _ = worker.await;
    }

    info!("acquisition pipeline shutdown complete");
    Ok(())
}
