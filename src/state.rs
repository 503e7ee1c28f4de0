use std::sync::Arc;

use tokio::sync::RwLock;

use crate::clients::anilist::AnilistClient;
use crate::clients::cache::{GuideCache, ResponseCache, SystemClock};
use crate::clients::fillerlist::FillerListClient;
use crate::clients::governor::RequestGovernor;
use crate::clients::jikan::JikanClient;
use crate::config::Config;
use crate::models::anime::CatalogEntry;
use crate::models::episode::EpisodeRecord;
use crate::services::resolver::GuideResolver;
use crate::services::sources::{
    CatalogSource, CuratedSource, EpisodeSource, FillerListSource, JikanSource, ProviderCatalog,
};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across every provider client for connection pooling.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("skiparr/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Everything long-lived the CLI commands, daemon, and API handlers share.
/// The governor and the caches are the only mutable pieces; both manage
/// their own locking.
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub catalog: Arc<dyn CatalogSource>,

    pub resolver: Arc<GuideResolver>,

    pub guides: Arc<GuideCache>,

    pub episode_cache: Arc<ResponseCache<Vec<EpisodeRecord>>>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = build_shared_http_client(config.providers.request_timeout_seconds)?;
        let governor = Arc::new(RequestGovernor::new(config.providers.pacing()));
        let clock = Arc::new(SystemClock);
        let ttl = config.providers.response_ttl();

        let episode_cache: Arc<ResponseCache<Vec<EpisodeRecord>>> =
            Arc::new(ResponseCache::new(ttl, clock.clone()));
        let entry_cache: Arc<ResponseCache<CatalogEntry>> =
            Arc::new(ResponseCache::new(ttl, clock.clone()));
        let search_cache: Arc<ResponseCache<Vec<CatalogEntry>>> =
            Arc::new(ResponseCache::new(ttl, clock));

        let catalog: Arc<dyn CatalogSource> = Arc::new(ProviderCatalog::new(
            JikanClient::new(http.clone()),
            AnilistClient::new(http.clone()),
            governor.clone(),
            entry_cache,
            search_cache,
        ));

        // Priority order: the dedicated filler database first, the general
        // catalog second, curated counts as the last resort.
        let sources: Vec<Arc<dyn EpisodeSource>> = vec![
            Arc::new(FillerListSource::new(
                FillerListClient::new(http.clone()),
                governor.clone(),
                episode_cache.clone(),
            )),
            Arc::new(JikanSource::new(
                JikanClient::new(http),
                governor,
                episode_cache.clone(),
                config.guide.fetch_synopses,
            )),
            Arc::new(CuratedSource),
        ];

        let guides = Arc::new(GuideCache::new());
        let resolver = Arc::new(GuideResolver::new(
            catalog.clone(),
            sources,
            guides.clone(),
            config.guide.episode_duration_minutes,
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            catalog,
            resolver,
            guides,
            episode_cache,
        })
    }
}
