use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clients::cache::GuideCache;
use crate::models::anime::{AnimeIdentity, CatalogEntry};
use crate::models::episode::EpisodeRecord;
use crate::models::guide::{FranchiseWatchGuide, WatchGuide};
use crate::services::catalog::{self, Franchise};
use crate::services::classifier::FillerEvidence;
use crate::services::franchise::build_franchise_guide;
use crate::services::guide::{GuideOptions, build_guide};
use crate::services::matching;
use crate::services::sources::{CatalogSource, EpisodeSource};

/// What a query resolved to. `Absent` is a normal answer, never an error:
/// the caller presents "no guide available" instead of a fault.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Resolution {
    Guide(WatchGuide),
    Franchise(FranchiseWatchGuide),
    Absent,
}

impl Resolution {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// The only entry point external callers drive. Decides which sources to
/// consult, in what order, and assembles the final guide values.
pub struct GuideResolver {
    catalog: Arc<dyn CatalogSource>,
    sources: Vec<Arc<dyn EpisodeSource>>,
    guides: Arc<GuideCache>,
    default_duration_minutes: u32,
}

impl GuideResolver {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        sources: Vec<Arc<dyn EpisodeSource>>,
        guides: Arc<GuideCache>,
        default_duration_minutes: u32,
    ) -> Self {
        Self {
            catalog,
            sources,
            guides,
            default_duration_minutes,
        }
    }

    /// Resolve a loosely-specified query: a numeric title id, a franchise
    /// name, or free text. Every failure path falls through to the next
    /// strategy; only full exhaustion yields `Absent`.
    pub async fn resolve(&self, query: &str) -> Resolution {
        let query = query.trim();
        if query.is_empty() {
            return Resolution::Absent;
        }

        if let Ok(id) = query.parse::<i64>() {
            return self.resolve_id(id).await;
        }

        if let Some(franchise) = catalog::find(query) {
            debug!(query, franchise = franchise.name, "query matched a franchise name");
            return self.resolve_franchise(franchise).await;
        }

        if let Some(franchise) = catalog::find_by_member_title(query) {
            debug!(
                query,
                franchise = franchise.name,
                "query matched a curated member title"
            );
            return self.resolve_franchise(franchise).await;
        }

        self.resolve_free_text(query).await
    }

    async fn resolve_id(&self, id: i64) -> Resolution {
        if let Some(guide) = self.guides.guide_for_id(id) {
            return Resolution::Guide(guide);
        }

        let entry = self.catalog.lookup_id(id).await;
        let identity = entry.as_ref().map_or_else(
            || AnimeIdentity {
                mal_id: Some(id),
                title: format!("Anime {id}"),
                ..AnimeIdentity::default()
            },
            CatalogEntry::identity,
        );

        match self.build_title_guide(&identity, entry.as_ref()).await {
            Some(guide) => {
                self.guides.store_guide(id, &guide);
                Resolution::Guide(guide)
            }
            None => {
                info!(id, "no source produced episodes for this id");
                Resolution::Absent
            }
        }
    }

    async fn resolve_free_text(&self, query: &str) -> Resolution {
        if let Some(guide) = self.guides.guide_for_search(query) {
            return Resolution::Guide(guide);
        }

        let candidates = self.catalog.search(query).await;
        let best = candidates
            .into_iter()
            .map(|c| (matching::title_score(query, &c.title), c))
            .filter(|(score, _)| *score >= matching::MATCH_THRESHOLD)
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, c)| c);

        let Some(entry) = best else {
            info!(query, "catalog search produced no usable match");
            return Resolution::Absent;
        };

        // A search hit whose title belongs to a curated franchise redirects
        // to the full franchise guide.
        if let Some(franchise) = catalog::find_by_member_title(&entry.title) {
            debug!(
                query,
                title = %entry.title,
                franchise = franchise.name,
                "search result belongs to a franchise"
            );
            return self.resolve_franchise(franchise).await;
        }

        let identity = entry.identity();
        match self.build_title_guide(&identity, Some(&entry)).await {
            Some(guide) => {
                if let Some(id) = identity.cache_id() {
                    self.guides.store_guide(id, &guide);
                }
                self.guides.store_search(query, &guide);
                Resolution::Guide(guide)
            }
            None => Resolution::Absent,
        }
    }

    async fn resolve_franchise(&self, franchise: &Franchise) -> Resolution {
        if let Some(guide) = self.guides.franchise(franchise.name) {
            return Resolution::Franchise(guide);
        }

        let mut member_guides = Vec::new();
        for member in franchise.ordered_members() {
            let identity = member.identity(franchise);
            match self.build_title_guide(&identity, None).await {
                Some(guide) => member_guides.push(guide),
                // Curated counts normally backstop every member; a miss
                // means the member is skipped, not the whole franchise.
                None => warn!(
                    franchise = franchise.name,
                    member = member.title,
                    "member resolved to no episodes, skipping"
                ),
            }
        }

        if member_guides.is_empty() {
            return Resolution::Absent;
        }

        let guide = build_franchise_guide(franchise, member_guides);
        self.guides.store_franchise(franchise.name, &guide);
        Resolution::Franchise(guide)
    }

    /// Try the episode sources in priority order and assemble a guide from
    /// the first non-empty answer.
    async fn build_title_guide(
        &self,
        identity: &AnimeIdentity,
        entry: Option<&CatalogEntry>,
    ) -> Option<WatchGuide> {
        let (records, evidence) = self.fetch_records(identity).await?;

        let options = GuideOptions {
            episode_duration_minutes: entry
                .and_then(|e| e.duration_minutes)
                .unwrap_or(self.default_duration_minutes),
            evidence,
        };

        match build_guide(identity.clone(), records, options) {
            Ok(guide) => Some(guide),
            Err(err) => {
                debug!(title = %identity.title, error = %err, "guide assembly failed");
                None
            }
        }
    }

    async fn fetch_records(
        &self,
        identity: &AnimeIdentity,
    ) -> Option<(Vec<EpisodeRecord>, FillerEvidence)> {
        for source in &self.sources {
            let records = source.fetch_episodes(identity).await;
            if records.is_empty() {
                debug!(
                    source = source.name(),
                    title = %identity.title,
                    "source had no episodes, trying next"
                );
                continue;
            }
            info!(
                source = source.name(),
                title = %identity.title,
                count = records.len(),
                "episodes resolved"
            );
            return Some((records, source.evidence()));
        }
        None
    }
}
