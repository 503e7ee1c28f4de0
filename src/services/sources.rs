use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::clients::anilist::AnilistClient;
use crate::clients::cache::ResponseCache;
use crate::clients::fillerlist::FillerListClient;
use crate::clients::governor::{Provider, RequestGovernor};
use crate::clients::jikan::{EpisodePage, JikanClient, MalEpisodeDetail};
use crate::constants::{guide, limits};
use crate::models::anime::{AnimeIdentity, CatalogEntry};
use crate::models::episode::EpisodeRecord;
use crate::services::classifier::FillerEvidence;
use crate::services::{catalog, matching};

/// One way of answering "what are this title's episodes?". Strategies are
/// tried in declared priority order; an empty answer advances to the next
/// one.
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn evidence(&self) -> FillerEvidence;

    async fn fetch_episodes(&self, identity: &AnimeIdentity) -> Vec<EpisodeRecord>;
}

/// Title metadata lookups, decoupled from the concrete providers so the
/// orchestrator can be driven by fakes in tests.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn lookup_id(&self, id: i64) -> Option<CatalogEntry>;

    async fn search(&self, query: &str) -> Vec<CatalogEntry>;
}

/// The dedicated filler database: fuzzy name lookup, then the episode
/// type list for the best-matching slug.
pub struct FillerListSource {
    client: FillerListClient,
    governor: Arc<RequestGovernor>,
    cache: Arc<ResponseCache<Vec<EpisodeRecord>>>,
}

impl FillerListSource {
    #[must_use]
    pub fn new(
        client: FillerListClient,
        governor: Arc<RequestGovernor>,
        cache: Arc<ResponseCache<Vec<EpisodeRecord>>>,
    ) -> Self {
        Self {
            client,
            governor,
            cache,
        }
    }
}

#[async_trait]
impl EpisodeSource for FillerListSource {
    fn name(&self) -> &'static str {
        "animefillerlist"
    }

    fn evidence(&self) -> FillerEvidence {
        FillerEvidence::Authoritative
    }

    async fn fetch_episodes(&self, identity: &AnimeIdentity) -> Vec<EpisodeRecord> {
        let key = format!("fillerlist:{}", identity.title.to_lowercase());
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let shows = self
            .governor
            .call(Provider::FillerList, || {
                self.client.search_shows(&identity.title)
            })
            .await;

        let best = shows
            .iter()
            .map(|s| (s, matching::title_score(&identity.title, &s.name)))
            .filter(|(_, score)| *score >= matching::MATCH_THRESHOLD)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(s, _)| s);

        let Some(show) = best else {
            debug!(title = %identity.title, "no filler database candidate");
            return Vec::new();
        };

        let episodes = self
            .governor
            .call(Provider::FillerList, || self.client.get_show(&show.slug))
            .await;

        let mut records: Vec<EpisodeRecord> =
            episodes.into_iter().map(|e| e.into_record()).collect();
        records.sort_by_key(|r| r.number);

        self.cache.put(key, records.clone());
        records
    }
}

/// The REST catalog's paginated episode list, optionally hydrated with
/// per-episode synopses through a bounded worker pool.
pub struct JikanSource {
    client: JikanClient,
    governor: Arc<RequestGovernor>,
    cache: Arc<ResponseCache<Vec<EpisodeRecord>>>,
    fetch_synopses: bool,
}

impl JikanSource {
    #[must_use]
    pub fn new(
        client: JikanClient,
        governor: Arc<RequestGovernor>,
        cache: Arc<ResponseCache<Vec<EpisodeRecord>>>,
        fetch_synopses: bool,
    ) -> Self {
        Self {
            client,
            governor,
            cache,
            fetch_synopses,
        }
    }

    /// Fill in missing synopses from the per-episode endpoint. The stream
    /// runs a fixed-width worker pool; the governor still enforces the
    /// aggregate per-provider spacing underneath it.
    async fn hydrate_synopses(&self, mal_id: i64, records: &mut [EpisodeRecord]) {
        let missing: Vec<u32> = records
            .iter()
            .filter(|r| r.synopsis.is_none())
            .map(|r| r.number)
            .collect();

        if missing.is_empty() {
            return;
        }

        let details: Vec<Option<MalEpisodeDetail>> = stream::iter(missing)
            .map(|number| {
                self.governor.call(Provider::Jikan, move || {
                    self.client.get_episode(mal_id, number)
                })
            })
            .buffered(guide::SYNOPSIS_WORKERS)
            .collect()
            .await;

        merge_synopses(records, details.into_iter().flatten());
    }
}

#[async_trait]
impl EpisodeSource for JikanSource {
    fn name(&self) -> &'static str {
        "jikan"
    }

    fn evidence(&self) -> FillerEvidence {
        FillerEvidence::Heuristic
    }

    async fn fetch_episodes(&self, identity: &AnimeIdentity) -> Vec<EpisodeRecord> {
        let Some(mal_id) = identity.mal_id else {
            return Vec::new();
        };

        let key = format!("jikan:episodes:{mal_id}");
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let result: EpisodePage = self
                .governor
                .call(Provider::Jikan, || self.client.get_episodes(mal_id, page))
                .await;

            records.extend(result.episodes.into_iter().map(|e| e.into_record()));

            if !result.has_next_page {
                break;
            }
            if page >= limits::MAX_EPISODE_PAGES {
                warn!(mal_id, page, "episode list still paginating, stopping");
                break;
            }
            page += 1;
        }

        records.sort_by_key(|r| r.number);

        if self.fetch_synopses && !records.is_empty() {
            self.hydrate_synopses(mal_id, &mut records).await;
        }

        self.cache.put(key, records.clone());
        records
    }
}

/// Last-resort strategy: synthesize bare records from the curated episode
/// count table so franchise guides survive total provider outage.
pub struct CuratedSource;

#[async_trait]
impl EpisodeSource for CuratedSource {
    fn name(&self) -> &'static str {
        "curated"
    }

    fn evidence(&self) -> FillerEvidence {
        FillerEvidence::Heuristic
    }

    async fn fetch_episodes(&self, identity: &AnimeIdentity) -> Vec<EpisodeRecord> {
        catalog::fallback_episode_count(identity)
            .map(|count| (1..=count).map(EpisodeRecord::new).collect())
            .unwrap_or_default()
    }
}

/// Catalog lookups backed by the real providers: the REST catalog first,
/// the GraphQL catalog as fallback.
pub struct ProviderCatalog {
    jikan: JikanClient,
    anilist: AnilistClient,
    governor: Arc<RequestGovernor>,
    entry_cache: Arc<ResponseCache<CatalogEntry>>,
    search_cache: Arc<ResponseCache<Vec<CatalogEntry>>>,
}

impl ProviderCatalog {
    #[must_use]
    pub fn new(
        jikan: JikanClient,
        anilist: AnilistClient,
        governor: Arc<RequestGovernor>,
        entry_cache: Arc<ResponseCache<CatalogEntry>>,
        search_cache: Arc<ResponseCache<Vec<CatalogEntry>>>,
    ) -> Self {
        Self {
            jikan,
            anilist,
            governor,
            entry_cache,
            search_cache,
        }
    }
}

#[async_trait]
impl CatalogSource for ProviderCatalog {
    async fn lookup_id(&self, id: i64) -> Option<CatalogEntry> {
        let key = format!("catalog:id:{id}");
        if let Some(hit) = self.entry_cache.get(&key) {
            return Some(hit);
        }

        let from_mal = self
            .governor
            .call(Provider::Jikan, || self.jikan.get_anime(id))
            .await;

        if let Some(anime) = from_mal {
            let entry = anime.into_catalog_entry();
            self.entry_cache.put(key, entry.clone());
            return Some(entry);
        }

        // The id namespaces are unrelated; retrying the same number against
        // the GraphQL catalog is a heuristic, not a cross-reference.
        let from_anilist = self
            .governor
            .call(Provider::AniList, || self.anilist.get_by_id(id))
            .await;

        if let Some(entry) = from_anilist {
            self.entry_cache.put(key, entry.clone());
            return Some(entry);
        }

        None
    }

    async fn search(&self, query: &str) -> Vec<CatalogEntry> {
        let key = format!("catalog:search:{}", query.to_lowercase());
        if let Some(hit) = self.search_cache.get(&key) {
            return hit;
        }

        let mut entries: Vec<CatalogEntry> = self
            .governor
            .call(Provider::Jikan, || self.jikan.search(query))
            .await
            .into_iter()
            .map(|a| a.into_catalog_entry())
            .take(limits::MAX_SEARCH_RESULTS)
            .collect();

        if entries.is_empty() {
            entries = self
                .governor
                .call(Provider::AniList, || self.anilist.search_titles(query))
                .await
                .into_iter()
                .take(limits::MAX_SEARCH_RESULTS)
                .collect();
        }

        self.search_cache.put(key, entries.clone());
        entries
    }
}

/// Copy synopses onto records that lack one, matching by episode number.
pub fn merge_synopses(
    records: &mut [EpisodeRecord],
    details: impl IntoIterator<Item = MalEpisodeDetail>,
) {
    let by_number: HashMap<u32, MalEpisodeDetail> =
        details.into_iter().map(|d| (d.mal_id, d)).collect();

    for record in records {
        if record.synopsis.is_none()
            && let Some(detail) = by_number.get(&record.number)
        {
            record.synopsis = detail.synopsis.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(number: u32, synopsis: &str) -> MalEpisodeDetail {
        MalEpisodeDetail {
            mal_id: number,
            title: None,
            synopsis: Some(synopsis.to_string()),
        }
    }

    #[test]
    fn merge_fills_only_missing_synopses() {
        let mut records = vec![
            EpisodeRecord {
                synopsis: Some("already here".to_string()),
                ..EpisodeRecord::new(1)
            },
            EpisodeRecord::new(2),
            EpisodeRecord::new(3),
        ];

        merge_synopses(
            &mut records,
            vec![detail(1, "clobber"), detail(2, "fresh")],
        );

        assert_eq!(records[0].synopsis.as_deref(), Some("already here"));
        assert_eq!(records[1].synopsis.as_deref(), Some("fresh"));
        assert_eq!(records[2].synopsis, None);
    }

    #[tokio::test]
    async fn curated_source_synthesizes_known_counts() {
        let identity = AnimeIdentity {
            mal_id: Some(20),
            title: "Naruto".to_string(),
            ..AnimeIdentity::default()
        };

        let records = CuratedSource.fetch_episodes(&identity).await;
        assert_eq!(records.len(), 220);
        assert_eq!(records[0].number, 1);
        assert!(!records[0].filler);
    }

    #[tokio::test]
    async fn curated_source_is_empty_for_unknown_titles() {
        let identity = AnimeIdentity::from_title("Frieren");
        assert!(CuratedSource.fetch_episodes(&identity).await.is_empty());
    }
}
