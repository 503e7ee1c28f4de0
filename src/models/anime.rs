use serde::{Deserialize, Serialize};

/// A loosely-specified title identity. The AniList and MyAnimeList id
/// namespaces are unrelated and there is no authoritative cross-reference,
/// so either id (or both) may be unknown at any point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeIdentity {
    pub anilist_id: Option<i64>,
    pub mal_id: Option<i64>,
    pub title: String,
    pub franchise: Option<String>,
}

impl AnimeIdentity {
    #[must_use]
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// The id used to key guide caches. MAL wins when both are known since
    /// the episode providers are keyed off it.
    #[must_use]
    pub const fn cache_id(&self) -> Option<i64> {
        match (self.mal_id, self.anilist_id) {
            (Some(id), _) | (None, Some(id)) => Some(id),
            (None, None) => None,
        }
    }
}

/// Title metadata as answered by a catalog provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub anilist_id: Option<i64>,
    pub mal_id: Option<i64>,
    pub title: String,
    pub title_english: Option<String>,
    pub episode_count: Option<u32>,
    pub status: Option<String>,
    pub score: Option<f32>,
    /// Per-episode runtime when the provider exposes one.
    pub duration_minutes: Option<u32>,
    pub synopsis: Option<String>,
}

impl CatalogEntry {
    #[must_use]
    pub fn identity(&self) -> AnimeIdentity {
        AnimeIdentity {
            anilist_id: self.anilist_id,
            mal_id: self.mal_id,
            title: self.title.clone(),
            franchise: None,
        }
    }
}
