use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use super::governor::FetchError;
use crate::models::anime::CatalogEntry;
use crate::models::episode::EpisodeRecord;

const JIKAN_API: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Deserialize)]
struct JikanResponse<T> {
    data: T,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct MalAnime {
    pub mal_id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub score: Option<f32>,
    pub synopsis: Option<String>,
    /// Human-readable runtime, e.g. "24 min per ep".
    pub duration: Option<String>,
}

impl MalAnime {
    /// Extract the per-episode minutes from the duration string.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"(\d+)\s*min").expect("valid duration pattern"));

        self.duration
            .as_deref()
            .and_then(|d| re.captures(d))
            .and_then(|caps| caps[1].parse().ok())
    }

    #[must_use]
    pub fn into_catalog_entry(self) -> CatalogEntry {
        let duration_minutes = self.duration_minutes();
        CatalogEntry {
            anilist_id: None,
            mal_id: Some(self.mal_id),
            title: self.title,
            title_english: self.title_english,
            episode_count: self.episodes,
            status: self.status,
            score: self.score,
            duration_minutes,
            synopsis: self.synopsis,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MalEpisode {
    pub mal_id: u32,
    pub title: Option<String>,
    pub aired: Option<String>,
    #[serde(default)]
    pub filler: bool,
    #[serde(default)]
    pub recap: bool,
}

impl MalEpisode {
    #[must_use]
    pub fn into_record(self) -> EpisodeRecord {
        EpisodeRecord {
            number: self.mal_id,
            title: self.title,
            filler: self.filler,
            recap: self.recap,
            synopsis: None,
            aired: self.aired,
        }
    }
}

/// One page of the episode list plus the upstream's own continuation flag.
#[derive(Debug)]
pub struct EpisodePage {
    pub episodes: Vec<MalEpisode>,
    pub has_next_page: bool,
}

impl super::governor::Degraded for EpisodePage {
    fn degraded() -> Self {
        Self {
            episodes: Vec::new(),
            has_next_page: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MalEpisodeDetail {
    pub mal_id: u32,
    pub title: Option<String>,
    pub synopsis: Option<String>,
}

/// REST catalog + episode provider (MyAnimeList via Jikan).
#[derive(Clone)]
pub struct JikanClient {
    client: Client,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl JikanClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get_anime(&self, mal_id: i64) -> Result<Option<MalAnime>, FetchError> {
        let url = format!("{JIKAN_API}/anime/{mal_id}");
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: JikanResponse<MalAnime> = response.json().await?;
        Ok(Some(payload.data))
    }

    pub async fn get_episodes(&self, mal_id: i64, page: u32) -> Result<EpisodePage, FetchError> {
        let url = format!("{JIKAN_API}/anime/{mal_id}/episodes?page={page}");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: JikanResponse<Vec<MalEpisode>> = response.json().await?;
        Ok(EpisodePage {
            episodes: payload.data,
            has_next_page: payload.pagination.is_some_and(|p| p.has_next_page),
        })
    }

    pub async fn get_episode(
        &self,
        mal_id: i64,
        number: u32,
    ) -> Result<Option<MalEpisodeDetail>, FetchError> {
        let url = format!("{JIKAN_API}/anime/{mal_id}/episodes/{number}");
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: JikanResponse<MalEpisodeDetail> = response.json().await?;
        Ok(Some(payload.data))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<MalAnime>, FetchError> {
        let url = format!(
            "{JIKAN_API}/anime?q={}&limit=10",
            urlencoding::encode(query)
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: JikanResponse<Vec<MalAnime>> = response.json().await?;
        Ok(payload.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anime(duration: Option<&str>) -> MalAnime {
        MalAnime {
            mal_id: 20,
            title: "Naruto".to_string(),
            title_english: None,
            episodes: Some(220),
            status: Some("Finished Airing".to_string()),
            score: Some(8.0),
            synopsis: None,
            duration: duration.map(String::from),
        }
    }

    #[test]
    fn duration_string_parses_to_minutes() {
        assert_eq!(anime(Some("24 min per ep")).duration_minutes(), Some(24));
        assert_eq!(anime(Some("1 hr 55 min")).duration_minutes(), Some(55));
        assert_eq!(anime(Some("Unknown")).duration_minutes(), None);
        assert_eq!(anime(None).duration_minutes(), None);
    }

    #[test]
    fn catalog_entry_keeps_the_mal_namespace() {
        let entry = anime(Some("24 min per ep")).into_catalog_entry();
        assert_eq!(entry.mal_id, Some(20));
        assert_eq!(entry.anilist_id, None);
        assert_eq!(entry.duration_minutes, Some(24));
    }
}
