use reqwest::Client;
use serde::Deserialize;

use super::governor::FetchError;
use crate::models::episode::EpisodeRecord;

const FILLER_LIST_API: &str = "https://www.animefillerlist.com/api/v1";

#[derive(Debug, Deserialize)]
struct ShowSearchResponse {
    shows: Vec<FillerShow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillerShow {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ShowResponse {
    episodes: Vec<FillerEpisode>,
}

#[derive(Debug, Deserialize)]
pub struct FillerEpisode {
    pub number: u32,
    /// One of "Manga Canon", "Anime Canon", "Mixed Canon/Filler", "Filler".
    #[serde(rename = "type")]
    pub kind: String,
}

impl FillerEpisode {
    /// Map the provider's episode type onto the raw record booleans.
    /// "Mixed Canon/Filler" sets both so the downstream classification
    /// lands on the ambiguous bucket rather than silently picking a side.
    #[must_use]
    pub fn into_record(self) -> EpisodeRecord {
        let kind = self.kind.to_lowercase();
        let mixed = kind.contains("mixed");
        let filler = mixed || (kind.contains("filler") && !kind.contains("canon"));
        let recap = mixed;
        EpisodeRecord {
            number: self.number,
            title: None,
            filler,
            recap,
            synopsis: None,
            aired: None,
        }
    }
}

/// Third-party filler classification provider. Two-step lookup: fuzzy
/// name search for candidate slugs, then fetch of the slug's episode
/// type list.
#[derive(Clone)]
pub struct FillerListClient {
    client: Client,
}

impl Default for FillerListClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl FillerListClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Candidate shows for a fuzzy title. An empty candidate list is a
    /// normal answer, not a failure.
    pub async fn search_shows(&self, name: &str) -> Result<Vec<FillerShow>, FetchError> {
        let url = format!(
            "{FILLER_LIST_API}/shows?name={}",
            urlencoding::encode(name)
        );
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: ShowSearchResponse = response.json().await?;
        Ok(payload.shows)
    }

    /// Episode type list for one show slug. A slug the provider no longer
    /// knows yields an empty list.
    pub async fn get_show(&self, slug: &str) -> Result<Vec<FillerEpisode>, FetchError> {
        let url = format!("{FILLER_LIST_API}/shows/{slug}");
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: ShowResponse = response.json().await?;
        Ok(payload.episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(kind: &str) -> FillerEpisode {
        FillerEpisode {
            number: 1,
            kind: kind.to_string(),
        }
    }

    #[test]
    fn canon_kinds_clear_both_flags() {
        for kind in ["manga canon", "anime canon", "Manga Canon"] {
            let record = episode(kind).into_record();
            assert!(!record.filler);
            assert!(!record.recap);
        }
    }

    #[test]
    fn filler_sets_only_the_filler_flag() {
        let record = episode("filler").into_record();
        assert!(record.filler);
        assert!(!record.recap);
    }

    #[test]
    fn mixed_sets_both_flags() {
        for kind in ["mixed", "Mixed Canon/Filler"] {
            let record = episode(kind).into_record();
            assert!(record.filler);
            assert!(record.recap);
        }
    }
}
