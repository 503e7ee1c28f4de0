use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::governor::FetchError;
use crate::models::anime::CatalogEntry;

const ANILIST_API: &str = "https://graphql.anilist.co";

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: SearchVariables<'a>,
}

#[derive(Serialize)]
struct SearchVariables<'a> {
    search: &'a str,
}

#[derive(Deserialize)]
struct GraphQLResponse {
    data: Option<PageData>,
}

#[derive(Deserialize)]
struct PageData {
    #[serde(rename = "Page")]
    page: Page,
}

#[derive(Deserialize)]
struct Page {
    media: Vec<Media>,
}

#[derive(Deserialize)]
struct Media {
    id: i64,
    title: Title,
    episodes: Option<u32>,
    status: Option<String>,
    duration: Option<u32>,
    #[serde(rename = "averageScore")]
    average_score: Option<i32>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct Title {
    romaji: Option<String>,
    english: Option<String>,
}

/// GraphQL catalog provider. Catalog lookups only; episode-level data
/// comes from the other providers.
#[derive(Clone)]
pub struct AnilistClient {
    client: Client,
}

impl Default for AnilistClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl AnilistClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn search_titles(&self, query: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        let gql_query = r"
            query ($search: String) {
                Page(page: 1, perPage: 10) {
                    media(search: $search, type: ANIME) {
                        id
                        title { romaji english }
                        episodes
                        status
                        duration
                        averageScore
                        description(asHtml: false)
                    }
                }
            }
        ";

        let request_body = GraphQLRequest {
            query: gql_query,
            variables: SearchVariables { search: query },
        };

        let response = self
            .client
            .post(ANILIST_API)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: GraphQLResponse = response.json().await?;

        Ok(payload
            .data
            .map(|d| d.page.media.into_iter().map(map_media).collect())
            .unwrap_or_default())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<CatalogEntry>, FetchError> {
        let gql_query = r"
            query ($id: Int) {
                Media(id: $id, type: ANIME) {
                    id
                    title { romaji english }
                    episodes
                    status
                    duration
                    averageScore
                    description(asHtml: false)
                }
            }
        ";

        #[derive(Serialize)]
        struct IdVariables {
            id: i64,
        }

        #[derive(Serialize)]
        struct IdRequest<'a> {
            query: &'a str,
            variables: IdVariables,
        }

        #[derive(Deserialize)]
        struct IdResponse {
            data: Option<MediaWrapper>,
        }

        #[derive(Deserialize)]
        struct MediaWrapper {
            #[serde(rename = "Media")]
            media: Option<Media>,
        }

        let request_body = IdRequest {
            query: gql_query,
            variables: IdVariables { id },
        };

        let response = self
            .client
            .post(ANILIST_API)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status()));
        }

        let payload: IdResponse = response.json().await?;

        Ok(payload.data.and_then(|d| d.media).map(map_media))
    }
}

fn map_media(m: Media) -> CatalogEntry {
    CatalogEntry {
        anilist_id: Some(m.id),
        mal_id: None,
        title: m.title.romaji.or(m.title.english.clone()).unwrap_or_default(),
        title_english: m.title.english,
        episode_count: m.episodes,
        status: m.status,
        score: m.average_score.map(|s| s as f32 / 10.0),
        duration_minutes: m.duration,
        synopsis: m.description,
    }
}
