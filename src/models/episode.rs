use serde::{Deserialize, Serialize};

/// A raw episode row from whichever provider answered. Discarded after
/// classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub number: u32,
    pub title: Option<String>,
    pub filler: bool,
    pub recap: bool,
    pub synopsis: Option<String>,
    pub aired: Option<String>,
}

impl EpisodeRecord {
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeKind {
    Canon,
    Filler,
    Recap,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Watch,
    Skip,
    Optional,
    Recommended,
}

impl Recommendation {
    /// Whether a viewer following the guide sits through this episode.
    #[must_use]
    pub const fn counts_as_watched(self) -> bool {
        matches!(self, Self::Watch | Self::Recommended)
    }
}

/// Qualitative markers carried by curated override rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeFlags {
    pub funny: bool,
    pub important: bool,
    pub character_development: bool,
    pub world_building: bool,
}

/// The derived, immutable verdict for one episode. Computed once per guide
/// generation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecommendation {
    pub episode: u32,
    pub title: String,
    pub kind: EpisodeKind,
    pub recommendation: Recommendation,
    pub reason: String,
    pub rating: Option<f32>,
    pub flags: EpisodeFlags,
    pub time_saved_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aired: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}
