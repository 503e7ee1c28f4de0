use serde::{Deserialize, Serialize};

use super::anime::AnimeIdentity;
use super::episode::EpisodeRecommendation;

/// Per-kind counts and the time accounting for one guide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideStats {
    pub total: u32,
    pub canon: u32,
    pub filler: u32,
    pub recap: u32,
    pub mixed: u32,
    pub time_saved_minutes: u32,
    pub watch_time_minutes: u32,
}

impl GuideStats {
    /// Element-wise sum, used when combining franchise members.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            canon: self.canon + other.canon,
            filler: self.filler + other.filler,
            recap: self.recap + other.recap,
            mixed: self.mixed + other.mixed,
            time_saved_minutes: self.time_saved_minutes + other.time_saved_minutes,
            watch_time_minutes: self.watch_time_minutes + other.watch_time_minutes,
        }
    }
}

/// The structured watch/skip output for one title. Recommendations are
/// always in ascending episode order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchGuide {
    pub identity: AnimeIdentity,
    pub description: String,
    pub total_episodes: u32,
    pub stats: GuideStats,
    pub recommendations: Vec<EpisodeRecommendation>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Several single-title guides composed into one ordered franchise guide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FranchiseWatchGuide {
    pub franchise_name: String,
    pub description: String,
    pub watch_order: Vec<String>,
    pub total_episodes: u32,
    pub combined_stats: GuideStats,
    pub anime_guides: Vec<WatchGuide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}
