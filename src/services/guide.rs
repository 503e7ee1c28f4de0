use tracing::debug;

use crate::models::anime::AnimeIdentity;
use crate::models::episode::{EpisodeKind, EpisodeRecord};
use crate::models::guide::{GuideStats, WatchGuide};
use crate::services::classifier::{self, FillerEvidence, TitleContext};
use crate::services::overrides;

#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("no episodes available for {title}")]
    NoEpisodes { title: String },
}

/// Per-guide knobs the orchestrator resolves before assembly.
#[derive(Debug, Clone, Copy)]
pub struct GuideOptions {
    pub episode_duration_minutes: u32,
    pub evidence: FillerEvidence,
}

impl Default for GuideOptions {
    fn default() -> Self {
        Self {
            episode_duration_minutes: crate::constants::guide::DEFAULT_EPISODE_DURATION_MINUTES,
            evidence: FillerEvidence::Authoritative,
        }
    }
}

/// Classify every record and fold the results into one guide.
///
/// Records are re-sorted by episode number first, so the output order
/// never depends on the order upstream pages arrived; duplicate numbers
/// keep the first occurrence.
pub fn build_guide(
    identity: AnimeIdentity,
    mut records: Vec<EpisodeRecord>,
    options: GuideOptions,
) -> Result<WatchGuide, GuideError> {
    if records.is_empty() {
        return Err(GuideError::NoEpisodes {
            title: identity.title,
        });
    }

    records.sort_by_key(|r| r.number);
    records.dedup_by_key(|r| r.number);

    let ctx = TitleContext {
        title: &identity.title,
        mal_id: identity.mal_id,
        episode_duration_minutes: options.episode_duration_minutes,
        evidence: options.evidence,
        overrides: overrides::rules(),
    };

    let recommendations: Vec<_> = records.iter().map(|r| classifier::classify(r, &ctx)).collect();

    let mut stats = GuideStats {
        total: recommendations.len() as u32,
        ..GuideStats::default()
    };

    let mut watched = 0u32;
    for rec in &recommendations {
        match rec.kind {
            EpisodeKind::Canon => stats.canon += 1,
            EpisodeKind::Filler => stats.filler += 1,
            EpisodeKind::Recap => stats.recap += 1,
            EpisodeKind::Mixed => stats.mixed += 1,
        }
        stats.time_saved_minutes += rec.time_saved_minutes;
        if rec.recommendation.counts_as_watched() {
            watched += 1;
        }
    }
    stats.watch_time_minutes = watched * options.episode_duration_minutes;

    let description = describe(&identity.title, &stats, watched);
    debug!(
        title = %identity.title,
        total = stats.total,
        canon = stats.canon,
        "assembled watch guide"
    );

    Ok(WatchGuide {
        identity,
        description,
        total_episodes: stats.total,
        stats,
        recommendations,
        generated_at: chrono::Utc::now(),
    })
}

fn describe(title: &str, stats: &GuideStats, watched: u32) -> String {
    let skippable = stats.total - watched;
    let hours = (f64::from(stats.time_saved_minutes) / 60.0).round() as u32;

    format!(
        "Watch {watched} essential episodes of {title}, skip {skippable} filler/recap \
         episodes, and save about {hours} hours of viewing time."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::episode::Recommendation;

    fn record(number: u32, filler: bool, recap: bool) -> EpisodeRecord {
        EpisodeRecord {
            number,
            filler,
            recap,
            ..EpisodeRecord::new(number)
        }
    }

    fn plain_identity(title: &str) -> AnimeIdentity {
        AnimeIdentity::from_title(title)
    }

    #[test]
    fn eight_episode_guide_counts_every_kind() {
        // Filler at 3 and 7, a recap at 5, canon everywhere else.
        let records = (1..=8)
            .map(|n| record(n, n == 3 || n == 7, n == 5))
            .collect();

        let guide =
            build_guide(plain_identity("Test Show"), records, GuideOptions::default()).unwrap();

        assert_eq!(guide.stats.total, 8);
        assert_eq!(guide.stats.canon, 5);
        assert_eq!(guide.stats.filler, 2);
        assert_eq!(guide.stats.recap, 1);
        assert_eq!(guide.stats.mixed, 0);
        assert_eq!(guide.stats.time_saved_minutes, 72);
        assert_eq!(guide.stats.watch_time_minutes, 5 * 24);
    }

    #[test]
    fn empty_input_is_a_typed_error() {
        let err = build_guide(plain_identity("Nothing Yet"), Vec::new(), GuideOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("no episodes available"));
        assert!(err.to_string().contains("Nothing Yet"));
    }

    #[test]
    fn recommendations_are_episode_ordered_regardless_of_input_order() {
        let records = vec![record(8, false, false), record(1, false, false), record(4, true, false)];
        let guide =
            build_guide(plain_identity("Shuffled"), records, GuideOptions::default()).unwrap();

        let numbers: Vec<u32> = guide.recommendations.iter().map(|r| r.episode).collect();
        assert_eq!(numbers, vec![1, 4, 8]);
    }

    #[test]
    fn duplicate_episode_numbers_keep_the_first_record() {
        let records = vec![
            EpisodeRecord {
                title: Some("first".to_string()),
                ..record(2, false, false)
            },
            EpisodeRecord {
                title: Some("second".to_string()),
                ..record(2, true, false)
            },
            record(1, false, false),
        ];

        let guide = build_guide(plain_identity("Dup"), records, GuideOptions::default()).unwrap();
        assert_eq!(guide.stats.total, 2);
        assert_eq!(guide.recommendations[1].title, "first");
    }

    #[test]
    fn description_interpolates_counts_and_hours() {
        let records = (1..=10).map(|n| record(n, n > 5, false)).collect();
        let guide = build_guide(plain_identity("Talky"), records, GuideOptions::default()).unwrap();

        assert!(guide.description.contains("Watch 5 essential episodes"));
        assert!(guide.description.contains("skip 5 filler/recap episodes"));
        // 5 * 24 = 120 minutes = 2 hours.
        assert!(guide.description.contains("about 2 hours"));
    }

    #[test]
    fn all_canon_guides_save_nothing() {
        let records = (1..=12).map(|n| record(n, false, false)).collect();
        let guide = build_guide(plain_identity("Pure"), records, GuideOptions::default()).unwrap();

        assert_eq!(guide.stats.time_saved_minutes, 0);
        assert!(
            guide
                .recommendations
                .iter()
                .all(|r| r.recommendation == Recommendation::Watch)
        );
    }
}
