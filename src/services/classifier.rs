use crate::models::episode::{
    EpisodeFlags, EpisodeKind, EpisodeRecommendation, EpisodeRecord, Recommendation,
};
use crate::services::overrides::{self, OverrideRule};

/// How much weight the raw filler flags deserve. The dedicated filler
/// database is authoritative; a general-purpose catalog's flags are
/// treated as a hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillerEvidence {
    Authoritative,
    Heuristic,
}

/// Everything title-specific the classifier needs. Carries no I/O handles;
/// classification is pure.
#[derive(Debug, Clone, Copy)]
pub struct TitleContext<'a> {
    pub title: &'a str,
    pub mal_id: Option<i64>,
    pub episode_duration_minutes: u32,
    pub evidence: FillerEvidence,
    pub overrides: &'a [OverrideRule],
}

impl<'a> TitleContext<'a> {
    #[must_use]
    pub fn new(title: &'a str, mal_id: Option<i64>) -> Self {
        Self {
            title,
            mal_id,
            episode_duration_minutes: crate::constants::guide::DEFAULT_EPISODE_DURATION_MINUTES,
            evidence: FillerEvidence::Authoritative,
            overrides: overrides::rules(),
        }
    }
}

/// Map one raw episode record to its recommendation. Deterministic:
/// override table first, then the flag heuristics, with the ambiguous
/// both-flags case resolved to the mixed bucket.
#[must_use]
pub fn classify(record: &EpisodeRecord, ctx: &TitleContext<'_>) -> EpisodeRecommendation {
    let title = record
        .title
        .clone()
        .unwrap_or_else(|| format!("Episode {}", record.number));
    let duration = ctx.episode_duration_minutes;

    if let Some(rule) = overrides::find_rule(ctx.overrides, ctx.title, ctx.mal_id, record.number) {
        let time_saved = if rule.recommendation.counts_as_watched() {
            0
        } else {
            duration
        };
        return EpisodeRecommendation {
            episode: record.number,
            title,
            kind: rule.kind,
            recommendation: rule.recommendation,
            reason: rule.reason.to_string(),
            rating: rule.rating,
            flags: rule.flags,
            time_saved_minutes: time_saved,
            aired: record.aired.clone(),
            synopsis: record.synopsis.clone(),
        };
    }

    let (kind, recommendation, reason, time_saved) = match (record.filler, record.recap) {
        (true, true) => (
            EpisodeKind::Mixed,
            Recommendation::Skip,
            "Marked both filler and recap; nothing essential here".to_string(),
            duration,
        ),
        (false, true) => (
            EpisodeKind::Recap,
            Recommendation::Skip,
            "Recap episode that repeats previously covered events".to_string(),
            duration,
        ),
        (true, false) => {
            let recommendation = match ctx.evidence {
                FillerEvidence::Authoritative => Recommendation::Skip,
                FillerEvidence::Heuristic => Recommendation::Optional,
            };
            let reason = match ctx.evidence {
                FillerEvidence::Authoritative => {
                    "Filler episode, not part of the source material".to_string()
                }
                FillerEvidence::Heuristic => {
                    "Flagged as filler by the catalog; watch if you want everything".to_string()
                }
            };
            (EpisodeKind::Filler, recommendation, reason, duration)
        }
        (false, false) => (
            EpisodeKind::Canon,
            Recommendation::Watch,
            "Canon episode, part of the main story".to_string(),
            0,
        ),
    };

    EpisodeRecommendation {
        episode: record.number,
        title,
        kind,
        recommendation,
        reason,
        rating: None,
        flags: EpisodeFlags::default(),
        time_saved_minutes: time_saved,
        aired: record.aired.clone(),
        synopsis: record.synopsis.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: u32, filler: bool, recap: bool) -> EpisodeRecord {
        EpisodeRecord {
            number,
            filler,
            recap,
            ..EpisodeRecord::new(number)
        }
    }

    #[test]
    fn unflagged_episodes_are_canon_watch() {
        let ctx = TitleContext::new("Frieren", None);
        let rec = classify(&record(1, false, false), &ctx);
        assert_eq!(rec.kind, EpisodeKind::Canon);
        assert_eq!(rec.recommendation, Recommendation::Watch);
        assert_eq!(rec.time_saved_minutes, 0);
    }

    #[test]
    fn recap_episodes_skip_and_save_the_full_runtime() {
        let ctx = TitleContext::new("Frieren", None);
        let rec = classify(&record(5, false, true), &ctx);
        assert_eq!(rec.kind, EpisodeKind::Recap);
        assert_eq!(rec.recommendation, Recommendation::Skip);
        assert_eq!(rec.time_saved_minutes, 24);
    }

    #[test]
    fn filler_skips_on_authoritative_evidence() {
        let ctx = TitleContext::new("Frieren", None);
        let rec = classify(&record(3, true, false), &ctx);
        assert_eq!(rec.kind, EpisodeKind::Filler);
        assert_eq!(rec.recommendation, Recommendation::Skip);
    }

    #[test]
    fn filler_is_optional_on_heuristic_evidence() {
        let ctx = TitleContext {
            evidence: FillerEvidence::Heuristic,
            ..TitleContext::new("Frieren", None)
        };
        let rec = classify(&record(3, true, false), &ctx);
        assert_eq!(rec.kind, EpisodeKind::Filler);
        assert_eq!(rec.recommendation, Recommendation::Optional);
        assert_eq!(rec.time_saved_minutes, 24);
    }

    #[test]
    fn both_flags_resolve_to_mixed_skip() {
        let ctx = TitleContext::new("Frieren", None);
        let rec = classify(&record(9, true, true), &ctx);
        assert_eq!(rec.kind, EpisodeKind::Mixed);
        assert_eq!(rec.recommendation, Recommendation::Skip);
    }

    #[test]
    fn override_range_wins_over_the_filler_flag() {
        let ctx = TitleContext::new("One Piece", Some(21));
        let rec = classify(&record(200, true, false), &ctx);
        assert_eq!(rec.recommendation, Recommendation::Recommended);
        assert!(rec.reason.contains("G-8"));
        assert!(rec.flags.funny);
        assert_eq!(rec.rating, Some(8.1));
        // Recommended episodes are watched, so nothing is saved.
        assert_eq!(rec.time_saved_minutes, 0);
    }

    #[test]
    fn override_applies_even_when_the_provider_missed_the_flag() {
        let ctx = TitleContext::new("One Piece", Some(21));
        let rec = classify(&record(199, false, false), &ctx);
        assert_eq!(rec.kind, EpisodeKind::Filler);
        assert_eq!(rec.recommendation, Recommendation::Recommended);
    }

    #[test]
    fn custom_duration_feeds_time_saved() {
        let ctx = TitleContext {
            episode_duration_minutes: 45,
            ..TitleContext::new("Some OVA", None)
        };
        let rec = classify(&record(2, false, true), &ctx);
        assert_eq!(rec.time_saved_minutes, 45);
    }

    #[test]
    fn classification_is_deterministic() {
        let ctx = TitleContext::new("Naruto", Some(20));
        let a = classify(&record(101, true, false), &ctx);
        let b = classify(&record(101, true, false), &ctx);
        assert_eq!(a.recommendation, b.recommendation);
        assert_eq!(a.reason, b.reason);
    }

    #[test]
    fn missing_titles_get_a_synthetic_one() {
        let ctx = TitleContext::new("Frieren", None);
        let rec = classify(&record(7, false, false), &ctx);
        assert_eq!(rec.title, "Episode 7");
    }
}
