use crate::models::episode::{EpisodeFlags, EpisodeKind, Recommendation};

/// A curated exception for a known episode range, typically a filler arc
/// with a reputation worth preserving. Applied verbatim by the classifier
/// ahead of every heuristic.
#[derive(Debug, Clone, Copy)]
pub struct OverrideRule {
    pub mal_id: i64,
    /// Lowercase fragment matched against the title when the id namespaces
    /// do not line up.
    pub title_key: &'static str,
    pub first_episode: u32,
    pub last_episode: u32,
    pub kind: EpisodeKind,
    pub recommendation: Recommendation,
    pub reason: &'static str,
    pub rating: Option<f32>,
    pub flags: EpisodeFlags,
}

impl OverrideRule {
    #[must_use]
    pub fn applies_to(&self, title: &str, mal_id: Option<i64>, episode: u32) -> bool {
        if episode < self.first_episode || episode > self.last_episode {
            return false;
        }
        match mal_id {
            Some(id) => id == self.mal_id,
            None => title.to_lowercase().contains(self.title_key),
        }
    }
}

static RULES: &[OverrideRule] = &[
    OverrideRule {
        mal_id: 21,
        title_key: "one piece",
        first_episode: 196,
        last_episode: 206,
        kind: EpisodeKind::Filler,
        recommendation: Recommendation::Recommended,
        reason: "G-8 arc: anime-original, but widely considered the best filler arc in the series and worth the detour",
        rating: Some(8.1),
        flags: EpisodeFlags {
            funny: true,
            important: false,
            character_development: true,
            world_building: false,
        },
    },
    OverrideRule {
        mal_id: 20,
        title_key: "naruto",
        first_episode: 101,
        last_episode: 101,
        kind: EpisodeKind::Filler,
        recommendation: Recommendation::Optional,
        reason: "Fan-favorite comedy episode about Kakashi's face; pure filler but a good time",
        rating: Some(7.4),
        flags: EpisodeFlags {
            funny: true,
            important: false,
            character_development: false,
            world_building: false,
        },
    },
    OverrideRule {
        mal_id: 1735,
        title_key: "shippuden",
        first_episode: 349,
        last_episode: 361,
        kind: EpisodeKind::Filler,
        recommendation: Recommendation::Recommended,
        reason: "Kakashi ANBU arc: anime-original backstory that deepens several main characters",
        rating: Some(7.8),
        flags: EpisodeFlags {
            funny: false,
            important: false,
            character_development: true,
            world_building: true,
        },
    },
    OverrideRule {
        mal_id: 269,
        title_key: "bleach",
        first_episode: 287,
        last_episode: 287,
        kind: EpisodeKind::Filler,
        recommendation: Recommendation::Optional,
        reason: "Standalone comedy episode; skippable but well liked",
        rating: None,
        flags: EpisodeFlags {
            funny: true,
            important: false,
            character_development: false,
            world_building: false,
        },
    },
];

#[must_use]
pub fn rules() -> &'static [OverrideRule] {
    RULES
}

/// First rule matching the (title, id, episode) triple, if any. Rules are
/// curated not to overlap.
#[must_use]
pub fn find_rule<'a>(
    rules: &'a [OverrideRule],
    title: &str,
    mal_id: Option<i64>,
    episode: u32,
) -> Option<&'a OverrideRule> {
    rules.iter().find(|r| r.applies_to(title, mal_id, episode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_id_inside_the_range() {
        let rule = find_rule(rules(), "One Piece", Some(21), 200).unwrap();
        assert_eq!(rule.recommendation, Recommendation::Recommended);
        assert!(rule.reason.contains("G-8"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(find_rule(rules(), "One Piece", Some(21), 196).is_some());
        assert!(find_rule(rules(), "One Piece", Some(21), 206).is_some());
        assert!(find_rule(rules(), "One Piece", Some(21), 195).is_none());
        assert!(find_rule(rules(), "One Piece", Some(21), 207).is_none());
    }

    #[test]
    fn falls_back_to_title_matching_without_an_id() {
        assert!(find_rule(rules(), "Naruto Shippuden", None, 350).is_some());
        assert!(find_rule(rules(), "Naruto", None, 350).is_none());
    }

    #[test]
    fn a_known_id_never_matches_another_shows_rule() {
        assert!(find_rule(rules(), "One Piece", Some(999), 200).is_none());
    }
}
