use std::collections::HashSet;

/// Score above which two titles are considered the same show.
pub const MATCH_THRESHOLD: f32 = 0.5;

/// Confidence that `query` refers to `candidate`, in `0.0..=1.0`.
/// Identity resolution across the unrelated provider id namespaces is
/// title-based and heuristic, so this never claims exactness: a score of
/// 1.0 only means the normalized strings are equal.
#[must_use]
pub fn title_score(query: &str, candidate: &str) -> f32 {
    let q = normalize(query);
    let c = normalize(candidate);

    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    if q == c {
        return 1.0;
    }

    // Containment in either direction, weighted by how much of the longer
    // string is covered.
    if q.contains(&c) || c.contains(&q) {
        let (short, long) = if q.len() < c.len() { (&q, &c) } else { (&c, &q) };
        return 0.6 + 0.4 * (short.len() as f32 / long.len() as f32);
    }

    0.6 * token_overlap(&q, &c)
}

#[must_use]
pub fn is_title_match(query: &str, candidate: &str) -> bool {
    title_score(query, candidate) >= MATCH_THRESHOLD
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn token_overlap(a: &str, b: &str) -> f32 {
    let a_tokens: HashSet<&str> = a.split_whitespace().collect();
    let b_tokens: HashSet<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let shared = a_tokens.intersection(&b_tokens).count();
    let union = a_tokens.union(&b_tokens).count();
    shared as f32 / union as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_full_confidence() {
        assert!((title_score("Naruto", "naruto") - 1.0).abs() < f32::EPSILON);
        assert!((title_score("  Naruto ", "NARUTO") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn containment_matches_in_both_directions() {
        assert!(is_title_match("naruto", "Naruto Shippuden"));
        assert!(is_title_match("Naruto Shippuden", "shippuden"));
    }

    #[test]
    fn longer_coverage_scores_higher() {
        let close = title_score("naruto shippuden", "Naruto Shippuuden: Specials");
        let loose = title_score("naruto", "Naruto Shippuuden: Specials");
        assert!(close > loose);
    }

    #[test]
    fn shared_tokens_count_without_containment() {
        let score = title_score(
            "attack on titan final season",
            "Shingeki no Kyojin: Final Season",
        );
        assert!(score > 0.0);
        assert!(score < 0.6);
    }

    #[test]
    fn unrelated_titles_do_not_match() {
        assert!(!is_title_match("frieren", "One Piece"));
        assert!(title_score("frieren", "One Piece") < 0.1);
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!is_title_match("", "Naruto"));
        assert!(!is_title_match("naruto", "   "));
    }
}
