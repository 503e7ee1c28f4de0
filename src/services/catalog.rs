use crate::models::anime::AnimeIdentity;
use crate::services::matching;

/// One series inside a franchise. `episode_count` is the curated fallback
/// used when every provider is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct FranchiseMember {
    pub title: &'static str,
    pub mal_id: i64,
    pub watch_order: u32,
    pub episode_count: u32,
}

impl FranchiseMember {
    #[must_use]
    pub fn identity(&self, franchise: &Franchise) -> AnimeIdentity {
        AnimeIdentity {
            anilist_id: None,
            mal_id: Some(self.mal_id),
            title: self.title.to_string(),
            franchise: Some(franchise.name.to_string()),
        }
    }
}

/// A curated, intentionally incomplete set of related titles meant to be
/// watched together in a declared order.
#[derive(Debug, Clone, Copy)]
pub struct Franchise {
    pub name: &'static str,
    pub members: &'static [FranchiseMember],
    pub special_instructions: Option<&'static str>,
}

impl Franchise {
    /// Members in declared watch order.
    #[must_use]
    pub fn ordered_members(&self) -> Vec<FranchiseMember> {
        let mut members = self.members.to_vec();
        members.sort_by_key(|m| m.watch_order);
        members
    }
}

static FRANCHISES: &[Franchise] = &[
    Franchise {
        name: "Naruto",
        members: &[
            FranchiseMember {
                title: "Naruto",
                mal_id: 20,
                watch_order: 1,
                episode_count: 220,
            },
            FranchiseMember {
                title: "Naruto Shippuden",
                mal_id: 1735,
                watch_order: 2,
                episode_count: 500,
            },
            FranchiseMember {
                title: "Boruto: Naruto Next Generations",
                mal_id: 34566,
                watch_order: 3,
                episode_count: 293,
            },
        ],
        special_instructions: Some(
            "Finish Naruto before starting Shippuden; the timeskip assumes it. \
             Boruto is a next-generation sequel and entirely optional.",
        ),
    },
    Franchise {
        name: "Dragon Ball",
        members: &[
            FranchiseMember {
                title: "Dragon Ball",
                mal_id: 223,
                watch_order: 1,
                episode_count: 153,
            },
            FranchiseMember {
                title: "Dragon Ball Z",
                mal_id: 813,
                watch_order: 2,
                episode_count: 291,
            },
            FranchiseMember {
                title: "Dragon Ball GT",
                mal_id: 225,
                watch_order: 3,
                episode_count: 64,
            },
            FranchiseMember {
                title: "Dragon Ball Super",
                mal_id: 30694,
                watch_order: 4,
                episode_count: 131,
            },
        ],
        special_instructions: Some(
            "GT and Super are alternate continuations of Z: Super is the canonical one, \
             so skip GT unless you want everything. Kai is a tighter re-cut of Z and can \
             replace it wholesale.",
        ),
    },
    Franchise {
        name: "Bleach",
        members: &[
            FranchiseMember {
                title: "Bleach",
                mal_id: 269,
                watch_order: 1,
                episode_count: 366,
            },
            FranchiseMember {
                title: "Bleach: Thousand-Year Blood War",
                mal_id: 41467,
                watch_order: 2,
                episode_count: 13,
            },
        ],
        special_instructions: Some(
            "Thousand-Year Blood War continues directly from episode 366 and supersedes \
             the original 2012 ending.",
        ),
    },
];

#[must_use]
pub fn all() -> &'static [Franchise] {
    FRANCHISES
}

/// Franchise whose name the query refers to, by case-insensitive
/// containment in either direction.
#[must_use]
pub fn find(query: &str) -> Option<&'static Franchise> {
    FRANCHISES
        .iter()
        .find(|f| matching::is_title_match(query, f.name))
}

/// Franchise owning a member title the query refers to. The best-scoring
/// member across all franchises wins, so "shippuden" lands on Naruto.
#[must_use]
pub fn find_by_member_title(query: &str) -> Option<&'static Franchise> {
    FRANCHISES
        .iter()
        .flat_map(|f| f.members.iter().map(move |m| (f, m)))
        .map(|(f, m)| (f, matching::title_score(query, m.title)))
        .filter(|(_, score)| *score >= matching::MATCH_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(f, _)| f)
}

/// Curated episode count for an identity, used as the last-resort source
/// when providers are down.
#[must_use]
pub fn fallback_episode_count(identity: &AnimeIdentity) -> Option<u32> {
    if let Some(mal_id) = identity.mal_id
        && let Some(member) = FRANCHISES
            .iter()
            .flat_map(|f| f.members.iter())
            .find(|m| m.mal_id == mal_id)
    {
        return Some(member.episode_count);
    }

    FRANCHISES
        .iter()
        .flat_map(|f| f.members.iter())
        .map(|m| (m, matching::title_score(&identity.title, m.title)))
        .filter(|(_, score)| *score >= matching::MATCH_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(m, _)| m.episode_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn franchise_lookup_is_case_insensitive_containment() {
        assert_eq!(find("naruto").unwrap().name, "Naruto");
        assert_eq!(find("DRAGON BALL").unwrap().name, "Dragon Ball");
        assert!(find("frieren").is_none());
    }

    #[test]
    fn member_titles_resolve_to_their_franchise() {
        assert_eq!(find_by_member_title("shippuden").unwrap().name, "Naruto");
        assert_eq!(
            find_by_member_title("thousand-year blood war").unwrap().name,
            "Bleach"
        );
    }

    #[test]
    fn ordered_members_follow_the_declared_watch_order() {
        let orders: Vec<u32> = find("dragon ball")
            .unwrap()
            .ordered_members()
            .iter()
            .map(|m| m.watch_order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn fallback_counts_match_by_id_first() {
        let identity = AnimeIdentity {
            mal_id: Some(1735),
            title: "completely wrong title".to_string(),
            ..AnimeIdentity::default()
        };
        assert_eq!(fallback_episode_count(&identity), Some(500));
    }

    #[test]
    fn fallback_counts_match_by_title_without_an_id() {
        let identity = AnimeIdentity::from_title("Dragon Ball GT");
        assert_eq!(fallback_episode_count(&identity), Some(64));
    }

    #[test]
    fn unknown_titles_have_no_fallback() {
        let identity = AnimeIdentity::from_title("Frieren");
        assert_eq!(fallback_episode_count(&identity), None);
    }
}
