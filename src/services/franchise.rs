use crate::models::guide::{FranchiseWatchGuide, GuideStats, WatchGuide};
use crate::services::catalog::Franchise;

/// Compose already-built member guides (in watch order) into one
/// franchise guide. Combined stats are the element-wise sum of the
/// members'; the watch-order steps are derived from the guides themselves.
#[must_use]
pub fn build_franchise_guide(franchise: &Franchise, guides: Vec<WatchGuide>) -> FranchiseWatchGuide {
    let combined_stats = guides
        .iter()
        .fold(GuideStats::default(), |acc, g| acc.combine(g.stats));

    let watch_order: Vec<String> = guides
        .iter()
        .enumerate()
        .map(|(i, g)| {
            format!(
                "{}. {} ({} episodes, watch {} / skip {})",
                i + 1,
                g.identity.title,
                g.total_episodes,
                g.total_episodes - g.stats.filler - g.stats.recap - g.stats.mixed,
                g.stats.filler + g.stats.recap + g.stats.mixed,
            )
        })
        .collect();

    let hours = (f64::from(combined_stats.time_saved_minutes) / 60.0).round() as u32;
    let description = format!(
        "The {} franchise spans {} series and {} episodes. Following this guide skips \
         {} filler/recap episodes and saves about {} hours.",
        franchise.name,
        guides.len(),
        combined_stats.total,
        combined_stats.filler + combined_stats.recap + combined_stats.mixed,
        hours,
    );

    FranchiseWatchGuide {
        franchise_name: franchise.name.to_string(),
        description,
        watch_order,
        total_episodes: combined_stats.total,
        combined_stats,
        anime_guides: guides,
        special_instructions: franchise.special_instructions.map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::anime::AnimeIdentity;
    use crate::models::episode::EpisodeRecord;
    use crate::services::catalog;
    use crate::services::guide::{GuideOptions, build_guide};

    fn member_guide(title: &str, episodes: u32, filler: &[u32]) -> WatchGuide {
        let records = (1..=episodes)
            .map(|n| EpisodeRecord {
                filler: filler.contains(&n),
                ..EpisodeRecord::new(n)
            })
            .collect();
        build_guide(
            AnimeIdentity::from_title(title),
            records,
            GuideOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn combined_stats_are_the_elementwise_sum() {
        let franchise = catalog::find("naruto").unwrap();
        let guides = vec![
            member_guide("Naruto", 10, &[3, 7]),
            member_guide("Naruto Shippuden", 20, &[1]),
        ];

        let combined = build_franchise_guide(franchise, guides);

        assert_eq!(combined.total_episodes, 30);
        assert_eq!(combined.combined_stats.total, 30);
        assert_eq!(combined.combined_stats.filler, 3);
        assert_eq!(combined.combined_stats.canon, 27);
        assert_eq!(combined.combined_stats.time_saved_minutes, 3 * 24);
    }

    #[test]
    fn watch_order_steps_follow_guide_order() {
        let franchise = catalog::find("naruto").unwrap();
        let guides = vec![
            member_guide("Naruto", 5, &[]),
            member_guide("Naruto Shippuden", 5, &[]),
        ];

        let combined = build_franchise_guide(franchise, guides);

        assert_eq!(combined.watch_order.len(), 2);
        assert!(combined.watch_order[0].starts_with("1. Naruto"));
        assert!(combined.watch_order[1].starts_with("2. Naruto Shippuden"));
    }

    #[test]
    fn special_instructions_come_from_the_curated_table() {
        let franchise = catalog::find("bleach").unwrap();
        let combined = build_franchise_guide(franchise, vec![member_guide("Bleach", 3, &[])]);

        assert!(
            combined
                .special_instructions
                .unwrap()
                .contains("Thousand-Year Blood War")
        );
    }
}
