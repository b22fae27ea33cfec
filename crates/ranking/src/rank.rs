//! Listing order for the front page

use crate::paper::PaperRecord;
use crate::score::ScoringWeights;
use crate::RankingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How a paper listing is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    /// Time-decayed popularity
    Hot,
    /// Most votes, newer first on ties
    Top,
    /// Newest, more votes first on ties
    #[default]
    New,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::Hot => "hot",
            SortStrategy::Top => "top",
            SortStrategy::New => "new",
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(SortStrategy::Hot),
            "top" => Ok(SortStrategy::Top),
            "new" => Ok(SortStrategy::New),
            other => Err(RankingError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Order `candidates` by `strategy` using the default weights
pub fn rank_papers(
    candidates: Vec<PaperRecord>,
    strategy: SortStrategy,
    now: DateTime<Utc>,
) -> Vec<PaperRecord> {
    rank_papers_with(candidates, strategy, now, &ScoringWeights::DEFAULT)
}

/// Order `candidates` by `strategy`
///
/// The sort is stable: papers that tie on every key keep their input order.
pub fn rank_papers_with(
    mut candidates: Vec<PaperRecord>,
    strategy: SortStrategy,
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> Vec<PaperRecord> {
    match strategy {
        SortStrategy::Hot => {
            let mut keyed: Vec<(f64, PaperRecord)> = candidates
                .into_iter()
                .map(|paper| (weights.hotness(paper.vote_count, paper.age_hours(now)), paper))
                .collect();
            keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
            keyed.into_iter().map(|(_, paper)| paper).collect()
        }
        SortStrategy::Top => {
            candidates.sort_by(by_votes_then_newest);
            candidates
        }
        SortStrategy::New => {
            candidates.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.vote_count.cmp(&a.vote_count))
            });
            candidates
        }
    }
}

pub(crate) fn by_votes_then_newest(a: &PaperRecord, b: &PaperRecord) -> Ordering {
    b.vote_count
        .cmp(&a.vote_count)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::fixtures::{ids, now, paper};
    use rand::Rng;

    fn random_pool(size: usize) -> Vec<PaperRecord> {
        let mut rng = rand::thread_rng();
        (0..size)
            .map(|i| {
                // Narrow ranges so ties are common
                paper(i as u128, rng.gen_range(0..6), rng.gen_range(-2..4), &[], None)
            })
            .collect()
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("hot".parse::<SortStrategy>(), Ok(SortStrategy::Hot));
        assert_eq!(" TOP ".parse::<SortStrategy>(), Ok(SortStrategy::Top));
        assert_eq!("new".parse::<SortStrategy>(), Ok(SortStrategy::New));
        assert_eq!(
            "best".parse::<SortStrategy>(),
            Err(RankingError::UnknownStrategy("best".to_string()))
        );
        assert_eq!(SortStrategy::default(), SortStrategy::New);
    }

    #[test]
    fn test_hot_prefers_recent_activity() {
        let pool = vec![
            paper(1, 24 * 30, 100, &[], None), // old and popular
            paper(2, 1, 5, &[], None),         // fresh with some votes
            paper(3, 1, 0, &[], None),         // fresh, no votes
        ];
        assert_eq!(ids(&rank_papers(pool, SortStrategy::Hot, now())), vec![2, 3, 1]);
    }

    #[test]
    fn test_top_orders_by_votes_then_newest() {
        let pool = vec![
            paper(1, 10, 3, &[], None),
            paper(2, 5, 3, &[], None),
            paper(3, 1, 7, &[], None),
            paper(4, 2, -1, &[], None),
        ];
        assert_eq!(ids(&rank_papers(pool, SortStrategy::Top, now())), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_new_orders_by_time_then_votes() {
        let pool = vec![
            paper(1, 3, 0, &[], None),
            paper(2, 1, 0, &[], None),
            paper(3, 1, 9, &[], None),
            paper(4, 8, 50, &[], None),
        ];
        assert_eq!(ids(&rank_papers(pool, SortStrategy::New, now())), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_exact_ties_keep_input_order() {
        let pool = vec![
            paper(5, 2, 1, &[], None),
            paper(2, 2, 1, &[], None),
            paper(9, 2, 1, &[], None),
        ];
        for strategy in [SortStrategy::Hot, SortStrategy::Top, SortStrategy::New] {
            assert_eq!(ids(&rank_papers(pool.clone(), strategy, now())), vec![5, 2, 9]);
        }
    }

    #[test]
    fn test_random_pools_top_sorted() {
        for _ in 0..100 {
            let ranked = rank_papers(random_pool(25), SortStrategy::Top, now());
            for pair in ranked.windows(2) {
                assert!(pair[0].vote_count >= pair[1].vote_count);
                if pair[0].vote_count == pair[1].vote_count {
                    assert!(pair[0].created_at >= pair[1].created_at);
                }
            }
        }
    }

    #[test]
    fn test_random_pools_new_sorted() {
        for _ in 0..100 {
            let ranked = rank_papers(random_pool(25), SortStrategy::New, now());
            for pair in ranked.windows(2) {
                assert!(pair[0].created_at >= pair[1].created_at);
                if pair[0].created_at == pair[1].created_at {
                    assert!(pair[0].vote_count >= pair[1].vote_count);
                }
            }
        }
    }

    #[test]
    fn test_random_pools_hot_sorted() {
        for _ in 0..100 {
            let ranked = rank_papers(random_pool(25), SortStrategy::Hot, now());
            let scores: Vec<f64> = ranked
                .iter()
                .map(|p| crate::score::hotness(p.vote_count, p.age_hours(now())))
                .collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_empty_pool() {
        assert!(rank_papers(Vec::new(), SortStrategy::Hot, now()).is_empty());
    }
}
