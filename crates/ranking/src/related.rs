//! Related papers by tag and author overlap

use crate::overlap::Overlap;
use crate::paper::{PaperRecord, ScoredCandidate};
use crate::score::ScoringWeights;
use chrono::{DateTime, Utc};

/// Largest pool storage should hand to [`score_related`] (most recent papers)
pub const MAX_RELATED_CANDIDATES: usize = 100;

/// Results returned when the caller does not ask for a limit
pub const DEFAULT_RELATED_LIMIT: usize = 10;

/// Score `pool` against `target` using the default weights
pub fn score_related(
    target: &PaperRecord,
    pool: &[PaperRecord],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    score_related_with(target, pool, limit, now, &ScoringWeights::DEFAULT)
}

/// Score `pool` against `target`, best first
///
/// Candidates scoring zero or less are dropped. The target itself is never
/// returned, even if storage included it in the pool.
pub fn score_related_with(
    target: &PaperRecord,
    pool: &[PaperRecord],
    limit: usize,
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = pool
        .iter()
        .filter(|candidate| candidate.id != target.id)
        .filter_map(|candidate| {
            let overlap = Overlap::between(target, candidate);

            let score = weights.related_score(
                overlap.shared_tags.len(),
                overlap.shared_authors.len(),
                candidate.age_days(now),
                candidate.vote_count,
            );

            (score > 0.0).then(|| ScoredCandidate {
                paper: candidate.clone(),
                score,
                shared_tags: overlap.shared_tags,
                shared_authors: overlap.shared_authors,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);

    tracing::debug!(
        paper_id = %target.id,
        pool_size = pool.len(),
        returned = scored.len(),
        "Scored related papers"
    );

    scored
}
