//! Score primitives
//!
//! Every weight used by the listing, related-papers and personalization
//! scorers lives in [`ScoringWeights`]. The free functions at the bottom of
//! this module use [`ScoringWeights::DEFAULT`].

use crate::paper::VoteValue;
use serde::{Deserialize, Serialize};

/// Tunable scoring policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Exponent applied to the age term of the hotness score
    pub hot_gravity: f64,

    /// Added to the vote count before decay, so fresh unvoted papers rank above zero
    pub hot_score_offset: f64,

    /// Added to the age in hours, keeps the denominator at or above 2^gravity
    pub hot_age_offset_hours: f64,

    /// Related score per shared tag
    pub related_tag_weight: f64,

    /// Related score per shared author
    pub related_author_weight: f64,

    /// Maximum related recency bonus
    pub related_recency_max: f64,

    /// Days it takes the related recency bonus to lose one point
    pub related_recency_period_days: f64,

    /// Preference score per profile occurrence of a candidate tag
    pub preference_tag_weight: f64,

    /// Preference score per candidate author found in the profile
    pub preference_author_weight: f64,

    /// Maximum preference recency bonus
    pub preference_recency_max: f64,

    /// Days it takes the preference recency bonus to lose one point
    pub preference_recency_period_days: f64,

    /// Bonus per net vote
    pub vote_bonus_rate: f64,

    /// Upper bound on the vote bonus
    pub vote_bonus_cap: f64,

    /// Network edge weight per shared author (a shared tag counts 1)
    pub network_author_weight: u32,
}

impl ScoringWeights {
    pub const DEFAULT: ScoringWeights = ScoringWeights {
        hot_gravity: 1.8,
        hot_score_offset: 1.0,
        hot_age_offset_hours: 2.0,
        related_tag_weight: 10.0,
        related_author_weight: 20.0,
        related_recency_max: 5.0,
        related_recency_period_days: 30.0,
        preference_tag_weight: 5.0,
        preference_author_weight: 15.0,
        preference_recency_max: 10.0,
        preference_recency_period_days: 7.0,
        vote_bonus_rate: 0.5,
        vote_bonus_cap: 10.0,
        network_author_weight: 2,
    };

    /// Time-decayed popularity: `(score + 1) / (age_hours + 2)^gravity`
    pub fn hotness(&self, score: i64, age_hours: f64) -> f64 {
        let age_hours = age_hours.max(0.0);
        (score as f64 + self.hot_score_offset)
            / (age_hours + self.hot_age_offset_hours).powf(self.hot_gravity)
    }

    /// Popularity bonus, capped above but not floored: net-negative papers lose points
    pub fn vote_bonus(&self, vote_count: i64) -> f64 {
        (vote_count as f64 * self.vote_bonus_rate).min(self.vote_bonus_cap)
    }

    /// Score of a candidate against a preference profile
    ///
    /// `tag_matches` is the summed profile frequency of the candidate's tags,
    /// `author_matches` the number of candidate authors found in the profile.
    pub fn preference_score(
        &self,
        tag_matches: u32,
        author_matches: usize,
        recency_days: f64,
        vote_count: i64,
    ) -> f64 {
        let recency = linear_decay(
            self.preference_recency_max,
            recency_days,
            self.preference_recency_period_days,
        );

        tag_matches as f64 * self.preference_tag_weight
            + author_matches as f64 * self.preference_author_weight
            + recency
            + self.vote_bonus(vote_count)
    }

    /// Relatedness of a candidate to a target paper
    pub fn related_score(
        &self,
        shared_tag_count: usize,
        shared_author_count: usize,
        age_days: f64,
        vote_count: i64,
    ) -> f64 {
        let recency = linear_decay(
            self.related_recency_max,
            age_days,
            self.related_recency_period_days,
        );

        shared_tag_count as f64 * self.related_tag_weight
            + shared_author_count as f64 * self.related_author_weight
            + recency
            + self.vote_bonus(vote_count)
    }

    /// Network edge weight for one target/candidate pair
    pub fn edge_weight(&self, shared_tag_count: usize, shared_author_count: usize) -> u32 {
        shared_tag_count as u32 + self.network_author_weight * shared_author_count as u32
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `max(0, max_bonus - days / period)`
fn linear_decay(max_bonus: f64, days: f64, period_days: f64) -> f64 {
    (max_bonus - days.max(0.0) / period_days).max(0.0)
}

/// Net vote tally
pub fn vote_score<'a, I>(votes: I) -> i64
where
    I: IntoIterator<Item = &'a VoteValue>,
{
    votes.into_iter().map(|v| v.as_i64()).sum()
}

pub fn hotness(score: i64, age_hours: f64) -> f64 {
    ScoringWeights::DEFAULT.hotness(score, age_hours)
}

pub fn preference_score(
    tag_matches: u32,
    author_matches: usize,
    recency_days: f64,
    vote_count: i64,
) -> f64 {
    ScoringWeights::DEFAULT.preference_score(tag_matches, author_matches, recency_days, vote_count)
}

pub fn related_score(
    shared_tag_count: usize,
    shared_author_count: usize,
    age_days: f64,
    vote_count: i64,
) -> f64 {
    ScoringWeights::DEFAULT.related_score(shared_tag_count, shared_author_count, age_days, vote_count)
}
