//! Personalized recommendations from a user's voting history
//!
//! A profile is built from the papers the user upvoted: how often each tag
//! occurs across them, and which author fragments they carry. Downvotes never
//! feed the profile, but any vote, up or down, removes a paper from the
//! user's candidates.

use crate::overlap::{authors_match, split_authors};
use crate::paper::{PaperRecord, ScoredCandidate, VoteValue};
use crate::rank::by_votes_then_newest;
use crate::score::ScoringWeights;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// Largest pool storage should hand to [`personalize`] (most recent unvoted papers)
pub const MAX_PERSONALIZATION_CANDIDATES: usize = 100;

/// Where the engine reads a user's preferences from
pub trait PreferenceSource {
    /// Papers the user upvoted
    fn upvoted(&self) -> &[PaperRecord];

    /// Whether the user holds any vote on the paper
    fn has_voted(&self, paper_id: Uuid) -> bool;
}

/// One user's live votes, as loaded from storage
#[derive(Debug, Clone, Default)]
pub struct VoteHistory {
    upvoted: Vec<PaperRecord>,
    voted: HashSet<Uuid>,
}

impl VoteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(paper, vote)` pairs
    pub fn from_votes<I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (PaperRecord, VoteValue)>,
    {
        let mut history = Self::new();
        for (paper, value) in votes {
            history.record(paper, value);
        }
        history
    }

    pub fn record(&mut self, paper: PaperRecord, value: VoteValue) {
        self.voted.insert(paper.id);
        if value == VoteValue::Up {
            self.upvoted.push(paper);
        }
    }

    pub fn vote_count(&self) -> usize {
        self.voted.len()
    }
}

impl PreferenceSource for VoteHistory {
    fn upvoted(&self) -> &[PaperRecord] {
        &self.upvoted
    }

    fn has_voted(&self, paper_id: Uuid) -> bool {
        self.voted.contains(&paper_id)
    }
}

/// Tag and author affinities derived from upvotes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreferenceProfile {
    /// Occurrences of each tag across all upvoted papers
    pub tag_counts: HashMap<String, u32>,

    /// Lowercased author fragments from upvoted papers
    pub authors: BTreeSet<String>,
}

/// How a candidate lines up with a profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMatch {
    /// Summed profile count over the candidate's tags
    pub tag_weight: u32,
    pub matched_tags: Vec<String>,
    pub matched_authors: Vec<String>,
}

impl PreferenceProfile {
    pub fn from_upvoted(papers: &[PaperRecord]) -> Self {
        let mut profile = Self::default();

        for paper in papers {
            for tag in &paper.tags {
                *profile.tag_counts.entry(tag.clone()).or_insert(0) += 1;
            }
            if let Some(authors) = paper.authors.as_deref() {
                profile
                    .authors
                    .extend(split_authors(authors).into_iter().map(|a| a.to_lowercase()));
            }
        }

        profile
    }

    pub fn tag_count(&self, tag: &str) -> u32 {
        self.tag_counts.get(tag).copied().unwrap_or(0)
    }

    pub fn matches(&self, candidate: &PaperRecord) -> ProfileMatch {
        let mut result = ProfileMatch::default();

        for tag in &candidate.tags {
            let count = self.tag_count(tag);
            if count > 0 {
                result.tag_weight += count;
                result.matched_tags.push(tag.clone());
            }
        }

        for author in candidate.author_list() {
            if self.authors.iter().any(|preferred| authors_match(&author, preferred)) {
                result.matched_authors.push(author);
            }
        }

        result
    }

    pub fn score(
        &self,
        candidate: &PaperRecord,
        now: DateTime<Utc>,
        weights: &ScoringWeights,
    ) -> ScoredCandidate {
        let matched = self.matches(candidate);
        let score = weights.preference_score(
            matched.tag_weight,
            matched.matched_authors.len(),
            candidate.age_days(now),
            candidate.vote_count,
        );

        ScoredCandidate {
            paper: candidate.clone(),
            score,
            shared_tags: matched.matched_tags,
            shared_authors: matched.matched_authors,
        }
    }
}

/// Output of [`personalize`]
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    /// Anonymous request: the globally top-voted papers
    ColdStart(Vec<PaperRecord>),
    /// Candidates scored against the user's profile
    Profiled(Vec<ScoredCandidate>),
}

impl Recommendations {
    pub fn len(&self) -> usize {
        match self {
            Recommendations::ColdStart(papers) => papers.len(),
            Recommendations::Profiled(scored) => scored.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recommend up to `limit` papers using the default weights
pub fn personalize<S: PreferenceSource>(
    user_id: Option<Uuid>,
    candidates: &[PaperRecord],
    preferences: &S,
    limit: usize,
    now: DateTime<Utc>,
) -> Recommendations {
    personalize_with(user_id, candidates, preferences, limit, now, &ScoringWeights::DEFAULT)
}

/// Recommend up to `limit` papers
///
/// Without a user the result is the candidates ordered by votes, newest
/// first on ties. With a user, candidates they voted on are skipped and the
/// rest are scored against their profile. No score floor applies.
pub fn personalize_with<S: PreferenceSource>(
    user_id: Option<Uuid>,
    candidates: &[PaperRecord],
    preferences: &S,
    limit: usize,
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> Recommendations {
    let Some(user_id) = user_id else {
        let mut top = candidates.to_vec();
        top.sort_by(by_votes_then_newest);
        top.truncate(limit);
        return Recommendations::ColdStart(top);
    };

    let profile = PreferenceProfile::from_upvoted(preferences.upvoted());

    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .filter(|candidate| !preferences.has_voted(candidate.id))
        .map(|candidate| profile.score(candidate, now, weights))
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);

    tracing::debug!(
        user_id = %user_id,
        profile_tags = profile.tag_counts.len(),
        profile_authors = profile.authors.len(),
        returned = scored.len(),
        "Scored personalized recommendations"
    );

    Recommendations::Profiled(scored)
}
