//! Paperboard Ranking Core
//!
//! Pure, synchronous scoring over already-fetched paper rows:
//! - Score primitives (vote tally, hotness, preference and related scores)
//! - Tag and author overlap extraction
//! - Listing order (hot / top / new) and search result order
//! - Related papers, personalized recommendations and paper networks
//!
//! Nothing in this crate performs I/O. Callers load candidate pools from
//! storage and pass a fixed `now` so every score in one request shares the
//! same clock.

pub mod network;
pub mod overlap;
pub mod paper;
pub mod personalize;
pub mod rank;
pub mod related;
pub mod score;
pub mod search;

pub use network::{build_network, build_network_with, GraphEdge, GraphNode, NetworkGraph, MAX_NETWORK_CANDIDATES};
pub use overlap::{authors_match, shared_authors, shared_tags, split_authors, Overlap};
pub use paper::{normalize_tag, PaperRecord, ScoredCandidate, VoteValue};
pub use personalize::{
    personalize, personalize_with, PreferenceProfile, PreferenceSource, ProfileMatch,
    Recommendations, VoteHistory, MAX_PERSONALIZATION_CANDIDATES,
};
pub use rank::{rank_papers, rank_papers_with, SortStrategy};
pub use related::{score_related, score_related_with, DEFAULT_RELATED_LIMIT, MAX_RELATED_CANDIDATES};
pub use score::{hotness, preference_score, related_score, vote_score, ScoringWeights};
pub use search::{contains_ignore_case, order_search_results, SearchOrder};

use thiserror::Error;

/// Errors surfaced by the ranking core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankingError {
    #[error("Unknown sort strategy: {0} (expected hot, top or new)")]
    UnknownStrategy(String),

    #[error("Unknown search order: {0} (expected relevance, date or votes)")]
    UnknownSearchOrder(String),

    #[error("Invalid vote value: {0} (expected 1 or -1)")]
    InvalidVote(i64),
}
