//! Ordering for search results
//!
//! Matching happens in storage; this module only decides the order. `date`
//! and `votes` reuse the listing strategies. `relevance` buckets papers by
//! where the free-text query hit (title, then authors, then abstract) and
//! orders each bucket like `votes`.

use crate::paper::PaperRecord;
use crate::rank::{rank_papers, SortStrategy};
use crate::RankingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    #[default]
    Relevance,
    /// Newest first
    Date,
    /// Most votes first, newer on ties
    Votes,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::Date => "date",
            SearchOrder::Votes => "votes",
        }
    }
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOrder {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(SearchOrder::Relevance),
            "date" => Ok(SearchOrder::Date),
            "votes" => Ok(SearchOrder::Votes),
            other => Err(RankingError::UnknownSearchOrder(other.to_string())),
        }
    }
}

/// Case-insensitive substring test used for search matching
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 0 for a title hit, 1 for authors, 2 for abstract, 3 otherwise
fn match_rank(paper: &PaperRecord, query: &str) -> u8 {
    let hit = |field: Option<&str>| field.is_some_and(|text| contains_ignore_case(text, query));

    if hit(Some(paper.title.as_str())) {
        0
    } else if hit(paper.authors.as_deref()) {
        1
    } else if hit(paper.abstract_text.as_deref()) {
        2
    } else {
        3
    }
}

/// Order search hits. `query` is the free-text term, if any; without one,
/// relevance falls back to vote order.
pub fn order_search_results(
    papers: Vec<PaperRecord>,
    order: SearchOrder,
    query: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<PaperRecord> {
    match order {
        SearchOrder::Date => rank_papers(papers, SortStrategy::New, now),
        SearchOrder::Votes => rank_papers(papers, SortStrategy::Top, now),
        SearchOrder::Relevance => {
            let mut ranked = rank_papers(papers, SortStrategy::Top, now);
            if let Some(query) = query.filter(|q| !q.is_empty()) {
                ranked.sort_by_key(|paper| match_rank(paper, query));
            }
            ranked
        }
    }
}
