//! Storage seam between the HTTP layer and the database
//!
//! Handlers talk to `dyn PaperStore`, so the gateway can be exercised against
//! an in-memory store while production runs on [`super::Repository`].

use crate::errors::Result;
use async_trait::async_trait;
use paperboard_ranking::{PaperRecord, VoteHistory, VoteValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A tag name with the number of papers carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}

/// Search filters. Every present filter must match (case-insensitive
/// substring, except `tag` which is an exact normalized name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperSearch {
    /// Free text matched against title, abstract and authors
    pub text: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub abstract_text: Option<String>,
    pub tag: Option<String>,
}

/// Type-ahead completions for the search box
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSuggestions {
    pub titles: Vec<String>,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
}

/// Caller-supplied metadata for a new paper. Tags arrive normalized and
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaper {
    pub submitter_id: Uuid,
    pub title: String,
    pub url: String,
    pub abstract_text: Option<String>,
    pub bib_entry: Option<String>,
    pub authors: Option<String>,
    pub published_date: Option<String>,
    pub tags: Vec<String>,
}

/// Key two submissions of the same link compare equal on: scheme and
/// trailing slashes stripped, host lowercased.
pub fn url_key(url: &str) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let rest = ["https://", "http://"]
        .iter()
        .find(|scheme| lower.starts_with(*scheme))
        .map_or(url, |scheme| &url[scheme.len()..]);
    let rest = rest.trim_end_matches('/');

    match rest.split_once('/') {
        Some((host, path)) => format!("{}/{}", host.to_ascii_lowercase(), path),
        None => rest.to_ascii_lowercase(),
    }
}

/// Paper reads and vote writes needed by the ranking endpoints.
///
/// Every returned `PaperRecord` has `vote_count` and `tags` resolved.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Check connectivity
    async fn ping(&self) -> Result<()>;

    /// All papers, optionally restricted to one normalized tag
    async fn list_papers(&self, tag: Option<&str>) -> Result<Vec<PaperRecord>>;

    async fn find_paper(&self, id: Uuid) -> Result<Option<PaperRecord>>;

    /// Most recent papers, newest first, never including `exclude`
    async fn recent_papers_excluding(&self, exclude: Uuid, limit: usize) -> Result<Vec<PaperRecord>>;

    /// Papers sharing at least one tag with `paper_id`, newest first
    async fn papers_sharing_tags(&self, paper_id: Uuid, limit: usize) -> Result<Vec<PaperRecord>>;

    /// Every live vote the user holds, with the voted papers resolved
    async fn vote_history(&self, user_id: Uuid) -> Result<VoteHistory>;

    /// Most recent papers the user has not voted on, newest first
    async fn unvoted_recent_papers(&self, user_id: Uuid, limit: usize) -> Result<Vec<PaperRecord>>;

    /// Set (`Some`) or retract (`None`) the user's vote and return the paper's new total
    async fn cast_vote(&self, user_id: Uuid, paper_id: Uuid, vote: Option<VoteValue>) -> Result<i64>;

    /// The user's live votes among `paper_ids`; unvoted papers are absent
    async fn user_votes(&self, user_id: Uuid, paper_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteValue>>;

    /// Tags with paper counts, most used first, ties by name. Tags no paper
    /// carries are reported with a count of zero.
    async fn tag_counts(&self) -> Result<Vec<TagCount>>;

    /// Every paper matching all filters, newest first
    async fn search_papers(&self, search: &PaperSearch) -> Result<Vec<PaperRecord>>;

    /// Up to `limit` titles, authors and tags containing `text`
    async fn search_suggestions(&self, text: &str, limit: usize) -> Result<SearchSuggestions>;

    /// Store a new paper with its tags. Fails with `DuplicatePaper` when
    /// another paper has the same [`url_key`].
    async fn submit_paper(&self, paper: NewPaper) -> Result<PaperRecord>;
}
