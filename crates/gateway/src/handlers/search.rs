//! Search handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use super::validate;
use crate::AppState;
use paperboard_common::{
    db::{PaperSearch, SearchSuggestions},
    errors::Result,
    metrics,
};
use paperboard_ranking::{normalize_tag, order_search_results, PaperRecord, SearchOrder};

/// Completions returned per category
const SUGGESTION_LIMIT: usize = 5;

/// Shortest prefix worth completing
const SUGGESTION_MIN_CHARS: usize = 2;

/// Search filters and paging
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SearchQuery {
    /// Free text over title, abstract and authors
    #[validate(length(max = 200))]
    pub q: Option<String>,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 200))]
    pub author: Option<String>,

    #[serde(rename = "abstract")]
    #[validate(length(max = 200))]
    pub abstract_text: Option<String>,

    #[validate(length(max = 64))]
    pub tag: Option<String>,

    /// relevance, date or votes
    pub sort: Option<String>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,

    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub papers: Vec<PaperRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionQuery {
    pub q: Option<String>,
}

fn filter(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Filtered, ordered and paged search over all papers
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    validate(&query)?;

    let order = match query.sort.as_deref() {
        Some(sort) => sort.parse::<SearchOrder>()?,
        None => SearchOrder::default(),
    };
    let limit = query.limit.unwrap_or(state.config.ranking.default_search_limit);

    let search = PaperSearch {
        text: filter(&query.q),
        title: filter(&query.title),
        author: filter(&query.author),
        abstract_text: filter(&query.abstract_text),
        tag: query.tag.as_deref().map(normalize_tag).filter(|tag| !tag.is_empty()),
    };

    let hits = state.store.search_papers(&search).await?;
    let total = hits.len();

    let start = Instant::now();
    let ordered = order_search_results(hits, order, search.text.as_deref(), Utc::now());
    metrics::record_ranking("search", start.elapsed(), total);

    let papers: Vec<PaperRecord> = ordered.into_iter().skip(query.offset).take(limit).collect();

    tracing::debug!(
        sort = %order,
        total,
        offset = query.offset,
        returned = papers.len(),
        "Searched papers"
    );

    Ok(Json(SearchResponse {
        papers,
        pagination: Pagination {
            total,
            limit,
            offset: query.offset,
            has_more: query.offset.saturating_add(limit) < total,
        },
    }))
}

/// Title, author and tag completions for a search prefix
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<SearchSuggestions>> {
    let text = query.q.as_deref().map(str::trim).unwrap_or_default();
    if text.chars().count() < SUGGESTION_MIN_CHARS {
        return Ok(Json(SearchSuggestions::default()));
    }

    Ok(Json(state.store.search_suggestions(text, SUGGESTION_LIMIT).await?))
}
