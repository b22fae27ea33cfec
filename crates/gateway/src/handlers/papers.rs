//! Paper listing, submission, lookup and vote handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use super::validate;
use crate::AppState;
use paperboard_common::{
    auth::{AuthUser, MaybeUser},
    db::{NewPaper, TagCount},
    errors::{AppError, Result},
    metrics,
};
use paperboard_ranking::{normalize_tag, rank_papers_with, PaperRecord, SortStrategy, VoteValue};

/// Query string for the listing
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListPapersQuery {
    /// hot, top or new
    pub sort: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub tag: Option<String>,
}

/// Vote body: 1 upvotes, -1 downvotes, 0 retracts
#[derive(Debug, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(range(min = -1, max = 1))]
    pub vote: i64,
}

/// New paper metadata supplied by the submitter
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPaperRequest {
    #[validate(url)]
    pub url: String,

    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,

    #[serde(default)]
    pub bib_entry: Option<String>,

    /// Comma-separated author list
    #[serde(default)]
    pub authors: Option<String>,

    #[serde(default)]
    pub published_date: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub tags: Vec<String>,
}

/// A paper as listed to one caller, with that caller's vote
#[derive(Debug, Serialize)]
pub struct ListedPaper {
    #[serde(flatten)]
    pub paper: PaperRecord,

    pub user_vote: Option<VoteValue>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub vote_count: i64,
    pub user_vote: Option<VoteValue>,
}

/// Ranked listing, optionally narrowed to one tag
pub async fn list_papers(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    Query(query): Query<ListPapersQuery>,
) -> Result<Json<Vec<ListedPaper>>> {
    validate(&query)?;

    let strategy = match query.sort.as_deref() {
        Some(sort) => sort.parse::<SortStrategy>()?,
        None => SortStrategy::default(),
    };
    let tag = query.tag.as_deref().map(normalize_tag).filter(|tag| !tag.is_empty());

    let papers = state.store.list_papers(tag.as_deref()).await?;
    let candidates = papers.len();

    let start = Instant::now();
    let ranking = &state.config.ranking;
    let mut ranked = rank_papers_with(papers, strategy, Utc::now(), &ranking.weights);
    ranked.truncate(ranking.listing_limit);
    metrics::record_ranking("listing", start.elapsed(), candidates);

    let mut votes = match user_id {
        Some(user_id) => {
            let ids: Vec<Uuid> = ranked.iter().map(|paper| paper.id).collect();
            state.store.user_votes(user_id, &ids).await?
        }
        None => Default::default(),
    };

    tracing::debug!(
        sort = %strategy,
        tag = tag.as_deref().unwrap_or(""),
        candidates,
        returned = ranked.len(),
        voted = votes.len(),
        "Listed papers"
    );

    Ok(Json(
        ranked
            .into_iter()
            .map(|paper| ListedPaper {
                user_vote: votes.remove(&paper.id),
                paper,
            })
            .collect(),
    ))
}

/// Normalize, drop empty and deduplicate tags, keeping first occurrence order
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|tag| normalize_tag(tag)) {
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Submit a paper with caller-supplied metadata
pub async fn submit_paper(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<SubmitPaperRequest>,
) -> Result<(StatusCode, Json<ListedPaper>)> {
    validate(&request)?;

    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation {
            message: "title must not be blank".to_string(),
            field: Some("title".to_string()),
        });
    }

    let new_paper = NewPaper {
        submitter_id: user_id,
        title,
        url: request.url.trim().to_string(),
        abstract_text: non_blank(request.abstract_text),
        bib_entry: non_blank(request.bib_entry),
        authors: non_blank(request.authors),
        published_date: non_blank(request.published_date),
        tags: normalize_tags(&request.tags),
    };

    let paper = state.store.submit_paper(new_paper).await?;
    metrics::record_submission();

    tracing::info!(
        paper_id = %paper.id,
        user_id = %user_id,
        tags = paper.tags.len(),
        "Paper submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(ListedPaper {
            paper,
            user_vote: None,
        }),
    ))
}

/// Get a paper by ID
pub async fn get_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<PaperRecord>> {
    let paper = state
        .store
        .find_paper(paper_id)
        .await?
        .ok_or_else(|| AppError::PaperNotFound {
            id: paper_id.to_string(),
        })?;

    Ok(Json(paper))
}

/// Cast, change or retract the caller's vote
pub async fn vote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(paper_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    validate(&request)?;

    let vote = match request.vote {
        0 => None,
        value => Some(VoteValue::try_from(value)?),
    };

    let vote_count = state.store.cast_vote(user_id, paper_id, vote).await?;
    metrics::record_vote(vote);

    tracing::info!(
        paper_id = %paper_id,
        user_id = %user_id,
        direction = metrics::vote_direction(vote),
        vote_count,
        "Vote recorded"
    );

    Ok(Json(VoteResponse {
        vote_count,
        user_vote: vote,
    }))
}

/// Tag names with paper counts
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagCount>>> {
    Ok(Json(state.store.tag_counts().await?))
}
