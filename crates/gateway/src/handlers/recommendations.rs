//! Recommendation handlers
//!
//! Each handler loads a bounded candidate pool from the store, then hands it
//! to the ranking core with one `now` for the whole request.

use axum::{
    extract::{Path, Query, State},
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
    auth::MaybeUser,
    errors::{AppError, Result},
    metrics,
};
use paperboard_ranking::{
    build_network_with, personalize_with, score_related_with, NetworkGraph, PaperRecord,
    Recommendations, ScoredCandidate, VoteHistory,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LimitQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

/// Cold-start lists carry plain papers; profiled lists carry scores and evidence
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecommendationList {
    Papers(Vec<PaperRecord>),
    Scored(Vec<ScoredCandidate>),
}

impl From<Recommendations> for RecommendationList {
    fn from(recommendations: Recommendations) -> Self {
        match recommendations {
            Recommendations::ColdStart(papers) => RecommendationList::Papers(papers),
            Recommendations::Profiled(scored) => RecommendationList::Scored(scored),
        }
    }
}

async fn load_target(state: &AppState, paper_id: Uuid) -> Result<PaperRecord> {
    state
        .store
        .find_paper(paper_id)
        .await?
        .ok_or_else(|| AppError::PaperNotFound {
            id: paper_id.to_string(),
        })
}

/// Papers sharing tags or authors with the target, best first
pub async fn related(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ScoredCandidate>>> {
    validate(&query)?;
    let ranking = &state.config.ranking;
    let limit = query.limit.unwrap_or(ranking.default_related_limit);

    let target = load_target(&state, paper_id).await?;
    let pool = state
        .store
        .recent_papers_excluding(paper_id, ranking.related_pool_size)
        .await?;

    let start = Instant::now();
    let related = score_related_with(&target, &pool, limit, Utc::now(), &ranking.weights);
    metrics::record_ranking("related", start.elapsed(), pool.len());

    tracing::debug!(
        paper_id = %paper_id,
        candidates = pool.len(),
        returned = related.len(),
        "Scored related papers"
    );

    Ok(Json(related))
}

/// Star graph of tag-sharing papers around the target
pub async fn network(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<NetworkGraph>> {
    let ranking = &state.config.ranking;

    let target = load_target(&state, paper_id).await?;
    let pool = state
        .store
        .papers_sharing_tags(paper_id, ranking.network_pool_size)
        .await?;

    let start = Instant::now();
    let graph = build_network_with(&target, &pool, &ranking.weights);
    metrics::record_ranking("network", start.elapsed(), pool.len());

    tracing::debug!(
        paper_id = %paper_id,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Built paper network"
    );

    Ok(Json(graph))
}

/// Recommendations from the caller's votes, or top papers when anonymous
pub async fn personalized(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationList>> {
    validate(&query)?;
    let ranking = &state.config.ranking;
    let limit = query.limit.unwrap_or(ranking.default_personalized_limit);

    let (pool, history) = match user_id {
        Some(user_id) => {
            let history = state.store.vote_history(user_id).await?;
            let pool = state
                .store
                .unvoted_recent_papers(user_id, ranking.personalization_pool_size)
                .await?;
            (pool, history)
        }
        None => (state.store.list_papers(None).await?, VoteHistory::new()),
    };

    let start = Instant::now();
    let recommendations =
        personalize_with(user_id, &pool, &history, limit, Utc::now(), &ranking.weights);
    metrics::record_ranking("personalized", start.elapsed(), pool.len());

    tracing::debug!(
        personalized = user_id.is_some(),
        candidates = pool.len(),
        returned = recommendations.len(),
        "Built recommendations"
    );

    Ok(Json(recommendations.into()))
}
