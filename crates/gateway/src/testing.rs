//! In-memory store and request helpers for router tests

use crate::{create_router, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use paperboard_common::{
    config::AppConfig,
    db::{url_key, NewPaper, PaperSearch, PaperStore, SearchSuggestions, TagCount},
    errors::{AppError, Result},
};
use paperboard_ranking::{contains_ignore_case, PaperRecord, VoteHistory, VoteValue};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tower::ServiceExt;
use uuid::Uuid;

/// Papers held in memory. `vote_count` on a seeded paper is a baseline that
/// live votes are added to.
#[derive(Default)]
pub struct MemoryStore {
    papers: RwLock<Vec<PaperRecord>>,
    votes: RwLock<HashMap<(Uuid, Uuid), VoteValue>>,
    tags: RwLock<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn with_papers(papers: Vec<PaperRecord>) -> Self {
        let tags = papers.iter().flat_map(|paper| paper.tags.iter().cloned()).collect();
        Self {
            papers: RwLock::new(papers),
            votes: RwLock::default(),
            tags: RwLock::new(tags),
        }
    }

    pub fn seed_vote(&self, user_id: Uuid, paper_id: Uuid, vote: VoteValue) {
        self.votes.write().unwrap().insert((user_id, paper_id), vote);
    }

    /// A tag row with no papers attached
    pub fn seed_tag(&self, name: &str) {
        self.tags.write().unwrap().insert(name.to_string());
    }

    fn resolved(&self) -> Vec<PaperRecord> {
        let votes = self.votes.read().unwrap();
        let mut papers = self.papers.read().unwrap().clone();
        for paper in &mut papers {
            paper.vote_count += votes
                .iter()
                .filter(|((_, paper_id), _)| *paper_id == paper.id)
                .map(|(_, vote)| vote.as_i64())
                .sum::<i64>();
        }
        papers
    }

    fn newest_first(mut papers: Vec<PaperRecord>) -> Vec<PaperRecord> {
        papers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        papers
    }
}

#[async_trait]
impl PaperStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_papers(&self, tag: Option<&str>) -> Result<Vec<PaperRecord>> {
        let papers = self
            .resolved()
            .into_iter()
            .filter(|paper| tag.map_or(true, |tag| paper.tags.iter().any(|t| t == tag)))
            .collect();
        Ok(Self::newest_first(papers))
    }

    async fn find_paper(&self, id: Uuid) -> Result<Option<PaperRecord>> {
        Ok(self.resolved().into_iter().find(|paper| paper.id == id))
    }

    async fn recent_papers_excluding(&self, exclude: Uuid, limit: usize) -> Result<Vec<PaperRecord>> {
        let mut papers = Self::newest_first(self.resolved());
        papers.retain(|paper| paper.id != exclude);
        papers.truncate(limit);
        Ok(papers)
    }

    async fn papers_sharing_tags(&self, paper_id: Uuid, limit: usize) -> Result<Vec<PaperRecord>> {
        let papers = self.resolved();
        let Some(target) = papers.iter().find(|paper| paper.id == paper_id).cloned() else {
            return Ok(Vec::new());
        };
        let mut sharing: Vec<PaperRecord> = Self::newest_first(papers)
            .into_iter()
            .filter(|paper| paper.id != paper_id)
            .filter(|paper| paper.tags.iter().any(|t| target.tags.contains(t)))
            .collect();
        sharing.truncate(limit);
        Ok(sharing)
    }

    async fn vote_history(&self, user_id: Uuid) -> Result<VoteHistory> {
        let papers = self.resolved();
        let votes = self.votes.read().unwrap();
        Ok(VoteHistory::from_votes(
            votes
                .iter()
                .filter(|((voter, _), _)| *voter == user_id)
                .filter_map(|((_, paper_id), vote)| {
                    papers
                        .iter()
                        .find(|paper| paper.id == *paper_id)
                        .map(|paper| (paper.clone(), *vote))
                }),
        ))
    }

    async fn unvoted_recent_papers(&self, user_id: Uuid, limit: usize) -> Result<Vec<PaperRecord>> {
        let voted: Vec<Uuid> = self
            .votes
            .read()
            .unwrap()
            .keys()
            .filter(|(voter, _)| *voter == user_id)
            .map(|(_, paper_id)| *paper_id)
            .collect();
        let mut papers = Self::newest_first(self.resolved());
        papers.retain(|paper| !voted.contains(&paper.id));
        papers.truncate(limit);
        Ok(papers)
    }

    async fn cast_vote(&self, user_id: Uuid, paper_id: Uuid, vote: Option<VoteValue>) -> Result<i64> {
        if !self.papers.read().unwrap().iter().any(|paper| paper.id == paper_id) {
            return Err(AppError::PaperNotFound {
                id: paper_id.to_string(),
            });
        }
        {
            let mut votes = self.votes.write().unwrap();
            match vote {
                Some(value) => {
                    votes.insert((user_id, paper_id), value);
                }
                None => {
                    votes.remove(&(user_id, paper_id));
                }
            }
        }
        Ok(self
            .resolved()
            .into_iter()
            .find(|paper| paper.id == paper_id)
            .map(|paper| paper.vote_count)
            .unwrap_or_default())
    }

    async fn user_votes(&self, user_id: Uuid, paper_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteValue>> {
        Ok(self
            .votes
            .read()
            .unwrap()
            .iter()
            .filter(|((voter, paper_id), _)| *voter == user_id && paper_ids.contains(paper_id))
            .map(|((_, paper_id), vote)| (*paper_id, *vote))
            .collect())
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>> {
        let mut counts: BTreeMap<String, i64> = self
            .tags
            .read()
            .unwrap()
            .iter()
            .map(|name| (name.clone(), 0))
            .collect();
        for paper in self.papers.read().unwrap().iter() {
            for tag in &paper.tags {
                *counts.entry(tag.clone()).or_default() += 1;
            }
        }
        let mut counts: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    async fn search_papers(&self, search: &PaperSearch) -> Result<Vec<PaperRecord>> {
        let hit = |field: Option<&str>, filter: &Option<String>| match filter {
            Some(filter) => field.is_some_and(|text| contains_ignore_case(text, filter.trim())),
            None => true,
        };

        let papers = self
            .resolved()
            .into_iter()
            .filter(|paper| {
                let fields = [Some(paper.title.as_str()), paper.abstract_text.as_deref(), paper.authors.as_deref()];
                (search.text.is_none() || fields.into_iter().any(|field| hit(field, &search.text)))
                    && hit(Some(paper.title.as_str()), &search.title)
                    && hit(paper.authors.as_deref(), &search.author)
                    && hit(paper.abstract_text.as_deref(), &search.abstract_text)
                    && search.tag.as_ref().map_or(true, |tag| paper.tags.contains(tag))
            })
            .collect();
        Ok(Self::newest_first(papers))
    }

    async fn search_suggestions(&self, text: &str, limit: usize) -> Result<SearchSuggestions> {
        let newest = Self::newest_first(self.resolved());
        let mut titles: Vec<String> = Vec::new();
        let mut authors: Vec<String> = Vec::new();
        for paper in &newest {
            if contains_ignore_case(&paper.title, text) && !titles.contains(&paper.title) {
                titles.push(paper.title.clone());
            }
            if let Some(list) = paper.authors.as_ref().filter(|list| contains_ignore_case(list, text)) {
                if !authors.contains(list) {
                    authors.push(list.clone());
                }
            }
        }
        titles.truncate(limit);
        authors.truncate(limit);

        let tags = self
            .tags
            .read()
            .unwrap()
            .iter()
            .filter(|name| contains_ignore_case(name, text))
            .take(limit)
            .cloned()
            .collect();

        Ok(SearchSuggestions { titles, authors, tags })
    }

    async fn submit_paper(&self, paper: NewPaper) -> Result<PaperRecord> {
        let key = url_key(&paper.url);
        if let Some(existing) = self
            .papers
            .read()
            .unwrap()
            .iter()
            .find(|existing| url_key(&existing.url) == key)
        {
            return Err(AppError::DuplicatePaper {
                id: existing.id.to_string(),
            });
        }

        let record = PaperRecord {
            id: Uuid::new_v4(),
            title: paper.title,
            url: paper.url,
            abstract_text: paper.abstract_text,
            bib_entry: paper.bib_entry,
            authors: paper.authors,
            published_date: paper.published_date,
            submitter_id: paper.submitter_id,
            submitter_username: None,
            created_at: Utc::now(),
            updated_at: None,
            vote_count: 0,
            tags: paper.tags,
        };
        self.tags.write().unwrap().extend(record.tags.iter().cloned());
        self.papers.write().unwrap().push(record.clone());
        Ok(record)
    }
}

/// A paper submitted `hours_ago` hours before now
pub fn paper(title: &str, hours_ago: i64, votes: i64, tags: &[&str], authors: Option<&str>) -> PaperRecord {
    PaperRecord {
        id: Uuid::new_v4(),
        title: title.to_string(),
        url: format!("https://example.org/{}", title.to_lowercase().replace(' ', "-")),
        abstract_text: None,
        bib_entry: None,
        authors: authors.map(str::to_string),
        published_date: None,
        submitter_id: Uuid::nil(),
        submitter_username: Some("alice".to_string()),
        created_at: Utc::now() - Duration::hours(hours_ago),
        updated_at: None,
        vote_count: votes,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.rate_limit.enabled = false;
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new(papers: Vec<PaperRecord>) -> Self {
        Self::with_config(test_config(), papers)
    }

    pub fn with_config(config: AppConfig, papers: Vec<PaperRecord>) -> Self {
        let store = Arc::new(MemoryStore::with_papers(papers));
        let state = AppState::new(config, store.clone());
        let router = create_router(state.clone()).unwrap();
        Self { router, state, store }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state.jwt.generate_token(user_id).unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, Body::empty()).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Body::from(body.to_string())).await
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Body) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Titles of a JSON array of papers, in order
pub fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .map(|papers| {
            papers
                .iter()
                .filter_map(|paper| paper["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
