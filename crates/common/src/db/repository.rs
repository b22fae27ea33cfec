//! Postgres implementation of [`PaperStore`]
//!
//! Paper reads go through one aggregate query so `vote_count` is always the
//! live signed sum of votes; tags are attached afterwards through the
//! `paper_tags` join entity.

use crate::db::models::*;
use crate::db::store::{url_key, NewPaper, PaperSearch, PaperStore, SearchSuggestions, TagCount};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperboard_ranking::{normalize_tag, PaperRecord, VoteHistory, VoteValue};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, FromQueryResult, QueryFilter, Set, Statement, TransactionTrait, Value,
};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

const PAPER_SELECT: &str = r#"
    SELECT
        p.id,
        p.title,
        p.url,
        p.abstract AS abstract_text,
        p.bib_entry,
        p.authors,
        p.published_date,
        p.submitter_id,
        u.username AS submitter_username,
        p.created_at,
        p.updated_at,
        COALESCE(SUM(v.value), 0)::bigint AS vote_count
    FROM papers p
    LEFT JOIN users u ON u.id = p.submitter_id
    LEFT JOIN votes v ON v.paper_id = p.id
"#;

const PAPER_GROUP: &str = "GROUP BY p.id, u.username";

#[derive(Debug, FromQueryResult)]
struct PaperRow {
    id: Uuid,
    title: String,
    url: String,
    abstract_text: Option<String>,
    bib_entry: Option<String>,
    authors: Option<String>,
    published_date: Option<String>,
    submitter_id: Uuid,
    submitter_username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    vote_count: i64,
}

impl PaperRow {
    fn into_record(self, tags: Vec<String>) -> PaperRecord {
        PaperRecord {
            id: self.id,
            title: self.title,
            url: self.url,
            abstract_text: self.abstract_text,
            bib_entry: self.bib_entry,
            authors: self.authors,
            published_date: self.published_date,
            submitter_id: self.submitter_id,
            submitter_username: self.submitter_username,
            created_at: self.created_at,
            updated_at: self.updated_at,
            vote_count: self.vote_count,
            tags,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct TagCountRow {
    name: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct VoteTotalRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct NameRow {
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct PaperIdRow {
    id: Uuid,
}

/// `ILIKE` pattern matching `text` anywhere
fn contains_pattern(text: &Option<String>) -> Value {
    text.as_deref()
        .map(|text| format!("%{}%", text.trim()))
        .into()
}

fn sql_limit(limit: usize) -> Value {
    i64::try_from(limit).unwrap_or(i64::MAX).into()
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Run the aggregate paper query with the given filter and tail clauses
    async fn query_papers(
        &self,
        filter: &str,
        tail: &str,
        values: Vec<Value>,
    ) -> Result<Vec<PaperRecord>> {
        let sql = format!("{} {} {} {}", PAPER_SELECT, filter, PAPER_GROUP, tail);
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, values);

        let rows = PaperRow::find_by_statement(stmt)
            .all(self.read_conn())
            .await?;

        self.attach_tags(rows).await
    }

    /// Resolve tag names for a batch of paper rows, preserving row order
    async fn attach_tags(&self, rows: Vec<PaperRow>) -> Result<Vec<PaperRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let links = PaperTagEntity::find()
            .filter(PaperTagColumn::PaperId.is_in(ids))
            .find_also_related(TagEntity)
            .all(self.read_conn())
            .await?;

        let mut tags_by_paper: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (link, tag) in links {
            if let Some(tag) = tag {
                tags_by_paper.entry(link.paper_id).or_default().push(tag.name);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut tags = tags_by_paper.remove(&row.id).unwrap_or_default();
                tags.sort();
                row.into_record(tags)
            })
            .collect())
    }

    async fn vote_total<C: ConnectionTrait>(conn: &C, paper_id: Uuid) -> Result<i64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT COALESCE(SUM(value), 0)::bigint AS total FROM votes WHERE paper_id = $1",
            vec![paper_id.into()],
        );

        Ok(VoteTotalRow::find_by_statement(stmt)
            .one(conn)
            .await?
            .map(|row| row.total)
            .unwrap_or(0))
    }

    async fn names(&self, sql: &str, text: &str, limit: usize) -> Result<Vec<String>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![format!("%{}%", text).into(), sql_limit(limit)],
        );

        Ok(NameRow::find_by_statement(stmt)
            .all(self.read_conn())
            .await?
            .into_iter()
            .map(|row| row.name)
            .collect())
    }

    /// Existing paper whose link has the same [`url_key`]
    async fn find_by_url_key<C: ConnectionTrait>(conn: &C, key: &str) -> Result<Option<Uuid>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT id FROM papers
            WHERE rtrim(regexp_replace(lower(url), '^https?://', ''), '/') = lower($1)
            LIMIT 1
            "#,
            vec![key.into()],
        );

        Ok(PaperIdRow::find_by_statement(stmt)
            .one(conn)
            .await?
            .map(|row| row.id))
    }

    /// Tag id for `name`, creating the tag when it is new
    async fn ensure_tag<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Uuid> {
        TagEntity::insert(TagActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
        })
        .on_conflict(OnConflict::column(TagColumn::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

        TagEntity::find()
            .filter(TagColumn::Name.eq(name))
            .one(conn)
            .await?
            .map(|tag| tag.id)
            .ok_or_else(|| AppError::Internal {
                message: format!("tag {} vanished after insert", name),
            })
    }
}

#[async_trait]
impl PaperStore for Repository {
    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    async fn list_papers(&self, tag: Option<&str>) -> Result<Vec<PaperRecord>> {
        let tag: Option<String> = tag.map(normalize_tag);
        self.query_papers(
            r#"
            WHERE ($1::text IS NULL OR EXISTS (
                SELECT 1 FROM paper_tags pt
                JOIN tags t ON t.id = pt.tag_id
                WHERE pt.paper_id = p.id AND t.name = $1
            ))
            "#,
            "ORDER BY p.created_at DESC",
            vec![tag.into()],
        )
        .await
    }

    async fn find_paper(&self, id: Uuid) -> Result<Option<PaperRecord>> {
        let papers = self
            .query_papers("WHERE p.id = $1", "", vec![id.into()])
            .await?;
        Ok(papers.into_iter().next())
    }

    async fn recent_papers_excluding(&self, exclude: Uuid, limit: usize) -> Result<Vec<PaperRecord>> {
        self.query_papers(
            "WHERE p.id <> $1",
            "ORDER BY p.created_at DESC LIMIT $2",
            vec![exclude.into(), sql_limit(limit)],
        )
        .await
    }

    async fn papers_sharing_tags(&self, paper_id: Uuid, limit: usize) -> Result<Vec<PaperRecord>> {
        self.query_papers(
            r#"
            WHERE p.id <> $1 AND EXISTS (
                SELECT 1 FROM paper_tags pt
                WHERE pt.paper_id = p.id
                  AND pt.tag_id IN (SELECT tag_id FROM paper_tags WHERE paper_id = $1)
            )
            "#,
            "ORDER BY p.created_at DESC LIMIT $2",
            vec![paper_id.into(), sql_limit(limit)],
        )
        .await
    }

    async fn vote_history(&self, user_id: Uuid) -> Result<VoteHistory> {
        let votes = VoteEntity::find()
            .filter(VoteColumn::UserId.eq(user_id))
            .all(self.read_conn())
            .await?;

        if votes.is_empty() {
            return Ok(VoteHistory::new());
        }

        let mut papers: HashMap<Uuid, PaperRecord> = self
            .query_papers(
                "WHERE p.id IN (SELECT paper_id FROM votes WHERE user_id = $1)",
                "",
                vec![user_id.into()],
            )
            .await?
            .into_iter()
            .map(|paper| (paper.id, paper))
            .collect();

        let mut history = VoteHistory::new();
        for vote in votes {
            let direction = match vote.direction() {
                Ok(direction) => direction,
                Err(e) => {
                    warn!(user_id = %user_id, paper_id = %vote.paper_id, error = %e, "Skipping stored vote");
                    continue;
                }
            };
            if let Some(paper) = papers.remove(&vote.paper_id) {
                history.record(paper, direction);
            }
        }

        debug!(user_id = %user_id, votes = history.vote_count(), "Loaded vote history");
        Ok(history)
    }

    async fn unvoted_recent_papers(&self, user_id: Uuid, limit: usize) -> Result<Vec<PaperRecord>> {
        self.query_papers(
            r#"
            WHERE NOT EXISTS (
                SELECT 1 FROM votes uv WHERE uv.paper_id = p.id AND uv.user_id = $1
            )
            "#,
            "ORDER BY p.created_at DESC LIMIT $2",
            vec![user_id.into(), sql_limit(limit)],
        )
        .await
    }

    async fn cast_vote(&self, user_id: Uuid, paper_id: Uuid, vote: Option<VoteValue>) -> Result<i64> {
        let txn = self.write_conn().begin().await?;

        if PaperEntity::find_by_id(paper_id).one(&txn).await?.is_none() {
            return Err(AppError::PaperNotFound {
                id: paper_id.to_string(),
            });
        }

        match vote {
            Some(value) => {
                let model = VoteActiveModel {
                    user_id: Set(user_id),
                    paper_id: Set(paper_id),
                    value: Set(value.as_i64() as i32),
                    created_at: Set(Utc::now().into()),
                };
                VoteEntity::insert(model)
                    .on_conflict(
                        OnConflict::columns([VoteColumn::UserId, VoteColumn::PaperId])
                            .update_column(VoteColumn::Value)
                            .to_owned(),
                    )
                    .exec(&txn)
                    .await?;
            }
            None => {
                VoteEntity::delete_many()
                    .filter(VoteColumn::UserId.eq(user_id))
                    .filter(VoteColumn::PaperId.eq(paper_id))
                    .exec(&txn)
                    .await?;
            }
        }

        let total = Self::vote_total(&txn, paper_id).await?;
        txn.commit().await?;

        Ok(total)
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            r#"
            SELECT t.name, COUNT(pt.paper_id)::bigint AS count
            FROM tags t
            LEFT JOIN paper_tags pt ON pt.tag_id = t.id
            GROUP BY t.name
            ORDER BY count DESC, t.name ASC
            "#,
        );

        let rows = TagCountRow::find_by_statement(stmt)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TagCount {
                name: row.name,
                count: row.count,
            })
            .collect())
    }

    async fn user_votes(&self, user_id: Uuid, paper_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteValue>> {
        if paper_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let votes = VoteEntity::find()
            .filter(VoteColumn::UserId.eq(user_id))
            .filter(VoteColumn::PaperId.is_in(paper_ids.iter().copied()))
            .all(self.read_conn())
            .await?;

        let mut by_paper = HashMap::with_capacity(votes.len());
        for vote in votes {
            match vote.direction() {
                Ok(direction) => {
                    by_paper.insert(vote.paper_id, direction);
                }
                Err(e) => {
                    warn!(user_id = %user_id, paper_id = %vote.paper_id, error = %e, "Skipping stored vote");
                }
            }
        }
        Ok(by_paper)
    }

    async fn search_papers(&self, search: &PaperSearch) -> Result<Vec<PaperRecord>> {
        let tag: Option<String> = search.tag.as_deref().map(normalize_tag);
        self.query_papers(
            r#"
            WHERE ($1::text IS NULL OR p.title ILIKE $1 OR p.abstract ILIKE $1 OR p.authors ILIKE $1)
              AND ($2::text IS NULL OR p.title ILIKE $2)
              AND ($3::text IS NULL OR p.authors ILIKE $3)
              AND ($4::text IS NULL OR p.abstract ILIKE $4)
              AND ($5::text IS NULL OR EXISTS (
                  SELECT 1 FROM paper_tags pt
                  JOIN tags t ON t.id = pt.tag_id
                  WHERE pt.paper_id = p.id AND t.name = $5
              ))
            "#,
            "ORDER BY p.created_at DESC",
            vec![
                contains_pattern(&search.text),
                contains_pattern(&search.title),
                contains_pattern(&search.author),
                contains_pattern(&search.abstract_text),
                tag.into(),
            ],
        )
        .await
    }

    async fn search_suggestions(&self, text: &str, limit: usize) -> Result<SearchSuggestions> {
        let titles = self
            .names(
                r#"
                SELECT title AS name FROM papers
                WHERE title ILIKE $1
                GROUP BY title
                ORDER BY MAX(created_at) DESC
                LIMIT $2
                "#,
                text,
                limit,
            )
            .await?;

        let authors = self
            .names(
                r#"
                SELECT authors AS name FROM papers
                WHERE authors IS NOT NULL AND authors ILIKE $1
                GROUP BY authors
                ORDER BY MAX(created_at) DESC
                LIMIT $2
                "#,
                text,
                limit,
            )
            .await?;

        let tags = self
            .names(
                "SELECT name FROM tags WHERE name ILIKE $1 ORDER BY name LIMIT $2",
                text,
                limit,
            )
            .await?;

        Ok(SearchSuggestions { titles, authors, tags })
    }

    async fn submit_paper(&self, paper: NewPaper) -> Result<PaperRecord> {
        let txn = self.write_conn().begin().await?;

        if UserEntity::find_by_id(paper.submitter_id).one(&txn).await?.is_none() {
            return Err(AppError::Unauthorized {
                message: "Unknown user".to_string(),
            });
        }

        if let Some(existing) = Self::find_by_url_key(&txn, &url_key(&paper.url)).await? {
            return Err(AppError::DuplicatePaper {
                id: existing.to_string(),
            });
        }

        let paper_id = Uuid::new_v4();
        PaperEntity::insert(PaperActiveModel {
            id: Set(paper_id),
            title: Set(paper.title),
            url: Set(paper.url),
            abstract_text: Set(paper.abstract_text),
            bib_entry: Set(paper.bib_entry),
            authors: Set(paper.authors),
            published_date: Set(paper.published_date),
            submitter_id: Set(paper.submitter_id),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .exec_without_returning(&txn)
        .await?;

        let mut links = Vec::with_capacity(paper.tags.len());
        for name in &paper.tags {
            links.push(PaperTagActiveModel {
                paper_id: Set(paper_id),
                tag_id: Set(Self::ensure_tag(&txn, name).await?),
            });
        }
        if !links.is_empty() {
            PaperTagEntity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        debug!(paper_id = %paper_id, tags = paper.tags.len(), "Stored paper");

        self.find_paper(paper_id).await?.ok_or_else(|| AppError::Internal {
            message: format!("paper {} missing after insert", paper_id),
        })
    }
}
