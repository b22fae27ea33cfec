//! Paper rows as seen by the ranking layer

use crate::overlap::split_authors;
use crate::RankingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A paper with its query-time aggregates resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: Uuid,

    pub title: String,

    pub url: String,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub bib_entry: Option<String>,

    /// Comma-separated author list as extracted at submission time
    pub authors: Option<String>,

    pub published_date: Option<String>,

    pub submitter_id: Uuid,

    pub submitter_username: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,

    /// Signed sum of all live votes
    pub vote_count: i64,

    /// Normalized tag names
    pub tags: Vec<String>,
}

impl PaperRecord {
    /// Author fragments, trimmed, in submission order
    pub fn author_list(&self) -> Vec<String> {
        self.authors.as_deref().map(split_authors).unwrap_or_default()
    }

    /// Hours since submission, never negative
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        elapsed_millis(self.created_at, now) / MILLIS_PER_HOUR
    }

    /// Days since submission, never negative
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        elapsed_millis(self.created_at, now) / MILLIS_PER_DAY
    }
}

fn elapsed_millis(from: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - from).num_milliseconds().max(0) as f64
}

/// A paper annotated with its score and the overlap that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub paper: PaperRecord,

    pub score: f64,

    pub shared_tags: Vec<String>,

    pub shared_authors: Vec<String>,
}

/// Direction of a single live vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i64(self) -> i64 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

impl From<VoteValue> for i64 {
    fn from(value: VoteValue) -> Self {
        value.as_i64()
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = RankingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(RankingError::InvalidVote(other)),
        }
    }
}

/// Canonical tag form: trimmed and lowercased
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  ZKP "), "zkp");
        assert_eq!(normalize_tag("Machine-Learning"), "machine-learning");
    }

    #[test]
    fn test_vote_value_conversion() {
        assert_eq!(VoteValue::try_from(1), Ok(VoteValue::Up));
        assert_eq!(VoteValue::try_from(-1), Ok(VoteValue::Down));
        assert_eq!(VoteValue::try_from(0), Err(RankingError::InvalidVote(0)));
        assert_eq!(i64::from(VoteValue::Down), -1);
    }

    #[test]
    fn test_ages() {
        let p = paper(1, 36, 0, &[], None);
        assert!((p.age_hours(now()) - 36.0).abs() < 1e-9);
        assert!((p.age_days(now()) - 1.5).abs() < 1e-9);

        let future = paper(2, -2, 0, &[], None);
        assert_eq!(future.age_hours(now()), 0.0);
    }

    #[test]
    fn test_author_list() {
        let p = paper(1, 0, 0, &[], Some("Alice Smith, Bob Jones ,Carol"));
        assert_eq!(p.author_list(), vec!["Alice Smith", "Bob Jones", "Carol"]);
        assert!(paper(2, 0, 0, &[], None).author_list().is_empty());
    }
}
