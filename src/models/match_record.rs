use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::decode_json_column;

/// Scored linkage between a candidate and its job. Immutable after creation;
/// `rank_position` is 1-based serving order, best fit first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub job_id: i64,
    pub candidate_id: i64,
    pub score: i64,
    pub key_highlights: Vec<String>,
    pub fit_reasoning: String,
    pub rank_position: i64,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Match {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let highlights_raw: String = row.try_get("key_highlights")?;
        Ok(Self {
            id: row.try_get("id")?,
            job_id: row.try_get("job_id")?,
            candidate_id: row.try_get("candidate_id")?,
            score: row.try_get("score")?,
            key_highlights: decode_json_column("key_highlights", &highlights_raw)?,
            fit_reasoning: row.try_get("fit_reasoning")?,
            rank_position: row.try_get("rank_position")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
