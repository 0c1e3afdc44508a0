use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::decode_json_column;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub experience_level: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Job {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let skills_raw: String = row.try_get("required_skills")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            required_skills: decode_json_column("required_skills", &skills_raw)?,
            experience_level: row.try_get("experience_level")?,
            location: row.try_get("location")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
