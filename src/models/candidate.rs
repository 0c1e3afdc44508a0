use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::decode_json_column;

/// Review lifecycle of a sourced candidate. Transitions are monotonic:
/// `pending -> viewed -> {accepted, rejected}`, `accepted -> contacted`.
/// `rejected` and `contacted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Viewed,
    Accepted,
    Rejected,
    Contacted,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Viewed => "viewed",
            CandidateStatus::Accepted => "accepted",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::Contacted => "contacted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CandidateStatus::Rejected | CandidateStatus::Contacted)
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CandidateStatus::Pending),
            "viewed" => Ok(CandidateStatus::Viewed),
            "accepted" => Ok(CandidateStatus::Accepted),
            "rejected" => Ok(CandidateStatus::Rejected),
            "contacted" => Ok(CandidateStatus::Contacted),
            other => Err(format!("Unknown candidate status: {}", other)),
        }
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub job_id: i64,
    pub name: String,
    pub current_role: String,
    pub current_company: String,
    pub years_experience: i64,
    pub skills: Vec<String>,
    pub location: String,
    pub email: String,
    pub linkedin_summary: String,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Candidate {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let skills_raw: String = row.try_get("skills")?;
        let status_raw: String = row.try_get("status")?;
        let status = status_raw
            .parse()
            .map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?;
        Ok(Self {
            id: row.try_get("id")?,
            job_id: row.try_get("job_id")?,
            name: row.try_get("name")?,
            current_role: row.try_get("current_role")?,
            current_company: row.try_get("current_company")?,
            years_experience: row.try_get("years_experience")?,
            skills: decode_json_column("skills", &skills_raw)?,
            location: row.try_get("location")?,
            email: row.try_get("email")?,
            linkedin_summary: row.try_get("linkedin_summary")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}
