use sqlx::{Row, SqlitePool};

use crate::dto::job_dto::StatsResponse;
use crate::dto::triage_dto::CandidateWithMatch;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus};
use crate::models::match_record::Match;

/// Serves candidates in rank order and owns the candidate status state
/// machine. All transitions go through conditional updates so a concurrent
/// caller can never observe or cause a reversed transition.
#[derive(Clone)]
pub struct TriageService {
    pool: SqlitePool,
}

impl TriageService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Claims the best-ranked pending candidate for the job and marks it
    /// viewed. Claim and mark are a single statement, so two concurrent calls
    /// can never serve the same candidate. Rank positions restart at 1 on
    /// each sourcing run, so ties across runs break by match insertion order.
    pub async fn next(&self, job_id: i64) -> Result<Option<CandidateWithMatch>> {
        let claimed = sqlx::query(
            r#"
            UPDATE candidates SET status = 'viewed'
            WHERE id = (
                SELECT c.id FROM candidates c
                JOIN matches m ON m.candidate_id = c.id
                WHERE c.job_id = ?1 AND c.status = 'pending'
                ORDER BY m.rank_position ASC, m.id ASC
                LIMIT 1
            )
            RETURNING id
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = claimed else { return Ok(None) };
        let candidate_id: i64 = row.try_get("id")?;

        let candidate = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = ?1")
            .bind(candidate_id)
            .fetch_one(&self.pool)
            .await?;
        let match_record =
            sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE candidate_id = ?1")
                .bind(candidate_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(Some(CandidateWithMatch {
            candidate,
            match_record,
        }))
    }

    /// Rejects a viewed (or still pending) candidate and returns the new head
    /// of the queue.
    pub async fn reject(&self, candidate_id: i64) -> Result<Option<CandidateWithMatch>> {
        let candidate = self
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        let transitioned = self
            .transition(
                candidate_id,
                &[CandidateStatus::Pending, CandidateStatus::Viewed],
                CandidateStatus::Rejected,
            )
            .await?;
        if !transitioned {
            return Err(Error::BadRequest(format!(
                "Candidate {} cannot be rejected from status '{}'",
                candidate_id, candidate.status
            )));
        }

        self.next(candidate.job_id).await
    }

    /// Status counts for a job, computed fresh from the candidate rows.
    pub async fn stats(&self, job_id: i64) -> Result<StatsResponse> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END) as pending,
                SUM(CASE WHEN status = 'viewed' THEN 1 ELSE 0 END) as viewed,
                SUM(CASE WHEN status = 'accepted' THEN 1 ELSE 0 END) as accepted,
                SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END) as rejected,
                SUM(CASE WHEN status = 'contacted' THEN 1 ELSE 0 END) as contacted
            FROM candidates
            WHERE job_id = ?1
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(StatsResponse {
            total: row.try_get::<i64, _>("total")?,
            pending: row.try_get::<Option<i64>, _>("pending")?.unwrap_or(0),
            viewed: row.try_get::<Option<i64>, _>("viewed")?.unwrap_or(0),
            accepted: row.try_get::<Option<i64>, _>("accepted")?.unwrap_or(0),
            rejected: row.try_get::<Option<i64>, _>("rejected")?.unwrap_or(0),
            contacted: row.try_get::<Option<i64>, _>("contacted")?.unwrap_or(0),
        })
    }

    pub async fn get_candidate(&self, id: i64) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    /// Conditional status advance. Returns false when the candidate was not
    /// in one of the expected source states, leaving the row untouched.
    pub async fn transition(
        &self,
        candidate_id: i64,
        from: &[CandidateStatus],
        to: CandidateStatus,
    ) -> Result<bool> {
        let placeholders = from
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE candidates SET status = ?1 WHERE id = ?2 AND status IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(to.as_str()).bind(candidate_id);
        for status in from {
            query = query.bind(status.as_str());
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
