use std::sync::Arc;

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::error::{Error, Result};
use crate::models::candidate::CandidateStatus;
use crate::models::job::Job;
use crate::models::match_record::Match;
use crate::models::outreach::DeliveryStatus;
use crate::services::delivery::DeliveryService;
use crate::services::generation::{EmailPitch, GenerationService};
use crate::services::triage_service::TriageService;

#[derive(Debug, Clone)]
pub struct AcceptOutcome {
    pub delivered: bool,
    pub pitch: EmailPitch,
    pub delivery_message: String,
}

/// Accept flow: mark the candidate accepted, generate a pitch, record the
/// outreach attempt, and reconcile the delivery outcome. A failed send leaves
/// the candidate `accepted`, never back in the serving queue.
#[derive(Clone)]
pub struct OutreachService {
    pool: SqlitePool,
    generation: Arc<dyn GenerationService>,
    delivery: Arc<dyn DeliveryService>,
    triage: TriageService,
}

impl OutreachService {
    pub fn new(
        pool: SqlitePool,
        generation: Arc<dyn GenerationService>,
        delivery: Arc<dyn DeliveryService>,
    ) -> Self {
        let triage = TriageService::new(pool.clone());
        Self {
            pool,
            generation,
            delivery,
            triage,
        }
    }

    pub async fn accept(&self, candidate_id: i64) -> Result<AcceptOutcome> {
        let candidate = self
            .triage
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        let match_record =
            sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE candidate_id = ?1")
                .bind(candidate_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::Internal("Match data not found".to_string()))?;

        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?1")
            .bind(candidate.job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;

        // Accepted before any remote call, so a failed pitch generation or
        // send can never leave the candidate pending or viewed. Re-accepting
        // an accepted candidate is allowed so a failed delivery can be
        // retried; duplicate-send protection lives on the outreach insert.
        let transitioned = self
            .triage
            .transition(
                candidate_id,
                &[
                    CandidateStatus::Pending,
                    CandidateStatus::Viewed,
                    CandidateStatus::Accepted,
                ],
                CandidateStatus::Accepted,
            )
            .await?;
        if !transitioned {
            return Err(Error::BadRequest(format!(
                "Candidate {} cannot be accepted from status '{}'",
                candidate_id, candidate.status
            )));
        }

        tracing::info!(candidate_id, "generating pitch");
        let pitch = self
            .generation
            .write_pitch(&job, &candidate, &match_record)
            .await?;

        let outreach_id = self
            .create_outreach(candidate.job_id, candidate_id, &pitch)
            .await?;

        let outcome = self
            .delivery
            .send(&candidate.email, &pitch.subject, &pitch.body)
            .await;

        if outcome.success {
            sqlx::query("UPDATE outreach SET delivery_status = ?1, sent_at = ?2 WHERE id = ?3")
                .bind(DeliveryStatus::Sent.as_str())
                .bind(Utc::now())
                .bind(outreach_id)
                .execute(&self.pool)
                .await?;
            self.triage
                .transition(
                    candidate_id,
                    &[CandidateStatus::Accepted],
                    CandidateStatus::Contacted,
                )
                .await?;
        } else {
            tracing::warn!(candidate_id, message = %outcome.message, "outreach delivery failed");
            sqlx::query("UPDATE outreach SET delivery_status = ?1, error_message = ?2 WHERE id = ?3")
                .bind(DeliveryStatus::Failed.as_str())
                .bind(&outcome.message)
                .bind(outreach_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(AcceptOutcome {
            delivered: outcome.success,
            pitch,
            delivery_message: outcome.message,
        })
    }

    /// Claims the candidate's one allowed send. The existence check and the
    /// insert are a single statement, so two concurrent accepts can never
    /// both create an in-flight outreach row; only a `failed` attempt frees
    /// the candidate for another one.
    async fn create_outreach(
        &self,
        job_id: i64,
        candidate_id: i64,
        pitch: &EmailPitch,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO outreach (job_id, candidate_id, subject, body, delivery_status, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE NOT EXISTS (
                SELECT 1 FROM outreach
                WHERE candidate_id = ?2 AND delivery_status IN (?5, ?7)
            )
            RETURNING id
            "#,
        )
        .bind(job_id)
        .bind(candidate_id)
        .bind(&pitch.subject)
        .bind(&pitch.body)
        .bind(DeliveryStatus::Pending.as_str())
        .bind(Utc::now())
        .bind(DeliveryStatus::Sent.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.try_get("id")?),
            None => Err(Error::BadRequest(format!(
                "Candidate {} already has outreach in flight or delivered",
                candidate_id
            ))),
        }
    }
}
