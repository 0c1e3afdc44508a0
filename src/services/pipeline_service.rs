use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::services::generation::{CandidateProfile, GenerationService};

/// Two-stage sourcing pipeline: generate a candidate batch, persist it, then
/// rank the in-memory batch and persist one match per valid ranking entry.
/// Runs detached from the triggering request; failures are logged by the
/// spawning task and never reach the original caller.
#[derive(Clone)]
pub struct PipelineService {
    pool: SqlitePool,
    generation: Arc<dyn GenerationService>,
    // Per-job execution locks so a source-more run cannot interleave with an
    // in-flight run for the same job.
    job_locks: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl PipelineService {
    pub fn new(pool: SqlitePool, generation: Arc<dyn GenerationService>) -> Self {
        Self {
            pool,
            generation,
            job_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn run(&self, job_id: i64, batch_size: u32) -> Result<()> {
        let lock = self.job_lock(job_id);
        let _guard = lock.lock().await;

        let Some(job) = sqlx::query_as::<_, crate::models::job::Job>(
            "SELECT * FROM jobs WHERE id = ?1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            tracing::warn!(job_id, "job not found, skipping pipeline run");
            return Ok(());
        };

        tracing::info!(job_id, title = %job.title, batch_size, "starting sourcing pipeline");

        let profiles = self.generation.generate_candidates(&job, batch_size).await?;
        tracing::info!(job_id, generated = profiles.len(), "candidate batch generated");

        // Order of this list is the contract for ranking-stage index lookup.
        let candidate_ids = self.persist_candidates(job_id, &profiles).await?;
        tracing::info!(job_id, saved = candidate_ids.len(), "candidate batch persisted");

        let rankings = self.generation.rank_candidates(&job, &profiles).await?;
        tracing::info!(job_id, ranked = rankings.len(), "ranking received");

        let mut persisted = 0usize;
        for (position, entry) in rankings.iter().enumerate() {
            // Rank position is the entry's place in the returned array; a
            // dropped invalid entry leaves a gap rather than renumbering.
            let rank_position = (position + 1) as i64;

            let Some(candidate_id) = usize::try_from(entry.candidate_index)
                .ok()
                .and_then(|idx| candidate_ids.get(idx).copied())
            else {
                tracing::warn!(
                    job_id,
                    candidate_index = entry.candidate_index,
                    "invalid candidate index in ranking, skipping entry"
                );
                continue;
            };

            sqlx::query(
                r#"
                INSERT INTO matches (job_id, candidate_id, score, key_highlights, fit_reasoning, rank_position, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(job_id)
            .bind(candidate_id)
            .bind(entry.score)
            .bind(serde_json::to_string(&entry.key_highlights)?)
            .bind(&entry.fit_reasoning)
            .bind(rank_position)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            persisted += 1;
        }

        tracing::info!(job_id, matches = persisted, "pipeline complete");
        Ok(())
    }

    async fn persist_candidates(
        &self,
        job_id: i64,
        profiles: &[CandidateProfile],
    ) -> Result<Vec<i64>> {
        let mut candidate_ids = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let row = sqlx::query(
                r#"
                INSERT INTO candidates
                    (job_id, name, current_role, current_company, years_experience,
                     skills, location, email, linkedin_summary, status, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10)
                RETURNING id
                "#,
            )
            .bind(job_id)
            .bind(&profile.name)
            .bind(&profile.current_role)
            .bind(&profile.current_company)
            .bind(profile.years_experience)
            .bind(serde_json::to_string(&profile.skills)?)
            .bind(&profile.location)
            .bind(&profile.email)
            .bind(&profile.linkedin_summary)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
            candidate_ids.push(row.try_get::<i64, _>("id")?);
        }
        Ok(candidate_ids)
    }

    fn job_lock(&self, job_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.job_locks.lock().expect("job lock map mutex poisoned");
        // An entry held only by the map belongs to no in-flight run; evicting
        // it keeps the map bounded to jobs currently sourcing.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(job_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
