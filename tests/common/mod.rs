#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use recruiter_backend::error::Result;
use recruiter_backend::models::candidate::Candidate;
use recruiter_backend::models::job::Job;
use recruiter_backend::models::match_record::Match;
use recruiter_backend::services::delivery::{DeliveryOutcome, DeliveryService};
use recruiter_backend::services::generation::{
    CandidateProfile, EmailPitch, GenerationService, RankingEntry,
};
use recruiter_backend::AppState;

pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

pub fn state_with(
    pool: SqlitePool,
    generation: impl GenerationService + 'static,
    delivery: impl DeliveryService + 'static,
) -> AppState {
    AppState::with_services(pool, Arc::new(generation), Arc::new(delivery))
}

pub async fn seed_job(pool: &SqlitePool) -> i64 {
    let row = sqlx::query(
        r#"
        INSERT INTO jobs (title, description, required_skills, experience_level, location, created_at)
        VALUES ('Backend Engineer', 'Build services', '["Go","SQL"]', 'Senior', 'Remote', ?1)
        RETURNING id
        "#,
    )
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .expect("seed job");
    row.try_get("id").expect("job id")
}

pub async fn seed_candidate(pool: &SqlitePool, job_id: i64, name: &str, status: &str) -> i64 {
    let row = sqlx::query(
        r#"
        INSERT INTO candidates
            (job_id, name, current_role, current_company, years_experience,
             skills, location, email, linkedin_summary, status, created_at)
        VALUES (?1, ?2, 'Engineer', 'Acme', 5, '["Go"]', 'Remote', ?3, 'Summary', ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(name)
    .bind(format!("{}@example.com", name.to_lowercase().replace(' ', ".")))
    .bind(status)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .expect("seed candidate");
    row.try_get("id").expect("candidate id")
}

pub async fn seed_match(pool: &SqlitePool, job_id: i64, candidate_id: i64, score: i64, rank: i64) {
    sqlx::query(
        r#"
        INSERT INTO matches (job_id, candidate_id, score, key_highlights, fit_reasoning, rank_position, created_at)
        VALUES (?1, ?2, ?3, '["Strong skill match"]', 'Solid fit', ?4, ?5)
        "#,
    )
    .bind(job_id)
    .bind(candidate_id)
    .bind(score)
    .bind(rank)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed match");
}

pub async fn candidate_status(pool: &SqlitePool, candidate_id: i64) -> String {
    sqlx::query("SELECT status FROM candidates WHERE id = ?1")
        .bind(candidate_id)
        .fetch_one(pool)
        .await
        .expect("candidate row")
        .try_get("status")
        .expect("status column")
}

pub async fn count_rows(pool: &SqlitePool, table: &str, job_id: i64) -> i64 {
    let sql = format!("SELECT COUNT(*) as n FROM {} WHERE job_id = ?1", table);
    sqlx::query(&sql)
        .bind(job_id)
        .fetch_one(pool)
        .await
        .expect("count query")
        .try_get("n")
        .expect("count column")
}

/// Deterministic generation stub: profiles named by batch index, ranking
/// either scripted or identity order with descending scores.
#[derive(Default)]
pub struct StubGeneration {
    pub ranking: Option<Vec<RankingEntry>>,
    pub fail_generation: bool,
    pub fail_ranking: bool,
}

#[async_trait]
impl GenerationService for StubGeneration {
    async fn generate_candidates(&self, job: &Job, count: u32) -> Result<Vec<CandidateProfile>> {
        if self.fail_generation {
            return Err(anyhow::anyhow!("generation service unavailable").into());
        }
        Ok((0..count)
            .map(|i| CandidateProfile {
                name: format!("Candidate {}", i),
                current_role: "Engineer".to_string(),
                current_company: format!("Company {}", i),
                years_experience: 3 + i as i64,
                skills: job.required_skills.clone(),
                location: job.location.clone(),
                email: format!("candidate{}@example.com", i),
                linkedin_summary: "Experienced engineer".to_string(),
            })
            .collect())
    }

    async fn rank_candidates(
        &self,
        _job: &Job,
        candidates: &[CandidateProfile],
    ) -> Result<Vec<RankingEntry>> {
        if self.fail_ranking {
            return Err(anyhow::anyhow!("ranking service unavailable").into());
        }
        if let Some(ranking) = &self.ranking {
            return Ok(ranking.clone());
        }
        Ok(candidates
            .iter()
            .enumerate()
            .map(|(i, _)| RankingEntry {
                candidate_index: i as i64,
                score: 90 - i as i64,
                key_highlights: vec!["Strong skill match".to_string()],
                fit_reasoning: "Good overall fit".to_string(),
            })
            .collect())
    }

    async fn write_pitch(
        &self,
        job: &Job,
        candidate: &Candidate,
        _match_record: &Match,
    ) -> Result<EmailPitch> {
        Ok(EmailPitch {
            subject: format!("{} opportunity", job.title),
            body: format!("Hi {}, we have a role for you.", candidate.name),
        })
    }
}

pub fn ranking_entry(index: i64, score: i64) -> RankingEntry {
    RankingEntry {
        candidate_index: index,
        score,
        key_highlights: vec!["Relevant experience".to_string()],
        fit_reasoning: "Scripted ranking".to_string(),
    }
}

pub struct StubDelivery {
    pub succeed: bool,
}

#[async_trait]
impl DeliveryService for StubDelivery {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> DeliveryOutcome {
        if self.succeed {
            DeliveryOutcome {
                success: true,
                message: "Email logged (stub)".to_string(),
            }
        } else {
            DeliveryOutcome {
                success: false,
                message: "SMTP connection refused".to_string(),
            }
        }
    }
}
