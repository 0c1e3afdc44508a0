use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::dto::job_dto::CreateJobPayload;
use crate::error::Result;
use crate::models::job::Job;

#[derive(Clone)]
pub struct JobService {
    pool: SqlitePool,
}

impl JobService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_job(&self, payload: CreateJobPayload) -> Result<Job> {
        let created_at = Utc::now();
        let skills_json = serde_json::to_string(&payload.required_skills)?;
        let row = sqlx::query(
            r#"
            INSERT INTO jobs (title, description, required_skills, experience_level, location, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&skills_json)
        .bind(&payload.experience_level)
        .bind(&payload.location)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        let id: i64 = row.try_get("id")?;

        Ok(Job {
            id,
            title: payload.title,
            description: payload.description,
            required_skills: payload.required_skills,
            experience_level: payload.experience_level,
            location: payload.location,
            created_at,
        })
    }

    pub async fn get_job(&self, id: i64) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }
}
