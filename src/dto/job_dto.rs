use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub required_skills: Vec<String>,
    #[validate(length(min = 1))]
    pub experience_level: String,
    #[validate(length(min = 1))]
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobCreatedResponse {
    pub job_id: i64,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourcingResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total: i64,
    pub pending: i64,
    pub viewed: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub contacted: i64,
}
