use serde::{Deserialize, Serialize};

use crate::dto::job_dto::StatsResponse;
use crate::models::candidate::Candidate;
use crate::models::match_record::Match;
use crate::services::generation::EmailPitch;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateWithMatch {
    pub candidate: Candidate,
    #[serde(rename = "match")]
    pub match_record: Match,
}

#[derive(Debug, Serialize)]
pub struct NextCandidateResponse {
    pub candidate: Option<Candidate>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_record: Option<Match>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RejectResponse {
    pub status: String,
    pub next_candidate: Option<CandidateWithMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub status: String,
    pub pitch: EmailPitch,
    pub delivery_message: String,
}
