use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::Result;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::match_record::Match;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub current_role: String,
    pub current_company: String,
    pub years_experience: i64,
    pub skills: Vec<String>,
    pub location: String,
    pub email: String,
    pub linkedin_summary: String,
}

/// One scored entry of a ranking result, ordered best-first by the service.
/// `candidate_index` echoes the 0-based batch index assigned in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub candidate_index: i64,
    pub score: i64,
    pub key_highlights: Vec<String>,
    pub fit_reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPitch {
    pub subject: String,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_candidates(&self, job: &Job, count: u32) -> Result<Vec<CandidateProfile>>;

    async fn rank_candidates(
        &self,
        job: &Job,
        candidates: &[CandidateProfile],
    ) -> Result<Vec<RankingEntry>>;

    async fn write_pitch(
        &self,
        job: &Job,
        candidate: &Candidate,
        match_record: &Match,
    ) -> Result<EmailPitch>;
}

#[derive(Clone)]
pub struct OpenAiGeneration {
    client: Client,
    api_key: String,
}

impl OpenAiGeneration {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { client, api_key }
    }

    async fn chat(&self, payload: JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OpenAI API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response format").into())
    }
}

/// Accepts either a bare JSON array or an object wrapping the array under
/// `key`; models in JSON mode return both shapes.
fn extract_array(raw: &JsonValue, key: &str) -> Result<Vec<JsonValue>> {
    if let Some(arr) = raw.get(key).and_then(|a| a.as_array()) {
        return Ok(arr.clone());
    }
    if let Some(arr) = raw.as_array() {
        return Ok(arr.clone());
    }
    Err(anyhow::anyhow!("Expected a JSON array under '{}'", key).into())
}

#[async_trait]
impl GenerationService for OpenAiGeneration {
    async fn generate_candidates(&self, job: &Job, count: u32) -> Result<Vec<CandidateProfile>> {
        let system_prompt = "You are a technical sourcing specialist. Generate realistic mock \
            candidate profiles for the given job. Create a diverse pool with varied fit levels: \
            roughly 40% strong fits, 40% medium fits, 20% weak fits. Vary career backgrounds, \
            skill combinations, years of experience, locations, and company sizes. \
            Return a JSON object with a 'candidates' array; each entry has fields: name, \
            current_role, current_company, years_experience (integer), skills (string array), \
            location, email, linkedin_summary.";

        let user_data = serde_json::json!({
            "count": count,
            "job_title": job.title,
            "required_skills": job.required_skills,
            "experience_level": job.experience_level,
            "location": job.location,
        });

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": serde_json::to_string(&user_data)?}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.8
        });

        let resp = self.chat(payload).await?;
        let entries = extract_array(&resp, "candidates")?;
        let profiles: Vec<CandidateProfile> =
            serde_json::from_value(JsonValue::Array(entries))?;
        Ok(profiles)
    }

    async fn rank_candidates(
        &self,
        job: &Job,
        candidates: &[CandidateProfile],
    ) -> Result<Vec<RankingEntry>> {
        // Each candidate carries its batch index explicitly so the returned
        // candidate_index can be validated instead of trusting array order.
        let candidates_text = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "Candidate Index {} (Name: {}):\nRole: {} at {}\nExperience: {} years\n\
                     Skills: {}\nLocation: {}\nSummary: {}",
                    i,
                    c.name,
                    c.current_role,
                    c.current_company,
                    c.years_experience,
                    c.skills.join(", "),
                    c.location,
                    c.linkedin_summary
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let system_prompt = "You are an expert recruiter. Score every candidate against the job \
            (0-100), with 3-4 key highlights and a 2-3 sentence fit reasoning each. Consider \
            skill match, seniority, location compatibility, role relevance, and career \
            trajectory. Use the exact candidate_index shown for each candidate (0-based). \
            Return a JSON object with a 'matches' array ordered by score, highest first; each \
            entry has fields: candidate_index (integer), score (integer), key_highlights \
            (string array), fit_reasoning.";

        let user_content = format!(
            "Job Requirements:\nTitle: {}\nRequired Skills: {}\nExperience Level: {}\n\
             Location: {}\n\nCandidates:\n{}",
            job.title,
            job.required_skills.join(", "),
            job.experience_level,
            job.location,
            candidates_text
        );

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ],
            "response_format": { "type": "json_object" }
        });

        let resp = self.chat(payload).await?;
        let entries = extract_array(&resp, "matches")?;
        let rankings: Vec<RankingEntry> = serde_json::from_value(JsonValue::Array(entries))?;
        Ok(rankings)
    }

    async fn write_pitch(
        &self,
        job: &Job,
        candidate: &Candidate,
        match_record: &Match,
    ) -> Result<EmailPitch> {
        let highlights = match_record
            .key_highlights
            .iter()
            .map(|h| format!("- {}", h))
            .collect::<Vec<_>>()
            .join("\n");

        let system_prompt = "You are a recruiter writing a personalized outreach email. Address \
            the candidate by name, reference their specific background, explain why the role \
            fits them, highlight 1-2 of their matching strengths, keep it to 3-4 short \
            paragraphs, and end with a clear call-to-action. Professional but warm tone. \
            Return a JSON object with 'subject' and 'body' fields.";

        let user_content = format!(
            "Job:\nTitle: {}\nLocation: {}\n\nCandidate:\nName: {}\nCurrent Role: {} at {}\n\
             Experience: {} years\nSkills: {}\nBackground: {}\n\nWhy They're a Good Fit:\n{}\n\n\
             Match Score: {}/100",
            job.title,
            job.location,
            candidate.name,
            candidate.current_role,
            candidate.current_company,
            candidate.years_experience,
            candidate.skills.join(", "),
            candidate.linkedin_summary,
            highlights,
            match_record.score
        );

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ],
            "response_format": { "type": "json_object" }
        });

        let resp = self.chat(payload).await?;
        let pitch: EmailPitch = serde_json::from_value(resp)?;
        Ok(pitch)
    }
}
