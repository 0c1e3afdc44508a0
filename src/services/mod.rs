pub mod delivery;
pub mod generation;
pub mod job_service;
pub mod outreach_service;
pub mod pipeline_service;
pub mod triage_service;
