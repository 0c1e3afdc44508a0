pub mod job_dto;
pub mod triage_dto;
