pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use reqwest::Client;
use sqlx::SqlitePool;

use crate::services::{
    delivery::{DeliveryService, LoggedDelivery},
    generation::{GenerationService, OpenAiGeneration},
    job_service::JobService,
    outreach_service::OutreachService,
    pipeline_service::PipelineService,
    triage_service::TriageService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub job_service: JobService,
    pub triage_service: TriageService,
    pub pipeline_service: PipelineService,
    pub outreach_service: OutreachService,
    pub initial_batch_size: u32,
    pub source_more_batch_size: u32,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> crate::error::Result<Self> {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let generation: Arc<dyn GenerationService> = Arc::new(OpenAiGeneration::new(
            config.openai_api_key.clone(),
            http_client,
        ));
        let delivery: Arc<dyn DeliveryService> = Arc::new(LoggedDelivery);

        let mut state = Self::with_services(pool, generation, delivery);
        state.initial_batch_size = config.initial_batch_size;
        state.source_more_batch_size = config.source_more_batch_size;
        Ok(state)
    }

    /// Assembles the state from explicit collaborators; tests use this with
    /// stub generation and delivery services.
    pub fn with_services(
        pool: SqlitePool,
        generation: Arc<dyn GenerationService>,
        delivery: Arc<dyn DeliveryService>,
    ) -> Self {
        let job_service = JobService::new(pool.clone());
        let triage_service = TriageService::new(pool.clone());
        let pipeline_service = PipelineService::new(pool.clone(), generation.clone());
        let outreach_service = OutreachService::new(pool.clone(), generation, delivery);

        Self {
            pool,
            job_service,
            triage_service,
            pipeline_service,
            outreach_service,
            initial_batch_size: 25,
            source_more_batch_size: 15,
        }
    }
}
