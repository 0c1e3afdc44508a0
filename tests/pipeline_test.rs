mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use sqlx::Row;

use recruiter_backend::error::Result;
use recruiter_backend::models::job::Job;
use recruiter_backend::services::generation::{CandidateProfile, GenerationService, RankingEntry};

#[tokio::test]
async fn full_run_persists_batch_and_matches() {
    let pool = setup_pool().await;
    let job_id = seed_job(&pool).await;
    let state = state_with(
        pool.clone(),
        StubGeneration::default(),
        StubDelivery { succeed: true },
    );

    state
        .pipeline_service
        .run(job_id, 5)
        .await
        .expect("pipeline run");

    assert_eq!(count_rows(&pool, "candidates", job_id).await, 5);
    assert_eq!(count_rows(&pool, "matches", job_id).await, 5);

    let ranks: Vec<i64> = sqlx::query(
        "SELECT rank_position FROM matches WHERE job_id = ?1 ORDER BY rank_position",
    )
    .bind(job_id)
    .fetch_all(&pool)
    .await
    .expect("ranks")
    .iter()
    .map(|r| r.try_get("rank_position").expect("rank column"))
    .collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn invalid_ranking_index_is_dropped_without_renumbering() {
    let pool = setup_pool().await;
    let job_id = seed_job(&pool).await;
    let state = state_with(
        pool.clone(),
        StubGeneration {
            ranking: Some(vec![
                ranking_entry(4, 95),
                ranking_entry(0, 88),
                ranking_entry(9, 80),
                ranking_entry(2, 71),
            ]),
            ..Default::default()
        },
        StubDelivery { succeed: true },
    );

    state
        .pipeline_service
        .run(job_id, 5)
        .await
        .expect("pipeline run");

    assert_eq!(count_rows(&pool, "candidates", job_id).await, 5);
    assert_eq!(count_rows(&pool, "matches", job_id).await, 3);

    // The dropped entry leaves a gap at position 3.
    let rows = sqlx::query(
        r#"
        SELECT c.name as name, m.rank_position as rank_position
        FROM matches m JOIN candidates c ON c.id = m.candidate_id
        WHERE m.job_id = ?1 ORDER BY m.rank_position
        "#,
    )
    .bind(job_id)
    .fetch_all(&pool)
    .await
    .expect("match rows");

    let ranked: Vec<(String, i64)> = rows
        .iter()
        .map(|r| {
            (
                r.try_get("name").expect("name"),
                r.try_get("rank_position").expect("rank"),
            )
        })
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Candidate 4".to_string(), 1),
            ("Candidate 0".to_string(), 2),
            ("Candidate 2".to_string(), 4),
        ]
    );
}

#[tokio::test]
async fn missing_job_aborts_silently() {
    let pool = setup_pool().await;
    let state = state_with(
        pool.clone(),
        StubGeneration::default(),
        StubDelivery { succeed: true },
    );

    state
        .pipeline_service
        .run(4242, 5)
        .await
        .expect("missing job is not an error");

    assert_eq!(count_rows(&pool, "candidates", 4242).await, 0);
}

#[tokio::test]
async fn ranking_failure_leaves_orphaned_pending_candidates() {
    let pool = setup_pool().await;
    let job_id = seed_job(&pool).await;
    let state = state_with(
        pool.clone(),
        StubGeneration {
            fail_ranking: true,
            ..Default::default()
        },
        StubDelivery { succeed: true },
    );

    let result = state.pipeline_service.run(job_id, 5).await;
    assert!(result.is_err());

    // Stage 1 committed, stage 2 never did: pending candidates, no matches.
    assert_eq!(count_rows(&pool, "candidates", job_id).await, 5);
    assert_eq!(count_rows(&pool, "matches", job_id).await, 0);
    let pending: i64 = sqlx::query(
        "SELECT COUNT(*) as n FROM candidates WHERE job_id = ?1 AND status = 'pending'",
    )
    .bind(job_id)
    .fetch_one(&pool)
    .await
    .expect("pending count")
    .try_get("n")
    .expect("count");
    assert_eq!(pending, 5);
}

/// Delegates to the default stub but tracks whether two generation calls for
/// the same service ever overlap in time.
struct OverlapProbe {
    inner: StubGeneration,
    active: Arc<AtomicUsize>,
    overlapped: Arc<AtomicBool>,
}

#[async_trait]
impl GenerationService for OverlapProbe {
    async fn generate_candidates(&self, job: &Job, count: u32) -> Result<Vec<CandidateProfile>> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
        let profiles = self.inner.generate_candidates(job, count).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        profiles
    }

    async fn rank_candidates(
        &self,
        job: &Job,
        candidates: &[CandidateProfile],
    ) -> Result<Vec<RankingEntry>> {
        self.inner.rank_candidates(job, candidates).await
    }

    async fn write_pitch(
        &self,
        job: &Job,
        candidate: &recruiter_backend::models::candidate::Candidate,
        match_record: &recruiter_backend::models::match_record::Match,
    ) -> Result<recruiter_backend::services::generation::EmailPitch> {
        self.inner.write_pitch(job, candidate, match_record).await
    }
}

#[tokio::test]
async fn concurrent_runs_for_one_job_serialize() {
    let pool = setup_pool().await;
    let job_id = seed_job(&pool).await;
    let overlapped = Arc::new(AtomicBool::new(false));
    let probe = OverlapProbe {
        inner: StubGeneration::default(),
        active: Arc::new(AtomicUsize::new(0)),
        overlapped: overlapped.clone(),
    };
    let state = state_with(pool.clone(), probe, StubDelivery { succeed: true });

    let (first, second) = tokio::join!(
        state.pipeline_service.run(job_id, 2),
        state.pipeline_service.run(job_id, 2)
    );
    first.expect("first run");
    second.expect("second run");

    assert!(!overlapped.load(Ordering::SeqCst));
    assert_eq!(count_rows(&pool, "candidates", job_id).await, 4);
    assert_eq!(count_rows(&pool, "matches", job_id).await, 4);
}

#[tokio::test]
async fn generation_failure_persists_nothing() {
    let pool = setup_pool().await;
    let job_id = seed_job(&pool).await;
    let state = state_with(
        pool.clone(),
        StubGeneration {
            fail_generation: true,
            ..Default::default()
        },
        StubDelivery { succeed: true },
    );

    let result = state.pipeline_service.run(job_id, 5).await;
    assert!(result.is_err());
    assert_eq!(count_rows(&pool, "candidates", job_id).await, 0);
    assert_eq!(count_rows(&pool, "matches", job_id).await, 0);
}
