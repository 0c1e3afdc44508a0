use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use recruiter_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::rate_limit::{action_middleware, new_action_state, RateGuard},
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool)?;

    let guard = RateGuard::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    let base_routes = Router::new().route("/health", get(routes::health::health));

    // Each caller-facing action is rate-limited on its own (action, caller)
    // key, so a burst of rejects cannot starve job creation.
    let api = Router::new()
        .merge(
            Router::new()
                .route("/api/jobs", post(routes::job_routes::create_job))
                .route_layer(axum::middleware::from_fn_with_state(
                    new_action_state(&guard, "create_job"),
                    action_middleware,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/jobs/:job_id/source-more",
                    post(routes::job_routes::source_more),
                )
                .route_layer(axum::middleware::from_fn_with_state(
                    new_action_state(&guard, "source_more"),
                    action_middleware,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/jobs/:job_id/candidates",
                    get(routes::job_routes::next_candidate),
                )
                .route_layer(axum::middleware::from_fn_with_state(
                    new_action_state(&guard, "next_candidate"),
                    action_middleware,
                )),
        )
        .merge(
            Router::new()
                .route("/api/jobs/:job_id/stats", get(routes::job_routes::job_stats))
                .route_layer(axum::middleware::from_fn_with_state(
                    new_action_state(&guard, "job_stats"),
                    action_middleware,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/candidates/:candidate_id/accept",
                    put(routes::candidate_routes::accept_candidate),
                )
                .route_layer(axum::middleware::from_fn_with_state(
                    new_action_state(&guard, "accept"),
                    action_middleware,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/candidates/:candidate_id/reject",
                    put(routes::candidate_routes::reject_candidate),
                )
                .route_layer(axum::middleware::from_fn_with_state(
                    new_action_state(&guard, "reject"),
                    action_middleware,
                )),
        );

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
