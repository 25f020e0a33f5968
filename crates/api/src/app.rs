use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{emails, health, jobs, reputation, tracking, warmup, webhooks};
use crate::services::{CheckedResolver, DeliveryService, EmailService, RetryRunner};
use persistence::repositories::{EmailTrackingRepository, PricingGuideRepository};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub resolver: CheckedResolver,
    pub delivery: Arc<DeliveryService>,
    pub retry_runner: Arc<RetryRunner>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, resolver: CheckedResolver) -> Self {
        let config = Arc::new(config);
        let email = EmailService::new(config.email.clone());

        let delivery = Arc::new(DeliveryService::new(
            email.clone(),
            EmailTrackingRepository::new(pool.clone()),
            PricingGuideRepository::new(pool.clone()),
            &config.email.sender_email,
        ));

        let retry_runner = Arc::new(RetryRunner::new(
            EmailTrackingRepository::new(pool.clone()),
            email,
            config.retry.clone(),
        ));

        Self {
            pool,
            config,
            resolver,
            delivery,
            retry_runner,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    // Pipeline endpoints are public by design: the pixel and unsubscribe
    // links land in recipients' mail clients, and the webhook comes from the
    // provider (verified by signature when a secret is configured).
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/track/open", get(tracking::track_open))
        .route("/api/unsubscribe", get(tracking::unsubscribe))
        .route("/api/webhooks/email-events", post(webhooks::email_events));

    let v1_routes = Router::new()
        .route("/api/v1/emails/send", post(emails::send_email))
        .route("/api/v1/pricing-guide", post(emails::request_pricing_guide))
        .route("/api/v1/jobs/email-retry", post(jobs::run_email_retry))
        .route("/api/v1/reputation/blacklist", post(reputation::check_blacklist))
        .route(
            "/api/v1/reputation/authentication",
            post(reputation::check_authentication),
        )
        .route("/api/v1/warmup/schedules", post(warmup::create_schedule));

    let request_timeout = state.config.server.request_timeout_secs;

    Router::new()
        .merge(public_routes)
        .merge(v1_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout)))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
