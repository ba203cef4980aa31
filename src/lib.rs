pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::database::store::{create_store, JsonStore};
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::services::{
    execution_service::{CodeRunner, SubprocessRunner},
    grading_service::GradingService,
    question_service::QuestionService,
};

#[derive(Clone)]
pub struct AppState {
    pub question_service: QuestionService,
}

impl AppState {
    pub async fn new(config: &Config) -> error::Result<Self> {
        let store = create_store(config).await?;
        let runner = Arc::new(SubprocessRunner::new(config.python_bin.clone()));
        Ok(Self::with_runner(store, runner, config.execution_timeout))
    }

    pub fn with_runner(
        store: JsonStore,
        runner: Arc<dyn CodeRunner>,
        execution_timeout: Duration,
    ) -> Self {
        let grading = GradingService::new(runner, execution_timeout);
        Self {
            question_service: QuestionService::new(store, grading),
        }
    }
}

/// Builds the HTTP router with every QOTD endpoint.
pub fn app(state: AppState, public_rps: u32) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/openapi.json", get(routes::docs::openapi_json))
        .route("/today", get(routes::qotd::get_today))
        .route("/leaderboard", get(routes::qotd::leaderboard))
        .route("/submit", post(routes::qotd::submit))
        .route("/questions", post(routes::qotd::create_question))
        .route("/hints/:id", get(routes::qotd::get_hints))
        .route("/stats/:id", get(routes::qotd::get_stats))
        .route("/:id", get(routes::qotd::get_question))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::per_second(public_rps),
            rate_limit_middleware,
        ))
        .with_state(state)
        .layer(middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}
