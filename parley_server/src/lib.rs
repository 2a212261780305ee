use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod db;
pub mod state;
pub mod response;
pub mod notify;
pub mod service;
pub mod watcher;
pub mod results;
pub mod live;
pub mod scoring;
pub mod catalog;
pub mod proficiency;
pub mod commands;

use state::AppState;


pub async fn app_with_state(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(results::router())
                .merge(live::router())
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn app(config: &config::Config) -> Result<Router, anyhow::Error> {
    let state = AppState::new(config).await?;
    Ok(app_with_state(state).await)
}
