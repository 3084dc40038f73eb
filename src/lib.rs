use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use serde_json::{Value, json};

use state::AppState;

pub mod auth;
pub mod chat;
pub mod error;
pub mod group;
pub mod integration;
pub mod state;
pub mod user;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Full route tree. Everything under `/api` requires a session except the
/// public group listing.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(group::api(state.clone()))
        .merge(chat::api(state.clone()))
        .route_layer(from_fn_with_state(
            state.clone(),
            auth::middleware::authorize,
        ));

    let api = Router::new()
        .merge(protected)
        .merge(group::public(state));

    Router::new().route("/", get(health)).nest("/api", api)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "API is running" }))
}
