//! HTTP routes
//!
//! Everything except `/health` lives under `/api`. Successful JSON bodies
//! use the `{success, message, data}` envelope.

pub mod auth;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use moneymon_domain::constants::API_PREFIX;
use serde::Serialize;

use crate::context::AppContext;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

/// Wrap `data` in a success envelope.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Json<Envelope<T>> {
    Json(Envelope { success: true, message: message.into(), data })
}

/// Build the application router.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let api = Router::new()
        .route("/auth/{provider}/url", get(auth::authorization_url))
        .route("/auth/google/token", post(auth::google_token))
        .route("/auth/{provider}/callback", get(auth::callback))
        .route("/auth/me", get(auth::me))
        .route("/login/{provider}", post(auth::direct_login));

    Router::new()
        .route("/health", get(health::health))
        .nest(API_PREFIX, api)
        .with_state(ctx)
}
