//! Address API Module
//!
//! The caller's own delivery addresses. Customer-only.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/addresses", get(handler::list).post(handler::create))
        .route(
            "/api/addresses/{id}",
            put(handler::update).delete(handler::delete),
        )
        .route("/api/addresses/{id}/default", put(handler::set_default))
}
