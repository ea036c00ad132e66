//! Cart API Module
//!
//! Read-only view of the caller's cart. Adding and removing lines is handled
//! elsewhere.

use axum::{Router, extract::State, routing::get};
use shared::models::CartSummary;
use shared::{ApiResponse, AppResult};

use crate::auth::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cart", get(get_cart))
}

async fn get_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<CartSummary>> {
    let customer = user.require_customer()?;
    Ok(ApiResponse::success(state.orders.get_cart(customer).await?))
}
