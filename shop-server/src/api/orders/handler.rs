//! Order API Handlers

use axum::extract::{Path, Query, State};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::models::Receipt;
use shared::{ApiResponse, AppResult, Page, PageQuery, PaginatedResponse};
use validator::Validate;

use crate::api::extract::{ValidatedJson, not_blank};
use crate::auth::CurrentUser;
use crate::orders::CheckoutInput;
use crate::state::AppState;

/// Checkout request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub address_id: i64,
    #[validate(length(max = 64), custom(function = "not_blank"))]
    pub payment_method: String,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[validate(length(max = 64))]
    pub voucher_code: Option<String>,
}

/// Check out the caller's cart
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, ApiResponse<Receipt>)> {
    let customer = user.require_customer()?;
    let receipt = state
        .orders
        .create_order(
            customer,
            CheckoutInput {
                address_id: req.address_id,
                payment_method: req.payment_method,
                note: req.note,
                voucher_code: req.voucher_code,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::success(receipt)))
}

/// Caller's order history (paginated)
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<PaginatedResponse<Receipt>>> {
    let customer = user.require_customer()?;
    let page = Page::from(query);
    let (receipts, total) = state.orders.list_order_history(customer, page).await?;
    Ok(ApiResponse::success(PaginatedResponse::new(
        receipts,
        total,
        page.page,
        page.per_page,
    )))
}

/// One of the caller's orders
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Receipt>> {
    let customer = user.require_customer()?;
    let receipt = state.orders.get_order_detail(id, customer).await?;
    Ok(ApiResponse::success(receipt))
}
