//! Address API Handlers

use axum::extract::{Path, State};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::models::{Address, AddressInput};
use shared::{ApiResponse, AppResult};
use validator::Validate;

use crate::api::extract::{ValidatedJson, not_blank};
use crate::auth::CurrentUser;
use crate::state::AppState;

/// Create / update address body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressRequest {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub fullname: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 500), custom(function = "not_blank"))]
    pub address: String,
}

impl From<AddressRequest> for AddressInput {
    fn from(req: AddressRequest) -> Self {
        Self {
            fullname: req.fullname,
            email: req.email,
            address: req.address,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Address>>> {
    let customer = user.require_customer()?;
    Ok(ApiResponse::success(state.addresses.list(customer).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<AddressRequest>,
) -> AppResult<(StatusCode, ApiResponse<Address>)> {
    let customer = user.require_customer()?;
    let address = state.addresses.create(customer, req.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(address)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<AddressRequest>,
) -> AppResult<ApiResponse<Address>> {
    let customer = user.require_customer()?;
    let address = state.addresses.update(customer, id, req.into()).await?;
    Ok(ApiResponse::success(address))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    let customer = user.require_customer()?;
    state.addresses.delete(customer, id).await?;
    Ok(ApiResponse::ok())
}

/// Make this the caller's default delivery address
pub async fn set_default(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Address>> {
    let customer = user.require_customer()?;
    let address = state.addresses.set_default(customer, id).await?;
    Ok(ApiResponse::success(address))
}
