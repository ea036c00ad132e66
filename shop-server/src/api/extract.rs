//! Request extractors

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::AppError;
use validator::{Validate, ValidationError, ValidationErrors};

/// JSON body that has passed `validator` rules.
///
/// Malformed JSON gives `InvalidRequest`; rule violations give
/// `ValidationFailed` with the failing rule codes per field in `details`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::invalid_request(e.body_text()))?;
        value.validate().map_err(validation_error)?;
        Ok(Self(value))
    }
}

/// `validator` rule: rejects strings that are empty after trimming
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validation_error(errors: ValidationErrors) -> AppError {
    let mut err = AppError::validation("Validation failed");
    for (field, field_errors) in errors.field_errors() {
        let codes: Vec<Value> = field_errors
            .iter()
            .map(|e| Value::from(e.code.to_string()))
            .collect();
        err = err.with_detail(field.to_string(), codes);
    }
    err
}
