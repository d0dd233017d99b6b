//! # Validated JSON Extractor
//!
//! `ValidatedJson<T>` deserializes the body like `Json<T>` and then runs
//! [`Validate::validate`], so handlers receive normalized input only. Malformed
//! JSON, missing fields and constraint failures all become 400 `Validation` errors.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use lib_core::dto::Validate;
use lib_core::AppError;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!("[VALIDATE] Rejected body: {}", rejection.body_text());
            AppError::Validation(rejection.body_text())
        })?;

        Ok(ValidatedJson(value.validate()?))
    }
}
