//! JSON extractor that validates the body before the handler runs

use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Deserialized and validated JSON body
///
/// Malformed JSON and field validation failures both become
/// [`ApiError::Validation`], so clients always get the standard error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::Validation(rejection.body_text()))?;

        data.validate()?;
        Ok(Self(data))
    }
}
