//! Request body extractors that reject with [`ApiError`] JSON bodies.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use rhub_models::validation_message;

use crate::error::{ApiError, ApiResult};

/// JSON body whose parse failures become 400 `{ message }` responses.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(e)) => Err(ApiError::Validation(e.body_text())),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// JSON body that must also pass its `validator` rules.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        validate_payload(&value)?;
        Ok(Self(value))
    }
}

/// Run a payload's validation rules, for payloads completed server-side.
pub fn validate_payload<T: Validate>(value: &T) -> ApiResult<()> {
    value
        .validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))
}
