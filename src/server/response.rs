//! JSON response envelope and error mapping.
//!
//! Every JSON endpoint answers with
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "Template saved" }
//! { "success": false, "error": "Not found: template 'abc'" }
//! ```
//!
//! Malformed bodies and query strings are rejected with the same envelope
//! through the [`ApiJson`] and [`ApiQuery`] extractors.

use axum::{
    Json, async_trait,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::CardpressError;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `200 {"success": true, "data": data}`.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: None,
        error: None,
    })
}

/// Like [`ok`], with a human-readable message.
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: Some(message.into()),
        error: None,
    })
}

/// Handler error: a [`CardpressError`] rendered as a failure envelope.
#[derive(Debug)]
pub struct ApiError(pub CardpressError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(CardpressError::Validation(msg.into()))
    }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self(CardpressError::Render(e.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CardpressError::Validation(_) | CardpressError::Json(_) | CardpressError::Image(_) => {
                StatusCode::BAD_REQUEST
            }
            CardpressError::NotFound(_) => StatusCode::NOT_FOUND,
            CardpressError::Conflict(_) => StatusCode::CONFLICT,
            CardpressError::Render(_)
            | CardpressError::Store(_)
            | CardpressError::Transport(_)
            | CardpressError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CardpressError> for ApiError {
    fn from(e: CardpressError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        let body = Envelope::<()> {
            success: false,
            data: None,
            message: None,
            error: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejections are 400 failure envelopes.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// `Query` extractor whose rejections are 400 failure envelopes.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}
