use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::application::error::{ErrorReport, RenderError};

const TITLE: &str = "Bad Request";
const KIND: &str = "bad_request";

/// The 400 envelope every failed render answers with.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub success: bool,
    pub title: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub error: Value,
    pub detail: Value,
}

impl ErrorEnvelope {
    pub fn new(error: Value, detail: Value) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST.as_u16(),
            success: false,
            title: TITLE,
            kind: KIND,
            error,
            detail,
        }
    }
}

impl From<&RenderError> for ErrorEnvelope {
    fn from(err: &RenderError) -> Self {
        Self::new(err.error_value(), err.detail_value())
    }
}

#[derive(Debug)]
pub struct ApiError {
    envelope: ErrorEnvelope,
    report: ErrorReport,
}

impl ApiError {
    /// The request body could not be read or decoded.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            envelope: ErrorEnvelope::new(
                Value::from(format!("Invalid request body: {message}")),
                Value::from(message.clone()),
            ),
            report: ErrorReport::from_message(
                "infra::http::body",
                StatusCode::BAD_REQUEST,
                message,
            ),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        Self {
            envelope: ErrorEnvelope::from(&err),
            report: ErrorReport::from_error(
                "application::render",
                StatusCode::BAD_REQUEST,
                &err,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::BAD_REQUEST, Json(self.envelope)).into_response();
        self.report.attach(&mut response);
        response
    }
}
