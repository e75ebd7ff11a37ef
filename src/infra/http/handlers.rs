use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::application::{
    error::RenderError,
    render::{RenderRequest, RenderResponse},
};

use super::{HttpState, error::ApiError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Fields of a render submission, from a JSON or form-encoded body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    #[serde(deserialize_with = "boolish")]
    pub nospeech: bool,
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));

        if is_form {
            let Form(submission) = Form::<Submission>::from_request(request, state)
                .await
                .map_err(|rejection| ApiError::invalid_body(rejection.body_text()))?;
            return Ok(submission);
        }

        let body = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| ApiError::invalid_body(rejection.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(&body).map_err(|err| ApiError::invalid_body(err.to_string()))
    }
}

/// Accepts JSON booleans as well as the loose values form posts and older clients send.
fn boolish<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        Value::Array(_) | Value::Object(_) => true,
    })
}

pub(super) async fn render_default(
    State(state): State<HttpState>,
    submission: Submission,
) -> Response {
    render(&state, None, submission).await
}

pub(super) async fn render_format(
    State(state): State<HttpState>,
    Path(outformat): Path<String>,
    submission: Submission,
) -> Response {
    render(&state, Some(&outformat), submission).await
}

pub(super) async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn render(state: &HttpState, outformat: Option<&str>, submission: Submission) -> Response {
    let request = match RenderRequest::from_submission(
        submission.q,
        submission.input_type.as_deref(),
        submission.nospeech,
        state.math.features(),
    ) {
        Ok(request) => request,
        Err(err) => return ApiError::from(RenderError::from(err)).into_response(),
    };

    match state.math.render(request, outformat).await {
        Ok(rendered) => into_response(rendered),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn into_response(rendered: RenderResponse) -> Response {
    match rendered {
        RenderResponse::Json(value) => Json(value).into_response(),
        RenderResponse::Payload { headers, body } => {
            let mut response = body.into_response();
            let map = response.headers_mut();
            for (name, value) in headers {
                match HeaderValue::from_str(&value) {
                    Ok(value) => {
                        map.insert(HeaderName::from_static(name), value);
                    }
                    Err(err) => warn!(
                        target = "mathoid::http::response",
                        header = name,
                        error = %err,
                        "Dropping header with invalid value"
                    ),
                }
            }
            response
        }
    }
}
