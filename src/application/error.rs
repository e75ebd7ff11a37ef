use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use serde_json::Value;
use thiserror::Error;

use crate::{
    application::render::{EngineError, Feedback},
    config::LoadError,
    domain::error::RequestError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Terminal failure of one render request. Every variant reaches the client as a 400.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("{name}: {message}")]
    Sanitize {
        name: String,
        message: String,
        feedback: Box<Feedback>,
    },
    #[error("{}", .0.join("\n"))]
    Typeset(Vec<String>),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("render task failed: {0}")]
    Task(String),
}

impl RenderError {
    /// Pipeline stage that failed; used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            RenderError::Request(_) => "request",
            RenderError::Sanitize { .. } => "sanitize",
            RenderError::Typeset(_) => "typeset",
            RenderError::Engine(_) => "engine",
            RenderError::Serialize(_) => "serialize",
            RenderError::Task(_) => "task",
        }
    }

    /// Short client-facing message.
    pub fn error_value(&self) -> Value {
        match self {
            RenderError::Typeset(errors) => Value::from(errors.clone()),
            other => Value::from(other.to_string()),
        }
    }

    /// Client-facing detail; structured where the failing stage produced structure.
    pub fn detail_value(&self) -> Value {
        match self {
            RenderError::Sanitize { feedback, .. } => {
                serde_json::to_value(feedback.as_ref()).unwrap_or(Value::Null)
            }
            other => other.error_value(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
