//! Collaborator seams of the render pipeline: the typesetting engine, the TeX
//! checker and the SVG optimizer. Implementations live in `infra`.

use std::io;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::types::{CheckFailure, CheckOptions, Feedback, TypesetOptions, TypesetResult};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("typesetting engine unavailable: {0}")]
    NotFound(io::Error),
    #[error("typesetting engine I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("typesetting engine exited unsuccessfully (exit {exit_code:?}): {stderr}")]
    Exit {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("typesetting engine returned malformed output: {0}")]
    Protocol(String),
    #[error("typesetting task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("failed to parse SVG: {0}")]
    Parse(String),
    #[error("failed to write SVG: {0}")]
    Write(String),
    #[error("minification task failed: {0}")]
    Task(String),
}

/// Converts math source into MathML, SVG, PNG, style and speech outputs.
///
/// One handle is shared by every request, so implementations must tolerate many
/// outstanding calls.
#[async_trait]
pub trait Typesetter: Send + Sync {
    async fn typeset(&self, options: TypesetOptions) -> Result<TypesetResult, EngineError>;
}

/// Validates and canonicalizes TeX, and describes its structure.
pub trait TexChecker: Send + Sync {
    fn feedback(&self, source: &str, options: CheckOptions) -> Feedback;

    /// JSON parse tree of an already-checked source.
    fn structure(&self, source: &str, compact: bool) -> Result<Value, CheckFailure>;
}

/// Best-effort SVG size reduction.
#[async_trait]
pub trait SvgOptimizer: Send + Sync {
    async fn optimize(&self, svg: String) -> Result<String, MinifyError>;
}
