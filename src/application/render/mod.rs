//! The render pipeline: sanitization gateway, typesetting orchestration and
//! response assembly, wired to its collaborators through the traits in `engine`.

mod engine;
mod response;
mod service;
mod types;

pub use engine::{EngineError, MinifyError, SvgOptimizer, TexChecker, Typesetter};
pub use response::{CONTENT_TYPE, MATHOID_STYLE, RenderResponse, payload_headers};
pub use service::MathService;
pub use types::{
    CheckFailure, CheckOptions, Feedback, RenderRequest, RenderedMath, TypesetOptions,
    TypesetResult,
};
