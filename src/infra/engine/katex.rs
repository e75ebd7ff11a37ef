use std::time::Instant;

use async_trait::async_trait;
use katex::{OptsBuilder, OutputType};
use tracing::debug;

use crate::application::render::{EngineError, TypesetOptions, TypesetResult, Typesetter};

/// In-process engine backed by KaTeX. Produces MathML only; SVG, PNG and speech
/// outputs are left empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexTypesetter;

impl KatexTypesetter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Typesetter for KatexTypesetter {
    async fn typeset(&self, options: TypesetOptions) -> Result<TypesetResult, EngineError> {
        tokio::task::spawn_blocking(move || typeset_blocking(&options))
            .await
            .map_err(|err| EngineError::Task(err.to_string()))?
    }
}

fn typeset_blocking(options: &TypesetOptions) -> Result<TypesetResult, EngineError> {
    let started_at = Instant::now();

    let display_mode = match options.format {
        "TeX" => true,
        "inline-TeX" => false,
        "MathML" => {
            return Ok(TypesetResult {
                mml: options.mml.then(|| options.math.clone()),
                ..TypesetResult::default()
            });
        }
        other => return Ok(rejected(format!("{other} input is not supported by KaTeX"))),
    };

    if !options.mml {
        return Ok(TypesetResult::default());
    }

    let mut builder = OptsBuilder::default();
    builder.display_mode(display_mode);
    builder.output_type(OutputType::Mathml);
    builder.throw_on_error(true);
    let opts = builder
        .build()
        .map_err(|err| EngineError::Protocol(format!("failed to build KaTeX options: {err}")))?;

    let result = match katex::render_with_opts(&options.math, opts) {
        Ok(markup) => TypesetResult {
            mml: Some(extract_math_element(&markup).to_string()),
            ..TypesetResult::default()
        },
        Err(err) => rejected(err.to_string()),
    };

    let outcome = if result.errors.is_some() { "rejected" } else { "ok" };
    debug!(
        target = "mathoid::engine",
        op = "engine::katex",
        result = outcome,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "KaTeX typeset finished"
    );

    Ok(result)
}

fn rejected(message: String) -> TypesetResult {
    TypesetResult {
        errors: Some(vec![message]),
        ..TypesetResult::default()
    }
}

/// KaTeX wraps its MathML in a `<span class="katex">`; keep only the `<math>` element.
fn extract_math_element(markup: &str) -> &str {
    let Some(start) = markup.find("<math") else {
        return markup;
    };
    match markup.rfind("</math>") {
        Some(end) if end >= start => &markup[start..end + "</math>".len()],
        _ => &markup[start..],
    }
}
