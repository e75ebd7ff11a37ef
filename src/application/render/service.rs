use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::{
    application::error::RenderError,
    domain::{
        features::FeatureConfig,
        input::InputKind,
        output::{NegotiatedOutputs, OutputFormat, negotiate},
    },
};

use super::{
    engine::{SvgOptimizer, TexChecker, Typesetter},
    response::{RenderResponse, assemble, minimize_svg},
    types::{CheckOptions, Feedback, RenderRequest, RenderedMath, TypesetOptions},
};

/// Orchestrates one render request: negotiation, sanitization, typesetting and
/// response assembly. Holds only read-only configuration and shared collaborator handles.
#[derive(Clone)]
pub struct MathService {
    features: FeatureConfig,
    typesetter: Arc<dyn Typesetter>,
    checker: Arc<dyn TexChecker>,
    optimizer: Arc<dyn SvgOptimizer>,
}

impl MathService {
    pub fn new(
        features: FeatureConfig,
        typesetter: Arc<dyn Typesetter>,
        checker: Arc<dyn TexChecker>,
        optimizer: Arc<dyn SvgOptimizer>,
    ) -> Self {
        Self {
            features,
            typesetter,
            checker,
            optimizer,
        }
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    /// Render `request` into the wire shape selected by the `output` path token.
    pub async fn render(
        &self,
        request: RenderRequest,
        output: Option<&str>,
    ) -> Result<RenderResponse, RenderError> {
        let result = self.run(request, output).await;
        if let Err(err) = &result {
            counter!("mathoid_render_failures_total", "stage" => err.stage()).increment(1);
        }
        result
    }

    async fn run(
        &self,
        request: RenderRequest,
        output: Option<&str>,
    ) -> Result<RenderResponse, RenderError> {
        let outputs = negotiate(output, request.input, request.wants_speech, &self.features)?;
        counter!("mathoid_render_requests_total", "format" => outputs.format.as_str())
            .increment(1);

        let feedback = self.sanitize(&request, &outputs).await?;
        let sanitized_tex = feedback.as_ref().and_then(|f| f.checked.clone());
        let math = sanitized_tex.clone().unwrap_or(request.math);

        match outputs.format {
            OutputFormat::Graph => {
                let checker = Arc::clone(&self.checker);
                let tree = tokio::task::spawn_blocking(move || checker.structure(&math, true))
                    .await
                    .map_err(|err| RenderError::Task(err.to_string()))?
                    .map_err(|failure| RenderError::Sanitize {
                        name: failure.name.clone(),
                        message: failure.message.clone(),
                        feedback: Box::new(Feedback::rejected(failure)),
                    })?;
                return Ok(RenderResponse::Json(tree));
            }
            OutputFormat::TexvcInfo => {
                // Negotiation guarantees the checker ran for structural formats.
                let value = match feedback {
                    Some(feedback) => serde_json::to_value(&feedback)?,
                    None => serde_json::Value::Null,
                };
                return Ok(RenderResponse::Json(value));
            }
            _ => {}
        }

        let options = TypesetOptions::new(
            math.as_str(),
            request.input,
            &outputs,
            self.features.dpi,
        );
        let mut rendered = self.typeset(options, &outputs).await?;
        rendered.sanitized_tex = sanitized_tex;
        if outputs.mml_passthrough && rendered.output.mml.is_none() {
            rendered.output.mml = Some(math);
        }

        if self.features.svgo {
            minimize_svg(&mut rendered, self.optimizer.as_ref()).await;
        }

        Ok(assemble(rendered, outputs.format)?)
    }

    /// Check TeX-family input, returning the checker's feedback on success.
    ///
    /// Runs when validation is enabled for TeX-family input, or whenever structural info
    /// was negotiated. Rejections end the request before any engine work. The checker
    /// runs on the blocking pool.
    async fn sanitize(
        &self,
        request: &RenderRequest,
        outputs: &NegotiatedOutputs,
    ) -> Result<Option<Feedback>, RenderError> {
        let check_input = !self.features.no_check && request.input.is_tex_family();
        if !check_input && !outputs.structural_info {
            return Ok(None);
        }

        let options = CheckOptions {
            chemistry: request.input == InputKind::Chemistry,
        };
        let checker = Arc::clone(&self.checker);
        let source = request.math.clone();
        let feedback = tokio::task::spawn_blocking(move || checker.feedback(&source, options))
            .await
            .map_err(|err| RenderError::Task(err.to_string()))?;
        if feedback.success {
            debug!(
                target = "mathoid::render",
                op = "render::sanitize",
                input = request.input.as_str(),
                "TeX input accepted"
            );
            return Ok(Some(feedback));
        }

        let (name, message) = feedback
            .error
            .as_ref()
            .map(|err| (err.name.clone(), err.message.clone()))
            .unwrap_or_else(|| ("SyntaxError".to_string(), "invalid TeX input".to_string()));
        info!(
            target = "mathoid::render",
            op = "render::sanitize",
            input = request.input.as_str(),
            error_name = %name,
            error = %message,
            "TeX input rejected"
        );
        Err(RenderError::Sanitize {
            name,
            message,
            feedback: Box::new(feedback),
        })
    }

    async fn typeset(
        &self,
        options: TypesetOptions,
        outputs: &NegotiatedOutputs,
    ) -> Result<RenderedMath, RenderError> {
        let started_at = Instant::now();
        let format = options.format;
        let result = self.typesetter.typeset(options).await;
        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        histogram!("mathoid_typeset_ms").record(elapsed_ms as f64);

        let mut result = result.inspect_err(|err| {
            warn!(
                target = "mathoid::render",
                op = "render::typeset",
                result = "engine_error",
                elapsed_ms,
                format,
                error = %err,
                "Typesetting engine call failed"
            );
        })?;

        if let Some(errors) = result.take_errors() {
            info!(
                target = "mathoid::render",
                op = "render::typeset",
                result = "rejected",
                elapsed_ms,
                format,
                errors = ?errors,
                "Typesetting engine reported errors"
            );
            return Err(RenderError::Typeset(errors));
        }

        debug!(
            target = "mathoid::render",
            op = "render::typeset",
            result = "ok",
            elapsed_ms,
            format,
            "Expression typeset"
        );

        Ok(RenderedMath::new(result, None, outputs.speech))
    }
}
