use bytes::Bytes;
use metrics::counter;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::output::OutputFormat;

use super::{
    engine::SvgOptimizer,
    types::RenderedMath,
};

pub const CONTENT_TYPE: &str = "content-type";
pub const MATHOID_STYLE: &str = "x-mathoid-style";

/// Wire shape of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResponse {
    /// JSON document body.
    Json(Value),
    /// A single raw payload with its own headers.
    Payload {
        headers: Vec<(&'static str, String)>,
        body: Bytes,
    },
}

/// Headers for the outputs that carry a fixed content type. `None` for anything else.
pub fn payload_headers(
    format: OutputFormat,
    mathoid_style: Option<&str>,
) -> Option<Vec<(&'static str, String)>> {
    match format {
        OutputFormat::Svg => Some(vec![(CONTENT_TYPE, "image/svg+xml".to_string())]),
        OutputFormat::Png => Some(vec![(CONTENT_TYPE, "image/png".to_string())]),
        OutputFormat::Mml => {
            let mut headers = vec![(CONTENT_TYPE, "application/mathml+xml".to_string())];
            if let Some(style) = mathoid_style {
                headers.push((MATHOID_STYLE, style.to_string()));
            }
            Some(headers)
        }
        _ => None,
    }
}

/// Run the optional SVG minimization step. Failures keep the original payload.
pub(crate) async fn minimize_svg(math: &mut RenderedMath, optimizer: &dyn SvgOptimizer) {
    let Some(svg) = math.output.svg.as_ref() else {
        return;
    };

    match optimizer.optimize(svg.clone()).await {
        Ok(minified) if !minified.trim().is_empty() => math.output.svg = Some(minified),
        Ok(_) => {
            counter!("mathoid_svg_minify_failures_total").increment(1);
            warn!(
                target = "mathoid::svg",
                op = "svg::minimize",
                result = "empty",
                "SVG minimizer produced an empty document; keeping original"
            );
        }
        Err(err) => {
            counter!("mathoid_svg_minify_failures_total").increment(1);
            warn!(
                target = "mathoid::svg",
                op = "svg::minimize",
                result = "error",
                error = %err,
                "SVG minimization failed; keeping original"
            );
        }
    }
}

/// Serialize a render into the wire shape selected by `format`.
pub(crate) fn assemble(
    math: RenderedMath,
    format: OutputFormat,
) -> Result<RenderResponse, serde_json::Error> {
    match format {
        OutputFormat::Json => Ok(RenderResponse::Json(serde_json::to_value(&math)?)),
        OutputFormat::Complete => complete_envelope(&math).map(RenderResponse::Json),
        OutputFormat::Svg => Ok(raw_payload(
            format,
            &math,
            math.output.svg.clone().map(Bytes::from),
        )),
        OutputFormat::Png => Ok(raw_payload(
            format,
            &math,
            math.output.png.clone().map(Bytes::from),
        )),
        OutputFormat::Mml => Ok(raw_payload(
            format,
            &math,
            math.output.mml.clone().map(Bytes::from),
        )),
        OutputFormat::Speech | OutputFormat::TexvcInfo | OutputFormat::Graph => Ok(raw_payload(
            format,
            &math,
            math.speech.clone().map(Bytes::from),
        )),
    }
}

fn raw_payload(format: OutputFormat, math: &RenderedMath, body: Option<Bytes>) -> RenderResponse {
    let headers = payload_headers(format, math.output.mathoid_style.as_deref()).unwrap_or_else(
        || vec![(CONTENT_TYPE, "text/plain; charset=utf-8".to_string())],
    );
    RenderResponse::Payload {
        headers,
        body: body.unwrap_or_default(),
    }
}

fn complete_envelope(math: &RenderedMath) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(math)?;
    let style = math.output.mathoid_style.as_deref();

    if let Value::Object(fields) = &mut value {
        for format in [OutputFormat::Svg, OutputFormat::Png, OutputFormat::Mml] {
            let key = format.as_str();
            let Some(body) = fields.remove(key) else {
                continue;
            };
            let headers: Map<String, Value> = payload_headers(format, style)
                .unwrap_or_default()
                .into_iter()
                .map(|(name, value)| (name.to_string(), Value::from(value)))
                .collect();
            let mut wrapped = Map::new();
            wrapped.insert("headers".to_string(), Value::Object(headers));
            wrapped.insert("body".to_string(), body);
            fields.insert(key.to_string(), Value::Object(wrapped));
        }
    }

    Ok(value)
}
