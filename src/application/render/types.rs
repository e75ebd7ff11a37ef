use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    error::RequestError, features::FeatureConfig, input::InputKind, output::NegotiatedOutputs,
};

/// One incoming render call. Only sanitization replaces `math`, and only before typesetting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub math: String,
    pub input: InputKind,
    pub wants_speech: bool,
}

impl RenderRequest {
    pub fn new(math: impl Into<String>, input: InputKind, wants_speech: bool) -> Self {
        Self {
            math: math.into(),
            input,
            wants_speech,
        }
    }

    /// Build a request from the submitted `q`, `type` and `nospeech` fields.
    pub fn from_submission(
        q: Option<String>,
        input_type: Option<&str>,
        nospeech: bool,
        features: &FeatureConfig,
    ) -> Result<Self, RequestError> {
        let math = q
            .filter(|q| !q.is_empty())
            .ok_or(RequestError::MissingQuery)?;
        let token = input_type.filter(|t| !t.is_empty()).unwrap_or("tex");
        let input = InputKind::parse(token)?;

        Ok(Self::new(math, input, features.speech_on && !nospeech))
    }
}

/// Option bag handed to the typesetting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypesetOptions {
    pub math: String,
    pub format: &'static str,
    pub svg: bool,
    pub mathoid_style: bool,
    pub mml: bool,
    pub speak_text: bool,
    pub png: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<NonZeroU32>,
}

impl TypesetOptions {
    pub fn new(
        math: impl Into<String>,
        input: InputKind,
        outputs: &NegotiatedOutputs,
        dpi: Option<NonZeroU32>,
    ) -> Self {
        Self {
            math: math.into(),
            format: input.engine_format(),
            svg: outputs.svg,
            mathoid_style: outputs.img_style,
            mml: outputs.mml,
            speak_text: outputs.speech,
            png: outputs.png,
            dpi,
        }
    }
}

/// What the typesetting engine resolved with. Unknown engine fields are carried through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypesetResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "png_base64")]
    pub png: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mathoid_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TypesetResult {
    /// Remove and return a non-empty engine error list.
    pub fn take_errors(&mut self) -> Option<Vec<String>> {
        self.errors.take().filter(|errors| !errors.is_empty())
    }
}

/// A successful render, augmented for the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMath {
    #[serde(flatten)]
    pub output: TypesetResult,
    pub success: bool,
    /// Legacy status string kept for older clients.
    pub log: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_tex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
}

impl RenderedMath {
    pub fn new(output: TypesetResult, sanitized_tex: Option<String>, speech: bool) -> Self {
        let speech = if speech {
            output.speak_text.clone()
        } else {
            None
        };
        Self {
            output,
            success: true,
            log: "success",
            sanitized_tex,
            speech,
        }
    }
}

/// Options for the TeX checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Allow mhchem (`\ce`, `\pu`) markup.
    pub chemistry: bool,
}

/// Structured rejection from the TeX checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub name: String,
    pub message: String,
    /// Character offset into the submitted source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,
}

/// Result of checking a TeX source: the canonical form plus metadata, or a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<String>,
    pub required_packages: Vec<String>,
    pub identifiers: Vec<String>,
    pub ends_with_dot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckFailure>,
}

impl Feedback {
    pub fn checked(
        checked: String,
        required_packages: Vec<String>,
        identifiers: Vec<String>,
        ends_with_dot: bool,
    ) -> Self {
        Self {
            success: true,
            checked: Some(checked),
            required_packages,
            identifiers,
            ends_with_dot,
            error: None,
        }
    }

    pub fn rejected(error: CheckFailure) -> Self {
        Self {
            success: false,
            checked: None,
            required_packages: Vec::new(),
            identifiers: Vec::new(),
            ends_with_dot: false,
            error: Some(error),
        }
    }
}

mod png_base64 {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|value| STANDARD.decode(value.trim()).map_err(D::Error::custom))
            .transpose()
    }
}
