use super::{error::RequestError, features::FeatureConfig, input::InputKind};

/// Wire-level shape of a render response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Svg,
    Png,
    TexvcInfo,
    Graph,
    Json,
    Complete,
    Mml,
    Speech,
}

impl OutputFormat {
    /// Parse a path token (case-insensitive); feature gating happens in [`negotiate`].
    pub fn parse(token: &str) -> Result<Self, RequestError> {
        match token.to_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "texvcinfo" => Ok(Self::TexvcInfo),
            "graph" => Ok(Self::Graph),
            "json" => Ok(Self::Json),
            "complete" => Ok(Self::Complete),
            "mml" | "mathml" => Ok(Self::Mml),
            "speech" => Ok(Self::Speech),
            _ => Err(RequestError::UnknownOutputFormat(token.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::TexvcInfo => "texvcinfo",
            Self::Graph => "graph",
            Self::Json => "json",
            Self::Complete => "complete",
            Self::Mml => "mml",
            Self::Speech => "speech",
        }
    }

    /// Formats answered by the structural analyzer instead of the typesetting engine.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::TexvcInfo | Self::Graph)
    }

    fn is_bundle(self) -> bool {
        matches!(self, Self::Json | Self::Complete)
    }
}

/// Which logical outputs a request needs, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedOutputs {
    pub format: OutputFormat,
    pub svg: bool,
    pub mml: bool,
    pub png: bool,
    pub structural_info: bool,
    pub img_style: bool,
    pub speech: bool,
    /// MathML input answering a MathML-bearing format: the source is the markup.
    pub mml_passthrough: bool,
}

impl NegotiatedOutputs {
    fn wants_anything(&self) -> bool {
        self.svg
            || self.mml
            || self.png
            || self.structural_info
            || self.img_style
            || self.speech
            || self.mml_passthrough
    }
}

/// Decide the outputs for one request, rejecting unknown, disabled or incompatible formats.
///
/// `output` is the optional path token; its absence means `json`. `wants_speech` is the
/// per-request speech flag after applying the configured default and `nospeech`.
pub fn negotiate(
    output: Option<&str>,
    input: InputKind,
    wants_speech: bool,
    features: &FeatureConfig,
) -> Result<NegotiatedOutputs, RequestError> {
    let format = match output {
        Some(token) => OutputFormat::parse(token)?,
        None => OutputFormat::Json,
    };

    match format {
        OutputFormat::Svg => require(features.svg, format, "svg")?,
        OutputFormat::Png => require(features.png, format, "png")?,
        OutputFormat::Speech => require(features.speech, format, "speech")?,
        OutputFormat::TexvcInfo => {
            require(features.texvcinfo, format, "texvcinfo")?;
            if !input.is_tex_family() {
                return Err(RequestError::IncompatibleInput {
                    format: format.as_str(),
                    accepted: "tex, inline-tex, or chem",
                    given: input.as_str(),
                });
            }
        }
        OutputFormat::Graph => {
            require(features.texvcinfo, format, "texvcinfo")?;
            if !input.is_tex() {
                return Err(RequestError::IncompatibleInput {
                    format: format.as_str(),
                    accepted: "tex or inline-tex",
                    given: input.as_str(),
                });
            }
        }
        OutputFormat::Json | OutputFormat::Complete | OutputFormat::Mml => {}
    }

    let bundle = format.is_bundle();
    let mml_format = bundle || format == OutputFormat::Mml;
    let outputs = NegotiatedOutputs {
        format,
        svg: features.svg && (bundle || format == OutputFormat::Svg),
        mml: input != InputKind::MathMl && mml_format,
        png: features.png && (bundle || format == OutputFormat::Png),
        structural_info: features.texvcinfo && format.is_structural(),
        img_style: features.img && mml_format,
        // Speech rides along with everything except PNG, or is the format itself.
        speech: (format != OutputFormat::Png && wants_speech) || format == OutputFormat::Speech,
        mml_passthrough: input == InputKind::MathMl && mml_format,
    };

    if !outputs.wants_anything() {
        return Err(RequestError::NothingToRender(format.as_str()));
    }

    Ok(outputs)
}

fn require(
    enabled: bool,
    format: OutputFormat,
    flag: &'static str,
) -> Result<(), RequestError> {
    if enabled {
        Ok(())
    } else {
        Err(RequestError::DisabledOutput {
            format: format.as_str(),
            flag,
        })
    }
}
