use super::error::RequestError;

/// Source notation of a submitted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Tex,
    InlineTex,
    MathMl,
    AsciiMath,
    /// mhchem markup; rendered as inline TeX with the chemistry extension.
    Chemistry,
}

impl InputKind {
    /// Map a user-supplied `type` token (case-insensitive) to its canonical kind.
    pub fn parse(token: &str) -> Result<Self, RequestError> {
        let lowered = token.to_lowercase();
        match lowered.as_str() {
            "tex" => Ok(Self::Tex),
            "inline-tex" => Ok(Self::InlineTex),
            "mml" | "mathml" => Ok(Self::MathMl),
            "ascii" | "asciimathml" | "asciimath" => Ok(Self::AsciiMath),
            "chem" => Ok(Self::Chemistry),
            _ => Err(RequestError::UnknownInputFormat(lowered)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tex => "TeX",
            Self::InlineTex => "inline-TeX",
            Self::MathMl => "MathML",
            Self::AsciiMath => "AsciiMath",
            Self::Chemistry => "chem",
        }
    }

    /// Format name handed to the typesetting engine. Chemistry is inline TeX there.
    pub fn engine_format(self) -> &'static str {
        match self {
            Self::Chemistry => Self::InlineTex.as_str(),
            other => other.as_str(),
        }
    }

    /// Plain TeX or inline TeX, excluding chemistry.
    pub fn is_tex(self) -> bool {
        matches!(self, Self::Tex | Self::InlineTex)
    }

    /// Any input routed through the TeX checker.
    pub fn is_tex_family(self) -> bool {
        self.is_tex() || self == Self::Chemistry
    }
}
