use async_trait::async_trait;
use quick_xml::{Reader, Writer, events::Event};

use crate::application::render::{MinifyError, SvgOptimizer};

/// Re-serializes SVG without comments, DOCTYPE and indentation between elements.
/// Attribute values, transforms and text content are written back untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSvgMinifier;

impl XmlSvgMinifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SvgOptimizer for XmlSvgMinifier {
    async fn optimize(&self, svg: String) -> Result<String, MinifyError> {
        tokio::task::spawn_blocking(move || minify(&svg))
            .await
            .map_err(|err| MinifyError::Task(err.to_string()))?
    }
}

fn minify(svg: &str) -> Result<String, MinifyError> {
    let mut reader = Reader::from_str(svg);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));

    loop {
        let event = reader
            .read_event()
            .map_err(|err| MinifyError::Parse(err.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Comment(_) | Event::DocType(_) => {}
            Event::Text(text) if is_layout_whitespace(&text) => {}
            other => writer
                .write_event(other)
                .map_err(|err| MinifyError::Write(err.to_string()))?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|err| MinifyError::Write(err.to_string()))
}

/// Whitespace-only text spanning a line break is indentation, not content.
fn is_layout_whitespace(text: &[u8]) -> bool {
    text.contains(&b'\n') && text.iter().all(u8::is_ascii_whitespace)
}
