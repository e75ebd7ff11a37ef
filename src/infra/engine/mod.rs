//! Typesetting engine implementations.

mod command;
mod katex;

use std::sync::Arc;

use crate::{
    application::render::Typesetter,
    config::{EngineKind, EngineSettings},
};

pub use command::CommandTypesetter;
pub use katex::KatexTypesetter;

/// Build the engine selected by configuration.
pub fn build_typesetter(settings: &EngineSettings) -> Arc<dyn Typesetter> {
    match settings.kind {
        EngineKind::Command => Arc::new(CommandTypesetter::new(
            settings.command.clone(),
            settings.args.clone(),
        )),
        EngineKind::Katex => Arc::new(KatexTypesetter::new()),
    }
}
