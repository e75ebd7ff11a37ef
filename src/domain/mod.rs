//! Domain layer: request vocabulary and the pure negotiation rules.

pub mod error;
pub mod features;
pub mod input;
pub mod output;
