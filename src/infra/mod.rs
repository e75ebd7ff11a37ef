//! Infrastructure adapters and runtime bootstrap.

pub mod engine;
pub mod error;
pub mod http;
pub mod svg;
pub mod telemetry;
pub mod texvc;
