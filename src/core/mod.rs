//! The core module holds the error type and the graph settings.

pub mod error;
pub mod settings;
