//! Shared tracing setup for the upmon workspace.

mod tracing;

pub use crate::tracing::{LogFormat, LogSettings, LoggerError, init_with};
