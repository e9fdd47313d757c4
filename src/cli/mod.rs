//! CLI support for jse-lang
//!
//! Provides programmatic access to the `jse` command so it can be embedded
//! in other tools.

mod check;

pub use check::{CheckOptions, CheckResult, execute_check};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Building, validating or evaluating the expression failed
    #[error("{0}")]
    Expression(#[from] crate::Error),

    /// Variables were not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<crate::EvalError> for CliError {
    fn from(e: crate::EvalError) -> Self {
        CliError::Expression(e.into())
    }
}
