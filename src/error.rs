//! Error types.
//!
//! - `PipelineError` is the typed error of the core transformation pipeline.
//! - `AppError` is what front-ends report: a message plus a process exit code.

use thiserror::Error;

/// Failure of one pipeline component.
///
/// Null values are never errors; they flow through the tables as `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Input does not have the expected shape (missing column, empty metro id).
    #[error("data format error: {message}")]
    DataFormat { message: String },

    /// A date or numeric cell could not be parsed.
    #[error("parse error on line {line}, column `{column}`: invalid value '{value}' ({message})")]
    Parse {
        line: usize,
        column: String,
        value: String,
        message: String,
    },

    /// The composite index base row cannot be used as a denominator.
    #[error("invalid index base: {reason}")]
    InvalidBase { reason: String },
}

impl PipelineError {
    pub fn missing_column(name: &str) -> Self {
        Self::DataFormat {
            message: format!("missing required column `{name}`"),
        }
    }

    pub fn invalid_base(reason: impl Into<String>) -> Self {
        Self::InvalidBase {
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match err {
            PipelineError::DataFormat { .. } | PipelineError::Parse { .. } => 2,
            PipelineError::InvalidBase { .. } => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_exit_codes() {
        let missing: AppError = PipelineError::missing_column("date").into();
        assert_eq!(missing.exit_code(), 2);
        assert!(missing.message().contains("`date`"));

        let base: AppError = PipelineError::invalid_base("empty input").into();
        assert_eq!(base.exit_code(), 3);
    }
}
