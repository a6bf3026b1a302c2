//! Error taxonomy for the KPI engine.
//!
//! Only structural failures surface here. Cells that cannot be coerced to
//! their expected type are absorbed by the normalizer and never become errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Source '{source_name}' is missing required column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
}

impl KpiError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        KpiError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// True for every failure that prevents a snapshot from being built.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            KpiError::SourceUnavailable { .. } | KpiError::MissingColumn { .. }
        )
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, KpiError::InvalidQuery(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("unknown ranking key '{0}'")]
    UnknownRankKey(String),

    #[error("dimension '{dimension}' is not available for the {view} view")]
    UnsupportedDimension { dimension: String, view: &'static str },

    #[error("ranking key '{key}' does not apply to {target}")]
    UnsupportedRankKey { key: String, target: &'static str },

    #[error("malformed filter '{0}'")]
    MalformedFilter(String),
}

pub type Result<T, E = KpiError> = std::result::Result<T, E>;
