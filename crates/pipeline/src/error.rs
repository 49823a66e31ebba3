//! Stage error type with transient/fatal classification.
//!
//! The retry policy only retries transient errors (network transport,
//! upstream 429/5xx); validation and contract errors abort the run
//! immediately.

use thiserror::Error;

/// Error raised by a pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Transport-level failure (DNS, connect, timeout). Transient.
    #[error("network error in {stage}: {message}")]
    Network {
        stage: &'static str,
        message: String,
    },

    /// The upstream answered with a non-success status.
    /// Transient for 429 and 5xx, fatal otherwise.
    #[error("{stage} upstream returned HTTP {status}")]
    UpstreamStatus { stage: &'static str, status: u16 },

    /// The stage input failed validation. Fatal.
    #[error("invalid input for {stage}: {message}")]
    InvalidInput {
        stage: &'static str,
        message: String,
    },

    /// The stage has no real implementation behind its contract. Fatal.
    #[error("{stage} has no implementation: {message}")]
    Unimplemented {
        stage: &'static str,
        message: &'static str,
    },

    /// Filesystem failure while assembling artifacts. Fatal.
    #[error("io error in {stage}: {message}")]
    Io {
        stage: &'static str,
        message: String,
    },

    /// A container-engine command failed. Fatal.
    #[error("command failed in {stage}: {message}")]
    Command {
        stage: &'static str,
        message: String,
    },
}

impl StageError {
    /// Whether a retry could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidInput { .. }
            | Self::Unimplemented { .. }
            | Self::Io { .. }
            | Self::Command { .. } => false,
        }
    }

    /// The stage the error originated in.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Network { stage, .. }
            | Self::UpstreamStatus { stage, .. }
            | Self::InvalidInput { stage, .. }
            | Self::Unimplemented { stage, .. }
            | Self::Io { stage, .. }
            | Self::Command { stage, .. } => stage,
        }
    }

    /// Wrap a reqwest transport error for a stage.
    pub fn network(stage: &'static str, err: &reqwest::Error) -> Self {
        Self::Network {
            stage,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_is_transient() {
        let err = StageError::Network {
            stage: "crawl_catalog",
            message: "connection refused".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_upstream_status_classification() {
        let server_error = StageError::UpstreamStatus {
            stage: "crawl_catalog",
            status: 503,
        };
        assert!(server_error.is_transient());

        let throttled = StageError::UpstreamStatus {
            stage: "crawl_catalog",
            status: 429,
        };
        assert!(throttled.is_transient());

        let forbidden = StageError::UpstreamStatus {
            stage: "crawl_catalog",
            status: 403,
        };
        assert!(!forbidden.is_transient());
    }

    #[test]
    fn test_contract_errors_are_fatal() {
        let err = StageError::Unimplemented {
            stage: "chromadb_embeddings",
            message: "no backend",
        };
        assert!(!err.is_transient());

        let err = StageError::InvalidInput {
            stage: "map_fields",
            message: "empty mapping".to_string(),
        };
        assert!(!err.is_transient());
    }
}
