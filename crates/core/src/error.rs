// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors raised by individual legs and by the join.

use crate::types::LegName;
use thiserror::Error;

/// Failure of a single leg.
#[derive(Debug, Error)]
pub enum LegError {
    /// The data source could not be reached or the query failed
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Transport-level HTTP failure (connect, TLS, read)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The peer answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code received
        status: u16,
    },

    /// The response body was not the expected JSON
    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

/// The single aggregation failure kind.
///
/// Raised as soon as any leg fails. The leg name is kept for logs and
/// metrics; callers facing the outside world should use [`Self::details`].
#[derive(Debug, Error)]
pub enum AggregationError {
    /// A leg failed and the join was abandoned
    #[error("{leg} leg failed: {source}")]
    Leg {
        /// The failing leg
        leg: LegName,
        /// What went wrong
        #[source]
        source: LegError,
    },
}

impl AggregationError {
    /// Name of the leg that triggered the failure.
    pub fn leg(&self) -> LegName {
        match self {
            Self::Leg { leg, .. } => *leg,
        }
    }

    /// Message of the triggering error, without the leg name.
    pub fn details(&self) -> String {
        match self {
            Self::Leg { source, .. } => source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_omit_leg_name() {
        let err = AggregationError::Leg {
            leg: LegName::Api,
            source: LegError::Status {
                url: "http://remote/todos/1".to_string(),
                status: 503,
            },
        };

        assert_eq!(err.leg(), LegName::Api);
        assert_eq!(err.details(), "Unexpected status 503 from http://remote/todos/1");
        assert_eq!(
            err.to_string(),
            "api leg failed: Unexpected status 503 from http://remote/todos/1"
        );
    }
}
