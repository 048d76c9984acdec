use std::error::Error;

/// Cumulative transfer totals reported by a statistics backend.
///
/// Both counters are monotonically increasing for the lifetime of the
/// backend; a reset or wrap surfaces downstream as a negative delta and is
/// handled there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterTotals {
    /// Total bytes received.
    pub rx_bytes: u64,
    /// Total bytes transmitted.
    pub tx_bytes: u64,
}

/// Error type returned by [`TrafficStatsPort`] operations.
///
/// Each variant stores the logical operation name to aid diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TrafficStatsError {
    /// The backend failed to execute the requested operation.
    #[error("operation `{operation}` failed: {source}")]
    Backend {
        /// Logical operation identifier.
        operation: &'static str,
        /// Source error reported by the backend implementation.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The operation failed with an explanatory message.
    #[error("operation `{operation}` failed: {message}")]
    Message {
        /// Logical operation identifier.
        operation: &'static str,
        /// Human readable error description.
        message: String,
    },
    /// The requested operation is not supported by the underlying backend.
    #[error("operation `{operation}` not supported by this statistics backend")]
    Unsupported {
        /// Logical operation identifier.
        operation: &'static str,
    },
}

impl TrafficStatsError {
    /// Helper for constructing [`TrafficStatsError::Message`].
    pub fn message(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Message {
            operation,
            message: message.into(),
        }
    }

    /// Helper for constructing [`TrafficStatsError::Unsupported`].
    pub const fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }
}

/// Source of cumulative transfer counters for the tracked link.
///
/// Reads must be fast and non-blocking; they are invoked from the sampling
/// tick path.
pub trait TrafficStatsPort {
    /// Read the current cumulative totals.
    fn totals(&mut self) -> Result<CounterTotals, TrafficStatsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_helper_embeds_operation() {
        let error = TrafficStatsError::message("totals", "device vanished");
        assert_eq!(
            error.to_string(),
            "operation `totals` failed: device vanished"
        );
    }

    #[test]
    fn unsupported_helper_formats_operation() {
        let error = TrafficStatsError::unsupported("totals");
        assert!(error.to_string().contains("`totals`"));
    }
}
