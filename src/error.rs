//! Error types for market clients

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors surfaced by market clients, repositories and event decoders.
///
/// An order that does not exist (or no longer exists) is not an error;
/// see [`crate::orders::OrderLookup::Absent`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// Precondition violated before any remote call was made
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport or decoding failure while reading ledger state (never retried)
    #[error("External query failed: {0}")]
    ExternalQueryFailed(#[source] LedgerError),

    /// Log record missing or carrying mistyped fields
    #[error("Malformed {event} event: {reason}")]
    MalformedEvent { event: String, reason: String },

    /// The submission interface refused to accept an intent
    #[error("Submission failed: {0}")]
    SubmissionFailed(#[source] LedgerError),

    /// A submitted transaction resolved to failure
    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] LedgerError),

    /// Subscribing to the event source failed
    #[error("Event source failed: {0}")]
    EventSourceFailed(#[source] LedgerError),
}

impl MarketError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn malformed(event: &str, reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            event: event.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type MarketResult<T> = Result<T, MarketError>;
