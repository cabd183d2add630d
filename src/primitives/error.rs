// Error types: contract rejection reasons and harness failures
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::primitives::{Address, AppId};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Why a contract rejected a call.
///
/// The platform only reports accept/reject; the tag is kept so callers and
/// tests can tell which gate fired.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    #[error("sender is not the application admin")]
    NotAdmin,

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("missing application argument {0}")]
    MissingArgument(usize),

    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    #[error("group size {actual}, expected {expected}")]
    GroupSize { expected: usize, actual: usize },

    #[error("no companion transaction at group position {0}")]
    CompanionMissing(usize),

    #[error("companion transaction at position {position}: {reason}")]
    CompanionMismatch { position: usize, reason: String },

    #[error("account {0} has not opted in")]
    NotOptedIn(Address),

    #[error("account {0} has already opted in")]
    AlreadyOptedIn(Address),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("storage record {0} already exists")]
    BoxExists(String),

    #[error("storage record {0} does not exist")]
    BoxMissing(String),

    #[error("integer overflow")]
    Overflow,

    #[error("integer underflow")]
    Underflow,

    #[error("on-completion {0} is not permitted")]
    CompletionRejected(String),

    #[error("account {0} has insufficient balance")]
    InsufficientBalance(Address),

    #[error("unknown application {0}")]
    UnknownApplication(AppId),
}

impl Rejection {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Rejection::Precondition(reason.into())
    }

    pub fn mismatch(position: usize, reason: impl Into<String>) -> Self {
        Rejection::CompanionMismatch {
            position,
            reason: reason.into(),
        }
    }
}

/// Execution harness errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("transaction {index} in group rejected: {reason}")]
    Rejected { index: usize, reason: Rejection },

    #[error("invalid group: {0}")]
    InvalidGroup(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Rejection reason when the error came from a contract or transfer check
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            LedgerError::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}
