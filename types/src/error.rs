//! Error taxonomy shared across crates.

use thiserror::Error;

/// Every way a token operation or address conversion can fail.
///
/// The first five variants are decided locally and never reach the remote
/// channel. The remote variants wrap a reason reported by (or about) the
/// channel. None of them is fatal; a fresh user action recovers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("cannot transfer to yourself")]
    SelfTransfer,

    #[error("no account selected")]
    NoAccount,

    #[error("operation already pending")]
    AlreadyPending,

    #[error("{0}")]
    RemoteRejected(String),

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
}

impl TokenError {
    /// Whether the error originated beyond this process.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteRejected(_) | Self::RemoteUnavailable(_))
    }
}
