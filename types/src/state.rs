//! Lifecycle of a single submitted transaction.

use std::fmt;

/// State of one orchestrator instance.
///
/// `Idle -> Pending -> {Succeeded, Failed} -> Idle`; the return to `Idle`
/// happens only when the caller starts a new request or resets explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransactionState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl TransactionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the last request reached a terminal state.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    /// The failure reason, if the last request failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Pending => f.write_str("pending"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
