use thiserror::Error;
use vft_types::TokenError;

/// Failure reported by a collaborator (remote channel or event transport).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The program or the connected wallet refused the call (including user
    /// cancellation). `message` is the remote's explanation, when it gave one.
    #[error("{}", .message.as_deref().unwrap_or("rejected by the remote program"))]
    Rejected { message: Option<String> },

    /// The channel could not be reached or is not initialised.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The remote answered with something that does not decode.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ChannelError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: Some(message.into()),
        }
    }

    /// Map into the shared taxonomy, using `fallback` as the reason when the
    /// remote gave none.
    pub fn into_token_error(self, fallback: &str) -> TokenError {
        match self {
            Self::Rejected { message } => {
                TokenError::RemoteRejected(message.unwrap_or_else(|| fallback.to_string()))
            }
            Self::Unavailable(reason) => TokenError::RemoteUnavailable(reason),
            Self::Decode(reason) => {
                TokenError::RemoteUnavailable(format!("unexpected response: {reason}"))
            }
        }
    }
}

impl From<ChannelError> for TokenError {
    fn from(err: ChannelError) -> Self {
        err.into_token_error("rejected by the remote program")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_uses_remote_message_or_fallback() {
        assert_eq!(
            ChannelError::rejected("insufficient balance").into_token_error("transfer failed"),
            TokenError::RemoteRejected("insufficient balance".into())
        );
        assert_eq!(
            ChannelError::Rejected { message: None }.into_token_error("transfer failed"),
            TokenError::RemoteRejected("transfer failed".into())
        );
    }

    #[test]
    fn transport_failures_map_to_unavailable() {
        let err: TokenError = ChannelError::Unavailable("program not initialized".into()).into();
        assert_eq!(
            err,
            TokenError::RemoteUnavailable("program not initialized".into())
        );
        assert!(err.is_remote());
    }
}
