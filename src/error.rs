use thiserror::Error;

/// Failures of the remote classification request. No retry happens at this
/// layer; the capture workflow decides whether the user re-submits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("could not reach the classification service")]
    NetworkUnavailable,

    #[error("classification service returned status {0}")]
    NonSuccessStatus(u16),

    #[error("classification service returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("classification request timed out")]
    Timeout,

    #[error("image could not be read: {0}")]
    ImageUnreadable(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InferenceError::Timeout
        } else if err.is_decode() || err.is_body() {
            InferenceError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            InferenceError::NonSuccessStatus(status.as_u16())
        } else {
            InferenceError::NetworkUnavailable
        }
    }
}

/// Failures of the history persistence slot. A corrupt payload is not
/// surfaced here: the slot quarantines it on open and starts empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("history storage unavailable: {0}")]
    Unavailable(String),

    #[error("history data is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
