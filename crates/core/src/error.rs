//! Error taxonomy of the interview session.
//!
//! None of these are fatal: the controller records them in
//! [`crate::session_state::Session::last_error`] and keeps the session going.

/// Coarse classification of a recognizer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionErrorKind {
    #[error("audio capture failed")]
    Audio,
    #[error("recognizer network failure")]
    Network,
    #[error("no speech matched")]
    NoMatch,
    #[error("recognizer busy")]
    Busy,
    #[error("recognizer timed out")]
    Timeout,
    #[error("insufficient permissions")]
    Permission,
    #[error("language not supported")]
    UnsupportedLanguage,
    #[error("unknown recognizer error")]
    Unknown,
}

/// Failure of a call to the remote question service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("question service unreachable: {0}")]
    Unreachable(String),
    #[error("question service responded with status {0}")]
    Status(u16),
    #[error("malformed response from question service: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("network error: {0}")]
    Network(#[from] ServiceError),
    #[error("recognition error: {0}")]
    Recognition(RecognitionErrorKind),
    #[error("synthesis error: {0}")]
    Synthesis(String),
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}
