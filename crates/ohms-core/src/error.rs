//! Error types for the submission state machine and the grading engine.
//!
//! `ApiError` lives here rather than in `ohms-client` so that `Question` can
//! tell a transport failure from a rejected edit without string matching.

use thiserror::Error;

/// Message shown when the server gave no usable explanation.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "The request could not be completed. Please try again.";

/// Failures talking to the homework server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("server error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered but the body was not the expected payload.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text to put in front of the user.
    ///
    /// The server's own message is shown verbatim when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Failures of an individual answer item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("item {index} is locked")]
    Locked { index: usize },

    #[error("item {index} has no option '{value}'")]
    UnknownOption { index: usize, value: String },
}

/// Why a submission was refused before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("You must make a selection for all multiple choice questions.")]
    Unanswered { index: usize },

    #[error("Item {} has no response.", .index + 1)]
    Empty { index: usize },
}

impl ValidationError {
    /// Index of the offending item.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::Unanswered { index } | ValidationError::Empty { index } => *index,
        }
    }
}

/// Errors from the question protocol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuestionError {
    /// Local precondition failed; no request was made and nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The question is locked or has a request outstanding.
    #[error("question {0} is locked")]
    Locked(String),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("no item at index {0}")]
    NoSuchItem(usize),

    /// The server payload does not line up with the question's items.
    #[error("server returned {got} responses for {expected} items")]
    ResponseMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl QuestionError {
    /// Text to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            QuestionError::Api(e) => e.user_message(),
            QuestionError::ResponseMismatch { .. } => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
