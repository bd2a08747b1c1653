//! Mapping transport failures onto the core `ApiError`.

use ohms_core::error::ApiError;

/// Classify a reqwest failure.
pub(crate) fn transport_error(err: reqwest::Error, timeout_secs: u64) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout_secs)
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

/// The user-facing text of an error body.
///
/// The server sends plain text, shown verbatim. A JSON `{"error": ...}` or
/// `{"message": ...}` wrapper is unwrapped.
pub(crate) fn server_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Wrapped {
        #[serde(alias = "message")]
        error: String,
    }

    serde_json::from_str::<Wrapped>(body)
        .map(|w| w.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
