//! Internal helpers mapping HTTP/reqwest failures to [`TransportError`].

use solace_types::TransportError;

/// Map a non-success HTTP status and its body to a [`TransportError`].
///
/// Interpretation of the status (quota, server failure) is left to the
/// classifier; the transport only reports what it saw.
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

/// Map a [`reqwest::Error`] to a [`TransportError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status {
            status: status.as_u16(),
            body: String::new(),
        }
    } else {
        TransportError::Network(err.to_string())
    }
}
