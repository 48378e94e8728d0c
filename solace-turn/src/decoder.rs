//! Frame decoding for the incremental stream.
//!
//! Each frame is one JSON [`StreamEvent`]. Undecodable frames never end the
//! stream silently: they become an `error` event carrying
//! [`PROTOCOL_DECODE_ERROR_CODE`](solace_types::PROTOCOL_DECODE_ERROR_CODE),
//! which the controller treats like any other inconclusive termination.

use futures::{Stream, StreamExt};
use solace_types::{FrameStream, StreamEvent, TransportError};

/// Decode a single frame.
///
/// Returns `None` for frames that carry no event: blank lines, `:` comments
/// and `event:` lines from servers that speak SSE framing. A leading `data:`
/// prefix is stripped.
pub fn decode_frame(frame: &str) -> Option<StreamEvent> {
    let line = frame.trim();
    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
        return None;
    }
    let payload = line
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(line);

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "solace.turn.decode.malformed_frame");
            Some(StreamEvent::protocol_error(format!(
                "undecodable stream frame: {e}"
            )))
        }
    }
}

/// Turn a transport frame stream into an event stream.
///
/// Transport failures pass through unchanged so the controller can classify
/// them.
pub fn decode_events(
    frames: FrameStream,
) -> impl Stream<Item = Result<StreamEvent, TransportError>> + Send {
    frames.receiver.filter_map(|item| async move {
        match item {
            Ok(frame) => decode_frame(&frame).map(Ok),
            Err(e) => Some(Err(e)),
        }
    })
}
