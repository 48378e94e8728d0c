//! NDJSON framing for the incremental endpoint.
//!
//! The backend writes one JSON event per line:
//! ```text
//! {"type":"session","data":{"sessionId":"s1"}}
//! {"type":"token","data":{"delta":"Hi"}}
//! {"type":"token","data":{"delta":" there"}}
//! {"type":"complete","data":{"sessionId":"s1","reply":{...}}}
//! ```
//!
//! Chunks from the HTTP body do not respect line boundaries (and may split a
//! multi-byte character), so bytes are buffered until a newline arrives.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Response;
use solace_types::{FrameStream, TransportError};
use tokio_util::sync::CancellationToken;

use crate::error::map_reqwest_error;

/// Wrap an HTTP response body into a [`FrameStream`] of raw lines.
///
/// When `cancel` fires the stream ends and the response is dropped, which
/// closes the connection.
pub(crate) fn frame_response(response: Response, cancel: CancellationToken) -> FrameStream {
    let lines = split_lines(response.bytes_stream());
    FrameStream::new(lines.take_until(cancel.cancelled_owned()))
}

/// Split a raw byte stream into non-blank lines.
///
/// A read error or a line that is not UTF-8 is yielded as the final item.
/// Content after the last newline is flushed when the body ends.
fn split_lines(
    byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = Result<String, TransportError>> + Send + 'static {
    async_stream::stream! {
        let mut chunks = std::pin::pin!(byte_stream);
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk_result) = chunks.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(map_reqwest_error(e));
                    return;
                }
            };

            buf.extend_from_slice(&chunk);

            while let Some(newline_pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=newline_pos).collect();
                match decode_line(&line) {
                    Some(Ok(text)) => yield Ok(text),
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => {}
                }
            }
        }

        if let Some(item) = decode_line(&buf) {
            yield item;
        }
    }
}

/// Turn one raw line into text. Blank lines yield `None`.
fn decode_line(raw: &[u8]) -> Option<Result<String, TransportError>> {
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(TransportError::Decode(format!(
                "UTF-8 decode error in stream frame: {e}"
            ))));
        }
    };
    let text = text.trim_end_matches('\n').trim_end_matches('\r');
    if text.trim().is_empty() {
        None
    } else {
        Some(Ok(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect_bytes(parts: Vec<Vec<u8>>) -> Vec<Result<String, TransportError>> {
        let chunks: Vec<Result<Bytes, reqwest::Error>> =
            parts.into_iter().map(|p| Ok(Bytes::from(p))).collect();
        split_lines(stream::iter(chunks)).collect().await
    }

    async fn collect(parts: &[&str]) -> Vec<Result<String, TransportError>> {
        collect_bytes(parts.iter().map(|p| p.as_bytes().to_vec()).collect()).await
    }

    #[tokio::test]
    async fn splits_complete_lines() {
        let lines = collect(&["{\"a\":1}\n{\"b\":2}\n"]).await;
        assert_eq!(
            lines,
            vec![Ok("{\"a\":1}".to_string()), Ok("{\"b\":2}".to_string())]
        );
    }

    #[tokio::test]
    async fn joins_lines_split_across_chunks() {
        let lines = collect(&["{\"type\":\"tok", "en\"}\n{\"x\"", ":1}\n"]).await;
        assert_eq!(
            lines,
            vec![Ok("{\"type\":\"token\"}".to_string()), Ok("{\"x\":1}".to_string())]
        );
    }

    #[tokio::test]
    async fn keeps_multibyte_characters_split_across_chunks() {
        let text = "{\"delta\":\"h\u{e9}llo\"}\n".as_bytes();
        let split = text.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let lines = collect_bytes(vec![text[..split].to_vec(), text[split..].to_vec()]).await;
        assert_eq!(lines, vec![Ok("{\"delta\":\"h\u{e9}llo\"}".to_string())]);
    }

    #[tokio::test]
    async fn strips_carriage_returns_and_skips_blank_lines() {
        let lines = collect(&["one\r\n\r\n\ntwo\r\n"]).await;
        assert_eq!(lines, vec![Ok("one".to_string()), Ok("two".to_string())]);
    }

    #[tokio::test]
    async fn flushes_unterminated_last_line() {
        let lines = collect(&["first\nlast"]).await;
        assert_eq!(lines, vec![Ok("first".to_string()), Ok("last".to_string())]);
    }

    #[tokio::test]
    async fn invalid_utf8_ends_with_decode_error() {
        let lines = collect_bytes(vec![
            b"ok\n".to_vec(),
            vec![0xff, 0xfe, b'\n'],
            b"never\n".to_vec(),
        ])
        .await;
        assert_eq!(lines.len(), 2);
        assert!(matches!(&lines[1], Err(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        assert!(collect(&[]).await.is_empty());
    }
}
