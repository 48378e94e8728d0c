//! HTTP transport struct and builder.

use solace_types::{FrameStream, TransportError, TurnRequest, TurnResponse, TurnTransport};
use tokio_util::sync::CancellationToken;

use crate::error::{map_http_status, map_reqwest_error};
use crate::framing::frame_response;

/// Default path of the incremental endpoint.
const DEFAULT_STREAM_PATH: &str = "/chat/stream";

/// Default path of the non-incremental endpoint.
const DEFAULT_TURN_PATH: &str = "/chat";

/// Client for a chat backend speaking JSON over HTTP.
///
/// Implements [`TurnTransport`] for use with the turn controller.
///
/// # Example
///
/// ```no_run
/// use solace_transport_http::HttpTransport;
///
/// let transport = HttpTransport::new("https://api.example.com")
///     .stream_path("/v1/chat/stream")
///     .bearer_token("secret");
/// ```
pub struct HttpTransport {
    /// API base URL without a trailing slash.
    pub(crate) base_url: String,
    /// Path of the incremental endpoint.
    pub(crate) stream_path: String,
    /// Path of the non-incremental endpoint.
    pub(crate) turn_path: String,
    /// Optional bearer token sent with every request.
    pub(crate) bearer_token: Option<String>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the backend at `base_url`.
    ///
    /// Default paths: `/chat/stream` (incremental) and `/chat`
    /// (non-incremental). No authentication header.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            stream_path: DEFAULT_STREAM_PATH.into(),
            turn_path: DEFAULT_TURN_PATH.into(),
            bearer_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the path of the incremental endpoint.
    #[must_use]
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Override the path of the non-incremental endpoint.
    #[must_use]
    pub fn turn_path(mut self, path: impl Into<String>) -> Self {
        self.turn_path = path.into();
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    ///
    /// Obtaining and refreshing the token is the caller's business.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Use a preconfigured [`reqwest::Client`] (proxies, timeouts, TLS).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Full URL of the incremental endpoint.
    pub(crate) fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }

    /// Full URL of the non-incremental endpoint.
    pub(crate) fn turn_url(&self) -> String {
        format!("{}{}", self.base_url, self.turn_path)
    }

    fn post(&self, url: &str, request: &TurnRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(url)
            .json(request);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl TurnTransport for HttpTransport {
    /// Open the incremental endpoint.
    ///
    /// Resolves once response headers arrive. A non-success status is read
    /// in full and returned as [`TransportError::Status`].
    async fn open_stream(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<FrameStream, TransportError> {
        let url = self.stream_url();
        tracing::debug!(
            url = %url,
            has_session = request.session_id.is_some(),
            "solace.http.open_stream"
        );

        let pending = self
            .post(&url, &request)
            .header("accept", "application/x-ndjson")
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            sent = pending => sent.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                body = response.text() => body.map_err(map_reqwest_error)?,
            };
            tracing::debug!(status = status.as_u16(), "solace.http.open_stream.rejected");
            return Err(map_http_status(status, &body));
        }

        Ok(frame_response(response, cancel))
    }

    /// Run the turn through the non-incremental endpoint.
    async fn send_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<TurnResponse, TransportError> {
        let url = self.turn_url();
        tracing::debug!(
            url = %url,
            has_session = request.session_id.is_some(),
            "solace.http.send_turn"
        );

        let exchange = async {
            let response = self
                .post(&url, &request)
                .send()
                .await
                .map_err(map_reqwest_error)?;
            let status = response.status();
            let text = response.text().await.map_err(map_reqwest_error)?;
            if !status.is_success() {
                return Err(map_http_status(status, &text));
            }
            serde_json::from_str::<TurnResponse>(&text)
                .map_err(|e| TransportError::Decode(format!("invalid JSON reply: {e}")))
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = exchange => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_are_set() {
        let transport = HttpTransport::new("http://localhost:8080");
        assert_eq!(transport.stream_url(), "http://localhost:8080/chat/stream");
        assert_eq!(transport.turn_url(), "http://localhost:8080/chat");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("http://localhost:8080/");
        assert_eq!(transport.turn_url(), "http://localhost:8080/chat");
    }

    #[test]
    fn builder_overrides_paths() {
        let transport = HttpTransport::new("http://api")
            .stream_path("/v2/stream")
            .turn_path("/v2/turn");
        assert_eq!(transport.stream_url(), "http://api/v2/stream");
        assert_eq!(transport.turn_url(), "http://api/v2/turn");
    }

    #[test]
    fn bearer_token_defaults_to_none() {
        assert!(HttpTransport::new("http://api").bearer_token.is_none());
        let transport = HttpTransport::new("http://api").bearer_token("t");
        assert_eq!(transport.bearer_token.as_deref(), Some("t"));
    }
}
