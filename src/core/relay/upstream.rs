//! Upstream realtime endpoint connection.
//!
//! One outbound WebSocket connection per session, authenticated with a
//! bearer credential plus the realtime protocol-version header. A single
//! attempt is made; failure is fatal to the session and is not retried.

use http::Request;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::info;
use url::Url;

use super::error::{RelayError, RelayResult};
use crate::config::ServerConfig;

/// Upstream WebSocket stream type.
pub type UpstreamStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the upstream WebSocket URL with the model query parameter.
pub fn build_upstream_url(base: &str, model: &str) -> String {
    format!("{base}?model={model}")
}

/// Host header value for the upstream handshake, including a non-default port.
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Connect and authenticate to the upstream realtime endpoint.
///
/// The credential travels in the handshake only; it is never logged.
pub async fn connect(config: &ServerConfig, api_key: &str) -> RelayResult<UpstreamStream> {
    let url_str = build_upstream_url(
        &config.openai_realtime_url,
        &config.openai_realtime_model,
    );
    let url = Url::parse(&url_str)
        .map_err(|e| RelayError::UpstreamUnavailable(format!("invalid upstream URL: {e}")))?;
    let host = host_header(&url)
        .ok_or_else(|| RelayError::UpstreamUnavailable("upstream URL has no host".to_string()))?;

    let request = Request::builder()
        .uri(url_str.as_str())
        .header("Authorization", format!("Bearer {api_key}"))
        .header("OpenAI-Beta", "realtime=v1")
        .header(
            "Sec-WebSocket-Key",
            tungstenite::handshake::client::generate_key(),
        )
        .header("Sec-WebSocket-Version", "13")
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Host", host)
        .body(())
        .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;

    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;

    info!(model = %config.openai_realtime_model, "Connected to upstream realtime endpoint");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_upstream_url() {
        let url = build_upstream_url(
            "wss://api.openai.com/v1/realtime",
            "gpt-4o-mini-realtime-preview-2024-12-17",
        );
        assert_eq!(
            url,
            "wss://api.openai.com/v1/realtime?model=gpt-4o-mini-realtime-preview-2024-12-17"
        );
    }

    #[test]
    fn test_host_header_default_port() {
        let url = Url::parse("wss://api.openai.com/v1/realtime?model=m").unwrap();
        assert_eq!(host_header(&url).as_deref(), Some("api.openai.com"));
    }

    #[test]
    fn test_host_header_explicit_port() {
        let url = Url::parse("ws://127.0.0.1:9009/?model=m").unwrap();
        assert_eq!(host_header(&url).as_deref(), Some("127.0.0.1:9009"));
    }
}
