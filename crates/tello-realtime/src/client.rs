//! WebSocket connection to the Azure OpenAI realtime endpoint.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{RealtimeError, Result};
use crate::protocol::{ClientEvent, ServerEvent};

pub const DEFAULT_API_VERSION: &str = "2024-10-01-preview";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings for a realtime deployment.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    pub endpoint: String,
    pub deployment: String,
    pub api_key: String,
    pub api_version: String,
}

/// Write half of a realtime connection.
pub struct RealtimeSender {
    sink: SplitSink<Socket, Message>,
}

/// Read half of a realtime connection.
pub struct RealtimeReceiver {
    stream: SplitStream<Socket>,
}

impl RealtimeClient {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn url(&self) -> Result<Url> {
        realtime_url(&self.endpoint, &self.deployment, &self.api_version)
    }

    /// Open the socket and split it into independent halves.
    pub async fn connect(&self) -> Result<(RealtimeSender, RealtimeReceiver)> {
        let url = self.url()?;
        tracing::info!("Connecting to realtime API at {}", url.host_str().unwrap_or(""));

        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert("api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        let (socket, _) = connect_async(request).await?;
        tracing::info!("Connected to realtime API");

        let (sink, stream) = socket.split();
        Ok((RealtimeSender { sink }, RealtimeReceiver { stream }))
    }
}

impl RealtimeSender {
    pub async fn send(&mut self, event: &ClientEvent) -> Result<()> {
        let text = event.to_json()?;
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

impl RealtimeReceiver {
    /// Read the next server event (returns None on close).
    ///
    /// Frames that are not valid events are logged and skipped.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>> {
        while let Some(msg) = self.stream.next().await {
            let msg = msg?;
            let text = match msg {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            match ServerEvent::from_json(&text) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => tracing::warn!("Skipping unparseable realtime event: {}", e),
            }
        }
        Ok(None)
    }
}

/// Build the realtime WebSocket URL from an HTTP(S) resource endpoint.
pub fn realtime_url(endpoint: &str, deployment: &str, api_version: &str) -> Result<Url> {
    let mut url =
        Url::parse(endpoint.trim()).map_err(|e| RealtimeError::InvalidEndpoint(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => other,
    }
    .to_string();

    url.set_scheme(&scheme)
        .map_err(|_| RealtimeError::InvalidEndpoint(endpoint.to_string()))?;
    url.set_path("/openai/realtime");
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("api-version", api_version)
        .append_pair("deployment", deployment);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_url_from_https() {
        let url = realtime_url(
            "https://my-resource.openai.azure.com/",
            "gpt-4o-realtime-preview",
            DEFAULT_API_VERSION,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "wss://my-resource.openai.azure.com/openai/realtime?api-version=2024-10-01-preview&deployment=gpt-4o-realtime-preview"
        );
    }

    #[test]
    fn test_realtime_url_from_http() {
        let url = realtime_url("http://127.0.0.1:9000", "d", "v1").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:9000/openai/realtime?api-version=v1&deployment=d");
    }

    #[test]
    fn test_realtime_url_rejects_garbage() {
        assert!(matches!(
            realtime_url("not a url", "d", "v"),
            Err(RealtimeError::InvalidEndpoint(_))
        ));
    }
}
