use thiserror::Error;

pub type Result<T> = std::result::Result<T, RealtimeError>;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue),
    #[error("connection closed")]
    Closed,
}
