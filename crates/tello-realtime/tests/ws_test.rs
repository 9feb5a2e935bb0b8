//! Realtime client against a local WebSocket server.

use futures_util::{SinkExt, StreamExt};
use tello_realtime::protocol::SessionConfig;
use tello_realtime::{ClientEvent, RealtimeClient, ServerEvent};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn test_handshake_headers_and_event_flow() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (header_tx, header_rx) = std::sync::mpsc::channel();
    let (first_tx, first_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let header = |name: &str| {
                req.headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            };
            let _ = header_tx.send((
                req.uri().to_string(),
                header("api-key"),
                header("OpenAI-Beta"),
            ));
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap();

        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = first_tx.send(text);
        }
        ws.send(Message::Text(
            r#"{"type":"session.created","session":{"id":"sess_1"}}"#.into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text("not json".into())).await.unwrap();
        ws.send(Message::Text(r#"{"type":"rate_limits.updated"}"#.into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let client = RealtimeClient::new(format!("http://{}", addr), "gpt-4o-realtime", "secret");
    let (mut sender, mut receiver) = client.connect().await.unwrap();

    let (uri, key, beta) = header_rx.recv().unwrap();
    assert_eq!(
        uri,
        "/openai/realtime?api-version=2024-10-01-preview&deployment=gpt-4o-realtime"
    );
    assert_eq!(key, "secret");
    assert_eq!(beta, "realtime=v1");

    sender
        .send(&ClientEvent::session_update(SessionConfig::new("fly", vec![])))
        .await
        .unwrap();
    let first = first_rx.await.unwrap();
    assert!(first.contains(r#""type":"session.update""#));

    assert!(matches!(
        receiver.next_event().await.unwrap(),
        Some(ServerEvent::SessionCreated { .. })
    ));
    // The malformed frame is skipped.
    assert_eq!(receiver.next_event().await.unwrap(), Some(ServerEvent::Other));
    assert_eq!(receiver.next_event().await.unwrap(), None);
}
