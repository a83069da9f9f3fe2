//! WebSocket framing as seen by one subscription worker.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use orderbook_relay::{
    Batch, SinkError, StreamError,
    collector::{
        lease::LeaseRegistry,
        transport::WsConnector,
        worker::{SubscriptionWorker, WorkerExit},
    },
    exchanges::deribit::DeribitAdapter,
    sink::{Sink, publisher::ResilientPublisher},
};

#[derive(Default)]
struct RawSink {
    payloads: Mutex<Vec<Vec<u8>>>,
}

#[async_trait::async_trait]
impl Sink for RawSink {
    async fn publish(&self, payload: &[u8]) -> Result<(), SinkError> {
        self.payloads.lock().push(payload.to_vec());
        Ok(())
    }
}

/// Accepts one client, answers its subscription with a ping, a binary
/// update and a text update, then closes once the pong arrives. The
/// pong payload is handed back through the returned receiver.
async fn spawn_heartbeat_exchange(
    binary: String,
    text: String,
) -> (String, oneshot::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (pong_tx, pong_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let Some(Ok(Message::Text(_))) = ws.next().await else {
            return;
        };

        ws.send(Message::Ping(b"hb".to_vec().into())).await.unwrap();
        ws.send(Message::Binary(binary.into_bytes().into())).await.unwrap();
        ws.send(Message::Text(text.into())).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Pong(data) = msg {
                let _ = pong_tx.send(data.to_vec());
                break;
            }
        }

        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    (format!("ws://{addr}"), pong_rx)
}

#[tokio::test]
async fn only_data_frames_reach_the_sink_and_pings_are_answered() {
    let binary = json!({ "channel": "book.BTC-A.100ms", "seq": 0 }).to_string();
    let text = json!({ "channel": "book.BTC-A.100ms", "seq": 1 }).to_string();
    let (url, pong) = spawn_heartbeat_exchange(binary.clone(), text.clone()).await;

    let sink = Arc::new(RawSink::default());
    let worker = SubscriptionWorker::new(
        Arc::new(DeribitAdapter),
        Arc::new(WsConnector::new(url)),
        ResilientPublisher::new(sink.clone(), 5, Duration::from_millis(10)),
        LeaseRegistry::new(),
    );
    let batch = Batch::new(0, vec!["BTC-A".into()]);

    let exit = timeout(
        Duration::from_secs(10),
        worker.run(&batch, &CancellationToken::new()),
    )
    .await
    .expect("worker did not observe the close");

    assert_eq!(
        exit,
        WorkerExit::Failed {
            error: StreamError::Closed,
            streamed: true
        }
    );
    assert_eq!(
        *sink.payloads.lock(),
        vec![binary.into_bytes(), text.into_bytes()]
    );

    let pong = timeout(Duration::from_secs(5), pong)
        .await
        .expect("no pong received")
        .expect("exchange dropped before the pong");
    assert_eq!(pong, b"hb".to_vec());
}
