use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, Utf8Bytes},
};

use crate::error::StreamError;

/// Opens streaming connections to one endpoint.
///
/// This is the network seam of the worker: production uses
/// `WsConnector`, tests plug in scripted endpoints.
#[async_trait::async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StreamConnection>, StreamError>;
}

/// One open bidirectional message connection.
#[async_trait::async_trait]
pub trait StreamConnection: Send {
    /// Sends one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), StreamError>;

    /// Blocks until the next data message arrives.
    ///
    /// Control frames are handled internally. Closure of the
    /// connection is reported as `StreamError::Closed`.
    async fn next_message(&mut self) -> Result<Vec<u8>, StreamError>;

    /// Closes the connection. Errors are ignored.
    async fn close(&mut self);
}

/// tokio-tungstenite connector.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn StreamConnection>, StreamError> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;

        Ok(Box::new(WsConnection { ws }))
    }
}

pub struct WsConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl StreamConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.ws
            .send(Message::Text(Utf8Bytes::from(text)))
            .await
            .map_err(|e| StreamError::Subscribe(e.to_string()))
    }

    async fn next_message(&mut self) -> Result<Vec<u8>, StreamError> {
        while let Some(msg) = self.ws.next().await {
            match msg {
                Ok(Message::Text(text)) => return Ok(text.as_str().as_bytes().to_vec()),
                Ok(Message::Binary(data)) => return Ok(data.to_vec()),

                // Pongs are queued by tungstenite; flush them out
                Ok(Message::Ping(_)) => {
                    if let Err(e) = self.ws.flush().await {
                        return Err(StreamError::Read(e.to_string()));
                    }
                }

                Ok(Message::Close(frame)) => {
                    log::debug!("close frame received: {:?}", frame);
                    return Err(StreamError::Closed);
                }

                // Pong / raw frames
                Ok(_) => {}

                Err(e) => return Err(StreamError::Read(e.to_string())),
            }
        }

        Err(StreamError::Closed)
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
