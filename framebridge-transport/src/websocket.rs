use crate::origin::origin_of;
use crate::transport::{Frame, FrameReceiver, FrameSender, TransportError, TransportParts};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tungstenite::protocol::Message as WsMessage;

/// WebSocket sending half. Envelopes go out as text messages.
pub struct WebSocketSender<S> {
    sink: Mutex<SplitSink<WebSocketStream<S>, WsMessage>>,
}

#[async_trait]
impl<S> FrameSender for WebSocketSender<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn post(&self, data: Bytes) -> Result<(), TransportError> {
        let text = String::from_utf8(data.to_vec())
            .map_err(|e| TransportError::Protocol(format!("Envelope is not UTF-8: {}", e)))?;

        let mut sink = self.sink.lock().await;
        sink.send(WsMessage::text(text))
            .await
            .map_err(|e| TransportError::Protocol(format!("Failed to send WebSocket message: {}", e)))
    }
}

impl<S> std::fmt::Debug for WebSocketSender<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketSender").finish_non_exhaustive()
    }
}

/// WebSocket receiving half. Every frame carries the origin of the connected endpoint.
pub struct WebSocketReceiver<S> {
    origin: String,
    stream: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> FrameReceiver for WebSocketReceiver<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return Ok(Some(Frame {
                        origin: self.origin.clone(),
                        data: Bytes::copy_from_slice(text.as_str().as_bytes()),
                    }))
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    return Ok(Some(Frame {
                        origin: self.origin.clone(),
                        data: Bytes::copy_from_slice(&data),
                    }))
                }
                Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {
                    tracing::trace!("Ignoring WebSocket control frame");
                }
                Some(Err(e)) => {
                    return Err(TransportError::Protocol(format!("WebSocket error: {}", e)))
                }
            }
        }
    }
}

impl<S> std::fmt::Debug for WebSocketReceiver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketReceiver")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Wrap an established WebSocket stream.
pub fn from_stream<S>(stream: WebSocketStream<S>, peer_origin: impl Into<String>) -> TransportParts
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (sink, stream) = stream.split();
    TransportParts::new(
        WebSocketSender {
            sink: Mutex::new(sink),
        },
        WebSocketReceiver {
            origin: peer_origin.into(),
            stream,
        },
    )
}

/// Connect to a host listening at `url`. The peer origin is the URL's serialized origin.
pub async fn connect(url: &str) -> Result<TransportParts, TransportError> {
    let origin = origin_of(url)?;
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::Protocol(format!("Failed to connect to {}: {}", url, e)))?;

    tracing::debug!(%origin, "WebSocket transport connected");
    Ok(from_stream(stream, origin))
}
