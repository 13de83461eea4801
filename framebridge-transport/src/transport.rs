use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Framing error: {0}")]
    Framing(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// One message received from the channel, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub origin: String,
    pub data: Bytes,
}

impl Frame {
    pub fn new(origin: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Frame {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Posts encoded envelopes to the host.
#[async_trait]
pub trait FrameSender: Send + Sync {
    async fn post(&self, data: Bytes) -> Result<(), TransportError>;
}

/// Yields frames arriving from the channel. `Ok(None)` means the channel closed.
#[async_trait]
pub trait FrameReceiver: Send {
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError>;
}

/// A transport split into its sending and receiving halves.
pub struct TransportParts {
    pub sender: Box<dyn FrameSender>,
    pub receiver: Box<dyn FrameReceiver>,
}

impl TransportParts {
    pub fn new(sender: impl FrameSender + 'static, receiver: impl FrameReceiver + 'static) -> Self {
        Self {
            sender: Box::new(sender),
            receiver: Box::new(receiver),
        }
    }
}

impl std::fmt::Debug for TransportParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportParts")
            .field("sender", &"Box<dyn FrameSender>")
            .field("receiver", &"Box<dyn FrameReceiver>")
            .finish()
    }
}
