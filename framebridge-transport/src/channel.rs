// In-memory channel transport
// The postMessage analogue: two endpoints, each frame stamped with its sender's origin

use crate::transport::{Frame, FrameReceiver, FrameSender, TransportError, TransportParts};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Bridge-side sending half.
#[derive(Debug)]
pub struct ChannelSender {
    origin: String,
    tx: mpsc::UnboundedSender<Frame>,
}

#[async_trait]
impl FrameSender for ChannelSender {
    async fn post(&self, data: Bytes) -> Result<(), TransportError> {
        self.tx
            .send(Frame {
                origin: self.origin.clone(),
                data,
            })
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

/// Bridge-side receiving half.
#[derive(Debug)]
pub struct ChannelReceiver {
    rx: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl FrameReceiver for ChannelReceiver {
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

/// The host's end of an in-memory channel.
#[derive(Debug)]
pub struct HostEndpoint {
    origin: String,
    tx: mpsc::UnboundedSender<Frame>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl HostEndpoint {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Deliver `data` to the bridge as coming from this host.
    pub fn post(&self, data: impl Into<Bytes>) -> Result<(), TransportError> {
        let origin = self.origin.clone();
        self.post_as(origin, data)
    }

    /// Deliver `data` stamped with an arbitrary origin.
    pub fn post_as(
        &self,
        origin: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Result<(), TransportError> {
        self.tx
            .send(Frame::new(origin, data))
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Wait for the next frame posted by the bridge. `None` once the bridge side is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Take a frame posted by the bridge if one is already queued.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected bridge/host pair.
///
/// Frames posted by the bridge reach the host stamped with `bridge_origin`;
/// frames posted through [`HostEndpoint::post`] reach the bridge stamped with
/// `host_origin`.
pub fn pair(
    bridge_origin: impl Into<String>,
    host_origin: impl Into<String>,
) -> (TransportParts, HostEndpoint) {
    let (to_host, from_bridge) = mpsc::unbounded_channel();
    let (to_bridge, from_host) = mpsc::unbounded_channel();

    let parts = TransportParts::new(
        ChannelSender {
            origin: bridge_origin.into(),
            tx: to_host,
        },
        ChannelReceiver { rx: from_host },
    );

    let host = HostEndpoint {
        origin: host_origin.into(),
        tx: to_bridge,
        rx: from_bridge,
    };

    (parts, host)
}
