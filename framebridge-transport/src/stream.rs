// Newline-delimited stream transport
// For hosts that talk to the embedded app over a byte stream (stdio pipes, sockets)

use crate::transport::{Frame, FrameReceiver, FrameSender, TransportError, TransportParts};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite};
use tracing::{debug, warn};

/// One envelope per line. Envelopes are JSON, so they never contain a raw newline.
#[derive(Debug, Clone)]
pub struct EnvelopeLineCodec {
    max_line_length: usize,
}

impl EnvelopeLineCodec {
    pub fn new() -> Self {
        Self {
            max_line_length: 10 * 1024 * 1024, // 10MB default
        }
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }
}

impl Default for EnvelopeLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EnvelopeLineCodec {
    type Item = Bytes;
    type Error = LineCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > self.max_line_length {
                    return Err(LineCodecError::LineTooLong(src.len()));
                }
                return Ok(None);
            };

            if pos > self.max_line_length {
                return Err(LineCodecError::LineTooLong(pos));
            }

            let mut line = src.split_to(pos);
            src.advance(1);

            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            // Blank lines are keep-alives
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            return Ok(Some(line.freeze()));
        }
    }
}

impl Encoder<Bytes> for EnvelopeLineCodec {
    type Error = LineCodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_line_length {
            return Err(LineCodecError::LineTooLong(item.len()));
        }
        if item.contains(&b'\n') {
            return Err(LineCodecError::EmbeddedNewline);
        }

        dst.reserve(item.len() + 1);
        dst.put_slice(&item);
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LineCodecError {
    #[error("Line too long: {0} bytes")]
    LineTooLong(usize),

    #[error("Envelope contains a raw newline")]
    EmbeddedNewline,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<LineCodecError> for TransportError {
    fn from(err: LineCodecError) -> Self {
        match err {
            LineCodecError::Io(e) => TransportError::Io(e),
            other => TransportError::Framing(other.to_string()),
        }
    }
}

pub struct StreamSender<W> {
    sink: Mutex<FramedWrite<W, EnvelopeLineCodec>>,
}

#[async_trait]
impl<W> FrameSender for StreamSender<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    async fn post(&self, data: Bytes) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.send(data).await?;
        Ok(())
    }
}

impl<W> std::fmt::Debug for StreamSender<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSender").finish_non_exhaustive()
    }
}

pub struct StreamReceiver<R> {
    origin: String,
    stream: FramedRead<R, EnvelopeLineCodec>,
}

#[async_trait]
impl<R> FrameReceiver for StreamReceiver<R>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        match self.stream.next().await {
            Some(Ok(data)) => Ok(Some(Frame {
                origin: self.origin.clone(),
                data,
            })),
            Some(Err(e)) => {
                warn!(origin = %self.origin, error = %e, "Stream transport read failed");
                Err(e.into())
            }
            None => {
                debug!(origin = %self.origin, "Stream transport reached end of input");
                Ok(None)
            }
        }
    }
}

impl<R> std::fmt::Debug for StreamReceiver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReceiver")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Build a transport over a reader/writer pair.
///
/// A byte stream carries no origin of its own, so every inbound frame is
/// stamped with `peer_origin`, the identity the embedding process vouches for.
pub fn stream_transport<R, W>(reader: R, writer: W, peer_origin: impl Into<String>) -> TransportParts
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    stream_transport_with_codec(reader, writer, peer_origin, EnvelopeLineCodec::new())
}

pub fn stream_transport_with_codec<R, W>(
    reader: R,
    writer: W,
    peer_origin: impl Into<String>,
    codec: EnvelopeLineCodec,
) -> TransportParts
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    TransportParts::new(
        StreamSender {
            sink: Mutex::new(FramedWrite::new(writer, codec.clone())),
        },
        StreamReceiver {
            origin: peer_origin.into(),
            stream: FramedRead::new(reader, codec),
        },
    )
}
