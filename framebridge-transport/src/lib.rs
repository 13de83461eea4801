pub mod channel;
pub mod origin;
pub mod stream;
pub mod transport;
#[cfg(feature = "websocket")]
pub mod websocket;

pub use channel::{pair, HostEndpoint};
pub use origin::{origin_of, parse_url, serialize_origin};
pub use stream::{stream_transport, EnvelopeLineCodec, LineCodecError};
pub use transport::{Frame, FrameReceiver, FrameSender, TransportError, TransportParts};
