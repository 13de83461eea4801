pub mod capabilities;
pub mod codec;
pub mod context;
pub mod envelope;
pub mod error;
pub mod ids;

pub use capabilities::{HandshakePayload, Runtime, RuntimeCapabilities};
pub use codec::{
    build_request, decode_inbound, decode_inbound_value, decode_request, encode_inbound,
    encode_request, CodecError, DEFAULT_MAX_FRAME_SIZE,
};
pub use context::FrameContext;
pub use envelope::{HostEvent, Inbound, Outcome, Request, Response};
pub use error::{ErrorCode, SdkError};
pub use ids::{RequestId, RequestIdAllocator};
