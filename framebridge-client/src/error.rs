use framebridge_core::{CodecError, ErrorCode, FrameContext, RequestId, SdkError};
use framebridge_transport::TransportError;
use thiserror::Error;

/// Everything a bridge call can fail with.
///
/// `NotInitialized`, `InvalidContext` and `NotSupportedOnPlatform` are raised
/// locally before anything is posted. `Host` carries the host's error verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("Bridge is not initialized")]
    NotInitialized,

    #[error("Not valid in frame context `{current}` (accepted: {expected:?})")]
    InvalidContext {
        current: FrameContext,
        expected: Vec<FrameContext>,
    },

    #[error("Capability is not supported on this platform")]
    NotSupportedOnPlatform,

    #[error("Host error: {0}")]
    Host(SdkError),

    #[error("No pending request for {0}")]
    UnknownResponse(RequestId),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Handshake timed out")]
    HandshakeTimedOut,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Project onto the host SDK's `{ errorCode, message }` surface.
    pub fn to_sdk_error(&self) -> SdkError {
        match self {
            BridgeError::Host(error) => error.clone(),
            BridgeError::NotSupportedOnPlatform => SdkError::not_supported_on_platform(),
            BridgeError::InvalidContext { .. } => {
                SdkError::not_supported_in_current_context(self.to_string())
            }
            other => SdkError::with_message(ErrorCode::InternalError, other.to_string()),
        }
    }

    /// Whether this error was produced locally without a round trip to the host.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            BridgeError::NotInitialized
                | BridgeError::InvalidContext { .. }
                | BridgeError::NotSupportedOnPlatform
        )
    }
}

impl From<SdkError> for BridgeError {
    fn from(err: SdkError) -> Self {
        BridgeError::Host(err)
    }
}

impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        BridgeError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Codec(format!("JSON error: {}", err))
    }
}

impl From<TransportError> for BridgeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionClosed => BridgeError::TransportClosed,
            other => BridgeError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
