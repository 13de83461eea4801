use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes reported by the host, numbered the way the host SDK numbers them.
///
/// Codes the bridge does not know about are carried through as [`ErrorCode::Other`]
/// so a host error always reaches the caller untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ErrorCode {
    NotSupportedOnPlatform,
    InternalError,
    NotSupportedInCurrentContext,
    PermissionDenied,
    NetworkError,
    NoHwSupport,
    InvalidArguments,
    UnauthorizedUserOperation,
    InsufficientResources,
    Throttle,
    UserAbort,
    OperationTimedOut,
    OldPlatform,
    FileNotFound,
    SizeExceeded,
    Other(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            100 => ErrorCode::NotSupportedOnPlatform,
            500 => ErrorCode::InternalError,
            501 => ErrorCode::NotSupportedInCurrentContext,
            1000 => ErrorCode::PermissionDenied,
            2000 => ErrorCode::NetworkError,
            3000 => ErrorCode::NoHwSupport,
            4000 => ErrorCode::InvalidArguments,
            5000 => ErrorCode::UnauthorizedUserOperation,
            6000 => ErrorCode::InsufficientResources,
            7000 => ErrorCode::Throttle,
            8000 => ErrorCode::UserAbort,
            8001 => ErrorCode::OperationTimedOut,
            9000 => ErrorCode::OldPlatform,
            404 => ErrorCode::FileNotFound,
            10000 => ErrorCode::SizeExceeded,
            other => ErrorCode::Other(other),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::NotSupportedOnPlatform => 100,
            ErrorCode::InternalError => 500,
            ErrorCode::NotSupportedInCurrentContext => 501,
            ErrorCode::PermissionDenied => 1000,
            ErrorCode::NetworkError => 2000,
            ErrorCode::NoHwSupport => 3000,
            ErrorCode::InvalidArguments => 4000,
            ErrorCode::UnauthorizedUserOperation => 5000,
            ErrorCode::InsufficientResources => 6000,
            ErrorCode::Throttle => 7000,
            ErrorCode::UserAbort => 8000,
            ErrorCode::OperationTimedOut => 8001,
            ErrorCode::OldPlatform => 9000,
            ErrorCode::FileNotFound => 404,
            ErrorCode::SizeExceeded => 10000,
            ErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotSupportedOnPlatform => "not_supported_on_platform",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::NotSupportedInCurrentContext => "not_supported_in_current_context",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::NoHwSupport => "no_hw_support",
            ErrorCode::InvalidArguments => "invalid_arguments",
            ErrorCode::UnauthorizedUserOperation => "unauthorized_user_operation",
            ErrorCode::InsufficientResources => "insufficient_resources",
            ErrorCode::Throttle => "throttle",
            ErrorCode::UserAbort => "user_abort",
            ErrorCode::OperationTimedOut => "operation_timed_out",
            ErrorCode::OldPlatform => "old_platform",
            ErrorCode::FileNotFound => "file_not_found",
            ErrorCode::SizeExceeded => "size_exceeded",
            ErrorCode::Other(code) => return write!(f, "error_{}", code),
        };
        write!(f, "{}", s)
    }
}

/// The `ErrorValue` the host puts in a failed response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkError {
    pub error_code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SdkError {
    pub fn new(error_code: ErrorCode) -> Self {
        SdkError {
            error_code,
            message: None,
        }
    }

    pub fn with_message(error_code: ErrorCode, message: impl Into<String>) -> Self {
        SdkError {
            error_code,
            message: Some(message.into()),
        }
    }

    pub fn not_supported_on_platform() -> Self {
        Self::new(ErrorCode::NotSupportedOnPlatform)
    }

    pub fn not_supported_in_current_context(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotSupportedInCurrentContext, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({}): {}", self.error_code, u32::from(self.error_code), message),
            None => write!(f, "{} ({})", self.error_code, u32::from(self.error_code)),
        }
    }
}

impl std::error::Error for SdkError {}
