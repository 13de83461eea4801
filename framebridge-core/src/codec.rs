use crate::envelope::{HostEvent, Inbound, Request, Response, ResponseWire};
use crate::ids::RequestId;
use bytes::Bytes;
use serde_json::Value;

/// Default upper bound on a single encoded envelope.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(String),

    #[error("Unexpected envelope shape: {0}")]
    Shape(String),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Json(err.to_string())
    }
}

pub fn encode_request(request: &Request) -> Result<Bytes, CodecError> {
    let json = serde_json::to_vec(request)?;
    Ok(Bytes::from(json))
}

pub fn build_request(
    id: RequestId,
    function_name: &str,
    args: Vec<Value>,
) -> Result<Bytes, CodecError> {
    encode_request(&Request::new(id, function_name, args))
}

pub fn decode_request(data: &[u8]) -> Result<Request, CodecError> {
    let request = serde_json::from_slice(data)?;
    Ok(request)
}

pub fn encode_inbound(message: &Inbound) -> Result<Bytes, CodecError> {
    let json = match message {
        Inbound::Response(response) => serde_json::to_vec(&ResponseWire::from(response))?,
        Inbound::Event(event) => serde_json::to_vec(event)?,
    };
    Ok(Bytes::from(json))
}

pub fn decode_inbound(data: &[u8]) -> Result<Inbound, CodecError> {
    let value: Value = serde_json::from_slice(data)?;
    decode_inbound_value(value)
}

/// Classify an inbound JSON value.
///
/// Objects carrying an `id` are responses; objects carrying only a
/// `functionName` are host events. Anything else is rejected.
pub fn decode_inbound_value(value: Value) -> Result<Inbound, CodecError> {
    let object = match &value {
        Value::Object(object) => object,
        other => {
            return Err(CodecError::Shape(format!(
                "envelope must be an object, got {}",
                kind_of(other)
            )))
        }
    };

    if object.contains_key("id") {
        let wire: ResponseWire = serde_json::from_value(value)?;
        return Ok(Inbound::Response(Response::from(wire)));
    }

    if object.contains_key("functionName") {
        let event: HostEvent = serde_json::from_value(value)?;
        return Ok(Inbound::Event(event));
    }

    Err(CodecError::Shape(
        "envelope has neither `id` nor `functionName`".to_string(),
    ))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
