use crate::error::SdkError;
use crate::ids::RequestId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: RequestId,
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Request {
    pub fn new(id: RequestId, function_name: impl Into<String>, args: Vec<Value>) -> Self {
        Request {
            id,
            function_name: function_name.into(),
            args,
        }
    }
}

/// How the host settled a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(SdkError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<Value, SdkError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

/// Inbound response envelope, correlated to a request by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub outcome: Outcome,
}

impl Response {
    pub fn success(id: RequestId, result: Value) -> Self {
        Response {
            id,
            outcome: Outcome::Success(result),
        }
    }

    pub fn failure(id: RequestId, error: SdkError) -> Self {
        Response {
            id,
            outcome: Outcome::Failure(error),
        }
    }
}

/// A notification pushed by the host without a matching request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEvent {
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl HostEvent {
    pub fn new(function_name: impl Into<String>, args: Vec<Value>) -> Self {
        HostEvent {
            function_name: function_name.into(),
            args,
        }
    }
}

/// Anything the host may send to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response(Response),
    Event(HostEvent),
}

/// `{ id, error, result }` exactly as it travels.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ResponseWire {
    pub id: RequestId,
    #[serde(default)]
    pub error: Option<SdkError>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl From<ResponseWire> for Response {
    fn from(wire: ResponseWire) -> Self {
        let outcome = match wire.error {
            Some(error) => Outcome::Failure(error),
            None => Outcome::Success(wire.result.unwrap_or(Value::Null)),
        };
        Response {
            id: wire.id,
            outcome,
        }
    }
}

impl From<&Response> for ResponseWire {
    fn from(response: &Response) -> Self {
        match &response.outcome {
            Outcome::Success(value) => ResponseWire {
                id: response.id,
                error: None,
                result: Some(value.clone()),
            },
            Outcome::Failure(error) => ResponseWire {
                id: response.id,
                error: Some(error.clone()),
                result: None,
            },
        }
    }
}
