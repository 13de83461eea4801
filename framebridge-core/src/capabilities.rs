// Runtime capability snapshot
// Built once from the host's handshake and consulted before every capability call

use crate::codec::CodecError;
use crate::context::FrameContext;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Which capabilities the host supports, keyed by dotted path (`monetization.marketplace`).
///
/// Nested objects in the host's `supports` tree mean "supported, with
/// sub-capabilities". Keys may also be written dotted at any level. When the
/// same path is both an object and an explicit `false`, `false` wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "Value")]
pub struct RuntimeCapabilities {
    flags: BTreeMap<String, bool>,
}

impl RuntimeCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from the host's `supports` object.
    pub fn from_supports(supports: &Value) -> Result<Self, CodecError> {
        let map = match supports {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(CodecError::Shape(format!(
                    "capability snapshot must be an object, got {}",
                    other
                )))
            }
        };

        let mut snapshot = Self::default();
        snapshot.flatten("", map);
        Ok(snapshot)
    }

    /// Build a snapshot from explicit `(path, supported)` pairs.
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let mut snapshot = Self::default();
        for (path, supported) in flags {
            snapshot.mark(path.into(), supported);
        }
        snapshot
    }

    fn flatten(&mut self, prefix: &str, map: &Map<String, Value>) {
        for (key, value) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            match value {
                Value::Object(children) => {
                    self.mark(path.clone(), true);
                    self.flatten(&path, children);
                }
                Value::Bool(flag) => self.mark(path, *flag),
                Value::Null => self.mark(path, false),
                Value::Number(n) => self.mark(path, n.as_f64().is_some_and(|f| f != 0.0)),
                Value::String(s) => self.mark(path, !s.is_empty()),
                Value::Array(_) => self.mark(path, true),
            }
        }
    }

    fn mark(&mut self, path: String, supported: bool) {
        self.flags
            .entry(path)
            .and_modify(|flag| *flag = *flag && supported)
            .or_insert(supported);
    }

    /// Look up a dotted capability path.
    ///
    /// Every prefix of the path must be known and true: an unknown segment or a
    /// false ancestor makes the whole path unsupported, even if the leaf is true.
    pub fn is_supported(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }

        let mut end = 0;
        for segment in path.split('.') {
            if segment.is_empty() {
                return false;
            }
            end += segment.len();
            match self.flags.get(&path[..end]) {
                Some(true) => {}
                _ => return false,
            }
            end += 1;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(path, flag)| (path.as_str(), *flag))
    }
}

impl TryFrom<Value> for RuntimeCapabilities {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_supports(&value)
    }
}

/// The host runtime description delivered in the handshake.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    #[serde(default)]
    pub api_version: u32,
    #[serde(default)]
    pub supports: RuntimeCapabilities,
}

impl Runtime {
    pub fn new(api_version: u32, supports: RuntimeCapabilities) -> Self {
        Self {
            api_version,
            supports,
        }
    }

    pub fn is_supported(&self, path: &str) -> bool {
        self.supports.is_supported(path)
    }
}

/// Result payload of the `initialize` handshake request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakePayload {
    pub frame_context: FrameContext,
    #[serde(default)]
    pub host_client_type: Option<String>,
    pub runtime: Runtime,
}
