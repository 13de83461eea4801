use framebridge_core::DEFAULT_MAX_FRAME_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_HOST_ORIGIN: &str = "FRAMEBRIDGE_HOST_ORIGIN";
pub const ENV_HANDSHAKE_TIMEOUT_MS: &str = "FRAMEBRIDGE_HANDSHAKE_TIMEOUT_MS";

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Origin the host frame posts from; inbound frames from anywhere else are dropped
    pub host_origin: String,
    /// Additional accepted origins, `https://*.example.com` style wildcards allowed
    pub valid_origins: Vec<String>,
    /// Version string sent in the handshake
    pub sdk_version: String,
    /// Give up on the handshake after this long; `None` waits indefinitely
    pub handshake_timeout_ms: Option<u64>,
    /// Inbound frames larger than this are dropped
    pub max_frame_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host_origin: "http://localhost:3000".to_string(),
            valid_origins: Vec::new(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            handshake_timeout_ms: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl BridgeConfig {
    pub fn new(host_origin: impl Into<String>) -> Self {
        Self {
            host_origin: host_origin.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON config document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply `FRAMEBRIDGE_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(origin) = lookup(ENV_HOST_ORIGIN).filter(|o| !o.is_empty()) {
            self.host_origin = origin;
        }
        if let Some(raw) = lookup(ENV_HANDSHAKE_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.handshake_timeout_ms = None,
                Ok(ms) => self.handshake_timeout_ms = Some(ms),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring unparsable {}", ENV_HANDSHAKE_TIMEOUT_MS)
                }
            }
        }
        self
    }

    /// Bound the handshake. Durations beyond `u64::MAX` milliseconds saturate.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_valid_origin(mut self, pattern: impl Into<String>) -> Self {
        self.valid_origins.push(pattern.into());
        self
    }

    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.handshake_timeout(), None);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert!(!config.sdk_version.is_empty());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = BridgeConfig::from_json(
            r#"{"host_origin": "https://host.example", "handshake_timeout_ms": 1500}"#,
        )
        .unwrap();
        assert_eq!(config.host_origin, "https://host.example");
        assert_eq!(config.handshake_timeout(), Some(Duration::from_millis(1500)));
        assert!(config.valid_origins.is_empty());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST_ORIGIN, "https://override.example"),
            (ENV_HANDSHAKE_TIMEOUT_MS, "250"),
        ]
        .into_iter()
        .collect();

        let config = BridgeConfig::new("https://host.example")
            .with_overrides_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.host_origin, "https://override.example");
        assert_eq!(config.handshake_timeout_ms, Some(250));
    }

    #[test]
    fn test_bad_timeout_override_is_ignored() {
        let config = BridgeConfig::new("https://host.example")
            .with_handshake_timeout(Duration::from_secs(2))
            .with_overrides_from(|key| (key == ENV_HANDSHAKE_TIMEOUT_MS).then(|| "soon".to_string()));
        assert_eq!(config.handshake_timeout_ms, Some(2000));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = BridgeConfig::default().with_handshake_timeout(Duration::MAX);
        assert_eq!(config.handshake_timeout_ms, Some(u64::MAX));
    }
}
