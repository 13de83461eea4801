use crate::adapter::{spawn_pump, InboundRouter, OriginPolicy};
use crate::config::BridgeConfig;
use crate::correlation::{Correlator, PendingRequests};
use crate::error::{BridgeError, Result};
use crate::events::EventHandlers;
use crate::lifecycle::{InitializationState, Lifecycle};
use crate::namespaces::{Marketplace, Monetization};
use framebridge_core::{FrameContext, HandshakePayload, Runtime};
use framebridge_transport::TransportParts;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Function name of the handshake request.
pub const HANDSHAKE_FUNCTION: &str = "initialize";

/// Handle to one bridge session with the host.
///
/// Cloning is cheap; every clone talks to the same host through the same
/// correlation table and capability snapshot. The inbound pump stops when the
/// last clone is dropped or [`Bridge::shutdown`] is called.
#[derive(Clone, Debug)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

#[derive(Debug)]
struct BridgeInner {
    config: BridgeConfig,
    session_id: Uuid,
    correlator: Arc<Correlator>,
    lifecycle: Arc<Lifecycle>,
    events: Arc<EventHandlers>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for BridgeInner {
    fn drop(&mut self) {
        if let Some(pump) = self
            .pump
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pump.abort();
        }
    }
}

impl Bridge {
    /// Attach a bridge to `transport` and start routing inbound frames.
    ///
    /// Must be called from within a Tokio runtime. The bridge starts out
    /// `Uninitialized`; call [`Bridge::initialize`] before any capability call.
    pub fn connect(config: BridgeConfig, transport: TransportParts) -> Self {
        let session_id = Uuid::new_v4();
        let pending = Arc::new(PendingRequests::new());
        let events = Arc::new(EventHandlers::new());

        let origins = OriginPolicy::new(
            std::iter::once(config.host_origin.clone()).chain(config.valid_origins.iter().cloned()),
        );
        let router = InboundRouter::new(
            origins,
            pending.clone(),
            events.clone(),
            config.max_frame_size,
        );
        let pump = spawn_pump(
            transport.receiver,
            router,
            info_span!("bridge", session = %session_id),
        );

        info!(
            session = %session_id,
            host_origin = %config.host_origin,
            "Bridge connected"
        );

        Self {
            inner: Arc::new(BridgeInner {
                correlator: Arc::new(Correlator::new(pending, transport.sender)),
                lifecycle: Arc::new(Lifecycle::new()),
                events,
                pump: Mutex::new(Some(pump)),
                session_id,
                config,
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Run the handshake, or join the one already in flight.
    ///
    /// Once initialized this returns the established frame context without
    /// contacting the host. After a failure a fresh handshake is attempted.
    pub async fn initialize(&self) -> Result<FrameContext> {
        let correlator = self.inner.correlator.clone();
        let sdk_version = self.inner.config.sdk_version.clone();
        let limit = self.inner.config.handshake_timeout();

        self.inner
            .lifecycle
            .initialize_with(move || handshake(correlator, sdk_version, limit).boxed())
            .instrument(info_span!("initialize", session = %self.inner.session_id))
            .await
    }

    /// Drop the current session and capability snapshot, then handshake again.
    pub async fn reinitialize(&self) -> Result<FrameContext> {
        self.inner.lifecycle.reset();
        self.initialize().await
    }

    pub fn state(&self) -> InitializationState {
        self.inner.lifecycle.state()
    }

    /// Fail with `NotInitialized` or `InvalidContext` unless a call from `accepted` may proceed.
    pub fn ensure_initialized(&self, accepted: &[FrameContext]) -> Result<FrameContext> {
        self.inner.lifecycle.ensure_initialized(accepted)
    }

    /// Whether the host supports the dotted capability `path`. False before initialization.
    pub fn is_supported(&self, path: &str) -> bool {
        self.inner.lifecycle.is_supported(path)
    }

    pub fn runtime(&self) -> Option<Runtime> {
        self.inner
            .lifecycle
            .session()
            .map(|session| session.runtime.clone())
    }

    pub fn api_version(&self) -> Option<u32> {
        self.inner.lifecycle.api_version()
    }

    pub fn frame_context(&self) -> Option<FrameContext> {
        match self.state() {
            InitializationState::Initialized(context) => Some(context),
            _ => None,
        }
    }

    pub fn host_client_type(&self) -> Option<String> {
        self.inner
            .lifecycle
            .session()
            .and_then(|session| session.host_client_type.clone())
    }

    /// Post a raw request and wait for the host's result. Skips the gate and capability checks.
    pub async fn send(&self, function_name: &str, args: Vec<Value>) -> Result<Value> {
        self.inner.correlator.send(function_name, args).await
    }

    /// Gated capability call: initialization and context gate, capability
    /// check, then the round trip with the result decoded into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        capability: &str,
        accepted: &[FrameContext],
        function_name: &str,
        args: Vec<Value>,
    ) -> Result<T> {
        let value = self
            .call_value(capability, accepted, function_name, args)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// [`Bridge::call`] for functions whose result carries nothing.
    pub async fn call_unit(
        &self,
        capability: &str,
        accepted: &[FrameContext],
        function_name: &str,
        args: Vec<Value>,
    ) -> Result<()> {
        self.call_value(capability, accepted, function_name, args)
            .await
            .map(|_| ())
    }

    async fn call_value(
        &self,
        capability: &str,
        accepted: &[FrameContext],
        function_name: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.ensure_initialized(accepted)?;
        if !self.is_supported(capability) {
            debug!(capability, function = function_name, "Capability not supported by host");
            return Err(BridgeError::NotSupportedOnPlatform);
        }
        self.send(function_name, args).await
    }

    /// Handle host-pushed events named `name`. Replaces an earlier handler for the same name.
    pub fn on_event<F>(&self, name: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.inner.events.register(name, Arc::new(handler))
    }

    pub fn remove_event_handler(&self, name: &str) -> bool {
        self.inner.events.remove(name)
    }

    /// Number of requests still waiting for the host.
    pub fn pending_requests(&self) -> usize {
        self.inner.correlator.pending().len()
    }

    /// Stop routing inbound frames and fail every outstanding request with `TransportClosed`.
    ///
    /// Later calls fail with `TransportClosed` without posting anything.
    pub fn shutdown(&self) {
        let pump = self
            .inner
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pump) = pump {
            pump.abort();
        }
        let failed = self.inner.correlator.pending().close();
        info!(session = %self.inner.session_id, failed, "Bridge shut down");
    }

    pub fn marketplace(&self) -> Marketplace {
        Marketplace::new(self.clone())
    }

    pub fn monetization(&self) -> Monetization {
        Monetization::new(self.clone())
    }
}

async fn handshake(
    correlator: Arc<Correlator>,
    sdk_version: String,
    limit: Option<Duration>,
) -> Result<HandshakePayload> {
    let exchange = async {
        let value = correlator
            .send(HANDSHAKE_FUNCTION, vec![Value::String(sdk_version)])
            .await?;
        serde_json::from_value::<HandshakePayload>(value)
            .map_err(|e| BridgeError::HandshakeFailed(format!("invalid handshake payload: {}", e)))
    };

    match limit {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| BridgeError::HandshakeTimedOut)?,
        None => exchange.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framebridge_core::{decode_request, ErrorCode, SdkError};
    use framebridge_transport::{pair, HostEndpoint};
    use serde_json::json;

    const HOST: &str = "https://host.example";

    fn connect() -> (Bridge, HostEndpoint) {
        let (parts, host) = pair("https://app.example", HOST);
        (Bridge::connect(BridgeConfig::new(HOST), parts), host)
    }

    async fn answer_handshake(host: &mut HostEndpoint, result: Value) {
        let frame = host.recv().await.unwrap();
        let request = decode_request(&frame.data).unwrap();
        assert_eq!(request.function_name, HANDSHAKE_FUNCTION);
        host.post(json!({"id": request.id, "error": null, "result": result}).to_string())
            .unwrap();
    }

    #[tokio::test]
    async fn test_handshake_populates_session() {
        let (bridge, mut host) = connect();
        let payload = json!({
            "frameContext": "content",
            "hostClientType": "web",
            "runtime": {"apiVersion": 2, "supports": {"marketplace": true}},
        });

        let (context, ()) = tokio::join!(bridge.initialize(), answer_handshake(&mut host, payload));
        assert_eq!(context, Ok(FrameContext::Content));
        assert_eq!(bridge.frame_context(), Some(FrameContext::Content));
        assert_eq!(bridge.api_version(), Some(2));
        assert_eq!(bridge.host_client_type().as_deref(), Some("web"));
        assert!(bridge.is_supported("marketplace"));
        assert!(!bridge.is_supported("monetization"));
    }

    #[tokio::test]
    async fn test_handshake_sends_sdk_version() {
        let (parts, mut host) = pair("https://app.example", HOST);
        let mut config = BridgeConfig::new(HOST);
        config.sdk_version = "9.9.9".to_string();
        let bridge = Bridge::connect(config, parts);

        let init = bridge.initialize();
        let check = async {
            let frame = host.recv().await.unwrap();
            let request = decode_request(&frame.data).unwrap();
            assert_eq!(request.args, vec![json!("9.9.9")]);
            host.post(
                json!({"id": request.id, "error": {"errorCode": 500, "message": "no"}})
                    .to_string(),
            )
            .unwrap();
        };

        let (result, ()) = tokio::join!(init, check);
        assert_eq!(
            result,
            Err(BridgeError::Host(SdkError::with_message(
                ErrorCode::InternalError,
                "no"
            )))
        );
        assert_eq!(bridge.state(), InitializationState::Failed);
    }

    #[tokio::test]
    async fn test_bad_handshake_payload_fails() {
        let (bridge, mut host) = connect();
        let (result, ()) = tokio::join!(
            bridge.initialize(),
            answer_handshake(&mut host, json!({"runtime": {}}))
        );
        assert!(matches!(result, Err(BridgeError::HandshakeFailed(_))));
        assert_eq!(bridge.state(), InitializationState::Failed);
    }

    #[tokio::test]
    async fn test_gated_call_order() {
        let (bridge, mut host) = connect();

        assert_eq!(
            bridge.call_unit("marketplace", &[], "marketplace.getCart", vec![]).await,
            Err(BridgeError::NotInitialized)
        );
        assert!(host.try_recv().is_none());

        let payload = json!({
            "frameContext": "content",
            "runtime": {"apiVersion": 1, "supports": {"marketplace": false}},
        });
        let (_, ()) = tokio::join!(bridge.initialize(), answer_handshake(&mut host, payload));

        assert_eq!(
            bridge
                .call_unit("marketplace", &[FrameContext::Settings], "marketplace.getCart", vec![])
                .await,
            Err(BridgeError::InvalidContext {
                current: FrameContext::Content,
                expected: vec![FrameContext::Settings],
            })
        );
        assert_eq!(
            bridge
                .call_unit("marketplace", &[FrameContext::Content], "marketplace.getCart", vec![])
                .await,
            Err(BridgeError::NotSupportedOnPlatform)
        );
        assert!(host.try_recv().is_none());
        assert_eq!(bridge.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_fails_outstanding_requests() {
        let (bridge, mut host) = connect();
        let call = bridge.send("anything", vec![]);
        let stop = async {
            host.recv().await.unwrap();
            bridge.shutdown();
        };

        let (result, ()) = tokio::join!(call, stop);
        assert_eq!(result, Err(BridgeError::TransportClosed));
        assert_eq!(bridge.pending_requests(), 0);
    }
}
