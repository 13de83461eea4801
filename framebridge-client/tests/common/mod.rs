// Scripted host for driving a bridge over the in-memory channel
#![allow(dead_code)]

use framebridge_client::{Bridge, BridgeConfig, FrameContext};
use framebridge_core::{
    decode_request, encode_inbound, HostEvent, Inbound, Request, RequestId, Response, SdkError,
};
use framebridge_transport::{pair, HostEndpoint};
use serde_json::{json, Value};
use std::time::Duration;

pub const HOST_ORIGIN: &str = "https://host.example";
pub const APP_ORIGIN: &str = "https://app.example";

pub struct FakeHost {
    endpoint: HostEndpoint,
}

impl FakeHost {
    /// Next request posted by the bridge. Panics if none arrives within five seconds.
    pub async fn next_request(&mut self) -> Request {
        let frame = tokio::time::timeout(Duration::from_secs(5), self.endpoint.recv())
            .await
            .expect("bridge posted nothing")
            .expect("bridge side closed");
        assert_eq!(frame.origin, APP_ORIGIN);
        decode_request(&frame.data).expect("bridge posted a malformed request")
    }

    pub fn try_next_request(&mut self) -> Option<Request> {
        self.endpoint
            .try_recv()
            .map(|frame| decode_request(&frame.data).expect("malformed request"))
    }

    pub fn respond(&self, id: RequestId, result: Value) {
        self.send(Inbound::Response(Response::success(id, result)));
    }

    pub fn fail(&self, id: RequestId, error: SdkError) {
        self.send(Inbound::Response(Response::failure(id, error)));
    }

    pub fn push_event(&self, name: &str, args: Vec<Value>) {
        self.send(Inbound::Event(HostEvent::new(name, args)));
    }

    pub fn post_raw(&self, data: impl Into<bytes::Bytes>) {
        self.endpoint.post(data).expect("bridge gone");
    }

    pub fn post_from(&self, origin: &str, data: impl Into<bytes::Bytes>) {
        self.endpoint.post_as(origin, data).expect("bridge gone");
    }

    fn send(&self, message: Inbound) {
        let data = encode_inbound(&message).expect("encodable");
        self.endpoint.post(data).expect("bridge gone");
    }

    /// Answer the pending `initialize` request.
    pub async fn complete_handshake(&mut self, context: FrameContext, supports: Value) -> RequestId {
        let request = self.next_request().await;
        assert_eq!(request.function_name, "initialize");
        self.respond(
            request.id,
            json!({
                "frameContext": context,
                "hostClientType": "web",
                "runtime": {"apiVersion": 3, "supports": supports},
            }),
        );
        request.id
    }

    /// Answer the next request, asserting its function name. Returns its args.
    pub async fn answer(&mut self, function_name: &str, result: Value) -> Vec<Value> {
        let request = self.next_request().await;
        assert_eq!(request.function_name, function_name);
        self.respond(request.id, result);
        request.args
    }
}

pub fn connect() -> (Bridge, FakeHost) {
    connect_with(BridgeConfig::new(HOST_ORIGIN))
}

pub fn connect_with(config: BridgeConfig) -> (Bridge, FakeHost) {
    framebridge_client::init_test_logging();
    let (parts, endpoint) = pair(APP_ORIGIN, HOST_ORIGIN);
    (Bridge::connect(config, parts), FakeHost { endpoint })
}

/// A bridge that finished its handshake in `context` with `supports`.
pub async fn initialized(context: FrameContext, supports: Value) -> (Bridge, FakeHost) {
    let (bridge, mut host) = connect();
    let (result, _) = tokio::join!(
        bridge.initialize(),
        host.complete_handshake(context, supports)
    );
    assert_eq!(result, Ok(context));
    (bridge, host)
}

/// Let spawned tasks (the inbound pump, eager operations) run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn sample_cart() -> Value {
    json!({
        "version": {"majorVersion": 1, "minorVersion": 0},
        "id": "cart-7",
        "cartInfo": {
            "market": "US",
            "intent": "EndUser",
            "locale": "en-US",
            "status": "Open",
            "currency": "USD",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:05:00Z"
        },
        "cartItems": [
            {"id": "sku-1", "name": "Seat licence", "quantity": 5, "price": 12.0}
        ]
    })
}
