// Request correlation
// Every outbound request owns exactly one pending slot until the host settles it

use crate::error::{BridgeError, Result};
use dashmap::DashMap;
use framebridge_core::{build_request, Outcome, RequestId, RequestIdAllocator, SdkError};
use framebridge_transport::FrameSender;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};

type Settlement = std::result::Result<Value, SdkError>;

/// Table of in-flight requests keyed by id.
///
/// A slot is removed before it is completed, so a duplicate or late response
/// for the same id finds nothing and is reported as `UnknownResponse`.
/// Once closed, the table accepts no new slots.
#[derive(Debug, Default)]
pub struct PendingRequests {
    ids: RequestIdAllocator,
    pending: DashMap<RequestId, oneshot::Sender<Settlement>>,
    closed: AtomicBool,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and open its slot. Fails with `TransportClosed` after [`close`](Self::close).
    pub fn register(&self) -> Result<(RequestId, oneshot::Receiver<Settlement>)> {
        if self.is_closed() {
            return Err(BridgeError::TransportClosed);
        }
        let id = self.ids.allocate();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        // A close racing with the insert above has either drained this slot or is seen here.
        if self.is_closed() {
            self.cancel(id);
            return Err(BridgeError::TransportClosed);
        }
        Ok((id, rx))
    }

    pub fn resolve(&self, id: RequestId, result: Value) -> Result<()> {
        self.complete(id, Ok(result))
    }

    pub fn reject(&self, id: RequestId, error: SdkError) -> Result<()> {
        self.complete(id, Err(error))
    }

    pub fn settle(&self, id: RequestId, outcome: Outcome) -> Result<()> {
        self.complete(id, outcome.into_result())
    }

    fn complete(&self, id: RequestId, settlement: Settlement) -> Result<()> {
        let Some((_, tx)) = self.pending.remove(&id) else {
            return Err(BridgeError::UnknownResponse(id));
        };

        if tx.send(settlement).is_err() {
            debug!(request_id = id.as_u64(), "Caller stopped waiting before the response arrived");
        }
        Ok(())
    }

    /// Drop a slot without settling it. Returns whether it existed.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Drop every slot; their waiters observe a closed channel.
    pub fn fail_all(&self) -> usize {
        let ids: Vec<RequestId> = self.pending.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Refuse new slots and drop the outstanding ones. Returns how many were dropped.
    pub fn close(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);
        self.fail_all()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn peek_next_id(&self) -> u64 {
        self.ids.peek_next()
    }
}

/// Sends requests and waits for their correlated responses.
pub struct Correlator {
    pending: Arc<PendingRequests>,
    sender: Box<dyn FrameSender>,
}

impl Correlator {
    pub fn new(pending: Arc<PendingRequests>, sender: Box<dyn FrameSender>) -> Self {
        Self { pending, sender }
    }

    pub fn pending(&self) -> &Arc<PendingRequests> {
        &self.pending
    }

    /// Post `function_name(args)` and wait for the host's answer. No timeout is applied.
    ///
    /// Once the table is closed nothing is posted and the call fails with `TransportClosed`.
    pub async fn send(&self, function_name: &str, args: Vec<Value>) -> Result<Value> {
        let (id, rx) = self.pending.register()?;

        let frame = match build_request(id, function_name, args) {
            Ok(frame) => frame,
            Err(e) => {
                self.pending.cancel(id);
                return Err(e.into());
            }
        };

        trace!(request_id = id.as_u64(), function = function_name, "Posting request");
        if let Err(e) = self.sender.post(frame).await {
            self.pending.cancel(id);
            return Err(e.into());
        }

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(BridgeError::Host(error)),
            Err(_) => Err(BridgeError::TransportClosed),
        }
    }
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlator")
            .field("pending", &self.pending.len())
            .field("sender", &"Box<dyn FrameSender>")
            .finish()
    }
}
