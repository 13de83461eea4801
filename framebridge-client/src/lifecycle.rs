// Initialization state machine
// Uninitialized -> Initializing -> Initialized(ctx) | Failed, with one shared handshake in flight

use crate::error::{BridgeError, Result};
use framebridge_core::{FrameContext, HandshakePayload};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use tracing::{info, warn};

/// Handshake future shared by every concurrent `initialize()` caller.
pub type SharedHandshake = Shared<BoxFuture<'static, Result<FrameContext>>>;

/// Observable initialization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializationState {
    Uninitialized,
    Initializing,
    Initialized(FrameContext),
    Failed,
}

enum Phase {
    Uninitialized,
    Initializing(SharedHandshake),
    Initialized(FrameContext),
    Failed(BridgeError),
}

/// Tracks the handshake and holds the capability snapshot it produced.
pub struct Lifecycle {
    phase: Mutex<Phase>,
    session: RwLock<Option<Arc<HandshakePayload>>>,
    generation: AtomicU64,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Uninitialized),
            session: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> InitializationState {
        match &*self.lock_phase() {
            Phase::Uninitialized => InitializationState::Uninitialized,
            Phase::Initializing(_) => InitializationState::Initializing,
            Phase::Initialized(context) => InitializationState::Initialized(*context),
            Phase::Failed(_) => InitializationState::Failed,
        }
    }

    /// The error that moved the machine to `Failed`, if it is there.
    pub fn failure(&self) -> Option<BridgeError> {
        match &*self.lock_phase() {
            Phase::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Gate every capability call: initialized, and in one of `accepted` (empty accepts all).
    pub fn ensure_initialized(&self, accepted: &[FrameContext]) -> Result<FrameContext> {
        match &*self.lock_phase() {
            Phase::Initialized(current) if current.is_one_of(accepted) => Ok(*current),
            Phase::Initialized(current) => Err(BridgeError::InvalidContext {
                current: *current,
                expected: accepted.to_vec(),
            }),
            _ => Err(BridgeError::NotInitialized),
        }
    }

    /// The handshake payload of the current session.
    pub fn session(&self) -> Option<Arc<HandshakePayload>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_supported(&self, path: &str) -> bool {
        self.session()
            .is_some_and(|session| session.runtime.is_supported(path))
    }

    pub fn api_version(&self) -> Option<u32> {
        self.session().map(|session| session.runtime.api_version)
    }

    /// Start a handshake unless one is running or already succeeded.
    ///
    /// `start` is only called when a fresh handshake is needed; every caller,
    /// including concurrent ones, receives the same shared outcome.
    pub fn initialize_with<F>(self: &Arc<Self>, start: F) -> SharedHandshake
    where
        F: FnOnce() -> BoxFuture<'static, Result<HandshakePayload>>,
    {
        let mut phase = self.lock_phase();
        match &*phase {
            Phase::Initialized(context) => return future::ready(Ok(*context)).boxed().shared(),
            Phase::Initializing(handshake) => return handshake.clone(),
            Phase::Uninitialized | Phase::Failed(_) => {}
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handshake = start();
        let lifecycle: Weak<Self> = Arc::downgrade(self);

        let shared = async move {
            let result = handshake.await;
            match lifecycle.upgrade() {
                Some(lifecycle) => lifecycle.complete(generation, result),
                None => result.map(|payload| payload.frame_context),
            }
        }
        .boxed()
        .shared();

        info!(generation, "Handshake started");
        *phase = Phase::Initializing(shared.clone());
        shared
    }

    fn complete(&self, generation: u64, result: Result<HandshakePayload>) -> Result<FrameContext> {
        let mut phase = self.lock_phase();
        if self.generation.load(Ordering::SeqCst) != generation {
            warn!(generation, "Discarding outcome of a superseded handshake");
            return Err(BridgeError::HandshakeFailed(
                "superseded by re-initialization".to_string(),
            ));
        }

        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(payload) => {
                let context = payload.frame_context;
                info!(
                    frame_context = %context,
                    api_version = payload.runtime.api_version,
                    capabilities = payload.runtime.supports.len(),
                    "Bridge initialized"
                );
                *session = Some(Arc::new(payload));
                *phase = Phase::Initialized(context);
                Ok(context)
            }
            Err(error) => {
                warn!(%error, "Handshake failed");
                *session = None;
                *phase = Phase::Failed(error.clone());
                Err(error)
            }
        }
    }

    /// Forget the session and capability snapshot. A handshake still in flight is superseded.
    pub fn reset(&self) {
        let mut phase = self.lock_phase();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        *phase = Phase::Uninitialized;
        info!("Bridge state reset");
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framebridge_core::{Runtime, RuntimeCapabilities};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn payload(context: FrameContext) -> HandshakePayload {
        HandshakePayload {
            frame_context: context,
            host_client_type: Some("desktop".to_string()),
            runtime: Runtime::new(
                4,
                RuntimeCapabilities::from_flags([("marketplace", true), ("monetization", false)]),
            ),
        }
    }

    #[test]
    fn test_gate_before_initialization() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), InitializationState::Uninitialized);
        assert_eq!(
            lifecycle.ensure_initialized(&[]),
            Err(BridgeError::NotInitialized)
        );
        assert!(!lifecycle.is_supported("marketplace"));
        assert_eq!(lifecycle.api_version(), None);
    }

    #[tokio::test]
    async fn test_successful_handshake() {
        let lifecycle = Arc::new(Lifecycle::new());
        let context = lifecycle
            .initialize_with(|| future::ready(Ok(payload(FrameContext::Content))).boxed())
            .await
            .unwrap();

        assert_eq!(context, FrameContext::Content);
        assert_eq!(
            lifecycle.state(),
            InitializationState::Initialized(FrameContext::Content)
        );
        assert!(lifecycle.is_supported("marketplace"));
        assert!(!lifecycle.is_supported("monetization"));
        assert_eq!(lifecycle.api_version(), Some(4));
        assert_eq!(
            lifecycle.session().unwrap().host_client_type.as_deref(),
            Some("desktop")
        );
    }

    #[tokio::test]
    async fn test_context_gate() {
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle
            .initialize_with(|| future::ready(Ok(payload(FrameContext::SidePanel))).boxed())
            .await
            .unwrap();

        assert_eq!(
            lifecycle.ensure_initialized(&[FrameContext::Content]),
            Err(BridgeError::InvalidContext {
                current: FrameContext::SidePanel,
                expected: vec![FrameContext::Content],
            })
        );
        assert_eq!(
            lifecycle.ensure_initialized(&[FrameContext::Content, FrameContext::SidePanel]),
            Ok(FrameContext::SidePanel)
        );
        assert_eq!(lifecycle.ensure_initialized(&[]), Ok(FrameContext::SidePanel));
    }

    #[tokio::test]
    async fn test_concurrent_initialize_shares_one_handshake() {
        let lifecycle = Arc::new(Lifecycle::new());
        let starts = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<HandshakePayload>();

        let counted = starts.clone();
        let first = lifecycle.initialize_with(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            async move { rx.await.map_err(|_| BridgeError::TransportClosed) }.boxed()
        });
        let counted = starts.clone();
        let second = lifecycle.initialize_with(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(payload(FrameContext::Task))).boxed()
        });

        assert_eq!(lifecycle.state(), InitializationState::Initializing);
        tx.send(payload(FrameContext::Content)).unwrap();

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Ok(FrameContext::Content));
        assert_eq!(b, Ok(FrameContext::Content));
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        // Already initialized: the start closure is not consulted again.
        let again = lifecycle
            .initialize_with(|| unreachable!("no second handshake"))
            .await;
        assert_eq!(again, Ok(FrameContext::Content));
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let lifecycle = Arc::new(Lifecycle::new());
        let failed = lifecycle
            .initialize_with(|| future::ready(Err(BridgeError::HandshakeTimedOut)).boxed())
            .await;
        assert_eq!(failed, Err(BridgeError::HandshakeTimedOut));
        assert_eq!(lifecycle.state(), InitializationState::Failed);
        assert_eq!(lifecycle.failure(), Some(BridgeError::HandshakeTimedOut));
        assert_eq!(
            lifecycle.ensure_initialized(&[]),
            Err(BridgeError::NotInitialized)
        );

        let retried = lifecycle
            .initialize_with(|| future::ready(Ok(payload(FrameContext::Content))).boxed())
            .await;
        assert_eq!(retried, Ok(FrameContext::Content));
    }

    #[tokio::test]
    async fn test_reset_supersedes_in_flight_handshake() {
        let lifecycle = Arc::new(Lifecycle::new());
        let (tx, rx) = oneshot::channel::<HandshakePayload>();
        let stale = lifecycle.initialize_with(move || {
            async move { rx.await.map_err(|_| BridgeError::TransportClosed) }.boxed()
        });

        lifecycle.reset();
        tx.send(payload(FrameContext::Content)).unwrap();

        assert!(matches!(stale.await, Err(BridgeError::HandshakeFailed(_))));
        assert_eq!(lifecycle.state(), InitializationState::Uninitialized);
        assert!(lifecycle.session().is_none());
    }
}
