// Inbound side of the transport adapter
// Filters frames by origin and shape, then settles responses or dispatches events

use crate::correlation::PendingRequests;
use crate::events::EventHandlers;
use framebridge_core::{decode_inbound, Inbound, RequestId};
use framebridge_transport::{parse_url, serialize_origin, Frame, FrameReceiver};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn, Instrument, Span};
use url::Url;

/// Which origins may talk to the bridge.
///
/// Patterns are origins, compared after serialization (so case, userinfo,
/// paths and default ports do not matter), or `scheme://*.domain[:port]`
/// wildcards matching any subdomain of `domain` (not `domain` itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    patterns: Vec<OriginPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginPattern {
    Exact(String),
    Subdomains {
        scheme: String,
        domain: String,
        port: Option<u16>,
    },
}

impl OriginPattern {
    fn parse(pattern: &str) -> Option<Self> {
        let url = parse_url(pattern).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        match host.strip_prefix("*.") {
            Some(domain) if !domain.is_empty() && !domain.contains('*') => {
                Some(OriginPattern::Subdomains {
                    scheme: url.scheme().to_string(),
                    domain: domain.to_string(),
                    port: url.port_or_known_default(),
                })
            }
            _ if host.contains('*') => None,
            _ => Some(OriginPattern::Exact(serialize_origin(&url))),
        }
    }

    fn matches(&self, origin: &Url) -> bool {
        match self {
            OriginPattern::Exact(expected) => serialize_origin(origin) == *expected,
            OriginPattern::Subdomains {
                scheme,
                domain,
                port,
            } => {
                let Some(host) = origin.host_str() else {
                    return false;
                };
                origin.scheme() == scheme
                    && origin.port_or_known_default() == *port
                    && host
                        .to_ascii_lowercase()
                        .strip_suffix(domain.as_str())
                        .and_then(|sub| sub.strip_suffix('.'))
                        .is_some_and(|sub| !sub.is_empty())
            }
        }
    }
}

impl OriginPolicy {
    /// Build a policy from origin patterns. Patterns that do not parse are logged and skipped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|pattern| {
                let pattern = pattern.as_ref();
                let parsed = OriginPattern::parse(pattern);
                if parsed.is_none() {
                    warn!(pattern, "Ignoring invalid origin pattern");
                }
                parsed
            })
            .collect();
        Self { patterns }
    }

    pub fn allows(&self, origin: &str) -> bool {
        let Ok(origin) = parse_url(origin) else {
            return false;
        };
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&origin))
    }
}

/// What became of one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Settled(RequestId),
    UnknownResponse(RequestId),
    Event { name: String, handled: bool },
    ForeignOrigin,
    Malformed,
}

/// Routes inbound frames to the correlation table or the event handlers.
#[derive(Debug)]
pub struct InboundRouter {
    origins: OriginPolicy,
    pending: Arc<PendingRequests>,
    events: Arc<EventHandlers>,
    max_frame_size: usize,
}

impl InboundRouter {
    pub fn new(
        origins: OriginPolicy,
        pending: Arc<PendingRequests>,
        events: Arc<EventHandlers>,
        max_frame_size: usize,
    ) -> Self {
        Self {
            origins,
            pending,
            events,
            max_frame_size,
        }
    }

    pub fn route(&self, frame: Frame) -> Disposition {
        if !self.origins.allows(&frame.origin) {
            warn!(origin = %frame.origin, "Dropping frame from unexpected origin");
            return Disposition::ForeignOrigin;
        }

        if frame.data.len() > self.max_frame_size {
            warn!(
                origin = %frame.origin,
                size = frame.data.len(),
                limit = self.max_frame_size,
                "Dropping oversized frame"
            );
            return Disposition::Malformed;
        }

        let inbound = match decode_inbound(&frame.data) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(origin = %frame.origin, error = %e, "Dropping malformed frame");
                return Disposition::Malformed;
            }
        };

        match inbound {
            Inbound::Response(response) => {
                let id = response.id;
                match self.pending.settle(id, response.outcome) {
                    Ok(()) => {
                        trace!(request_id = id.as_u64(), "Settled request");
                        Disposition::Settled(id)
                    }
                    Err(e) => {
                        warn!(request_id = id.as_u64(), error = %e, "Ignoring response");
                        Disposition::UnknownResponse(id)
                    }
                }
            }
            Inbound::Event(event) => {
                let handled = self.events.dispatch(&event.function_name, &event.args);
                if !handled {
                    debug!(function = %event.function_name, "No handler for host event");
                }
                Disposition::Event {
                    name: event.function_name,
                    handled,
                }
            }
        }
    }
}

/// Drive `receiver` until the channel closes, routing every frame.
///
/// When the loop ends the correlation table is closed: outstanding requests
/// fail with `TransportClosed` and later ones are refused before anything is posted.
pub fn spawn_pump(
    mut receiver: Box<dyn FrameReceiver>,
    router: InboundRouter,
    span: Span,
) -> JoinHandle<()> {
    let pump = async move {
        loop {
            match receiver.recv().await {
                Ok(Some(frame)) => {
                    router.route(frame);
                }
                Ok(None) => {
                    info!("Transport closed by peer");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Transport receive failed");
                    break;
                }
            }
        }

        let failed = router.pending.close();
        if failed > 0 {
            warn!(count = failed, "Rejected outstanding requests after transport closed");
        }
    };
    tokio::spawn(pump.instrument(span))
}
