use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlation id carried by every request envelope and echoed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        RequestId(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        RequestId::new(value)
    }
}

/// Hands out strictly increasing request ids for one bridge session.
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU64,
}

impl RequestIdAllocator {
    pub fn new() -> Self {
        RequestIdAllocator {
            next: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> RequestId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        RequestId::new(id)
    }

    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_id_display_and_conversion() {
        let id: RequestId = 7u64.into();
        assert_eq!(id.as_u64(), 7);
        assert_eq!(format!("{}", id), "RequestId(7)");
    }

    #[test]
    fn test_allocator_monotonic() {
        let allocator = RequestIdAllocator::new();

        let id1 = allocator.allocate();
        let id2 = allocator.allocate();
        let id3 = allocator.allocate();

        assert_eq!(id1.as_u64(), 1);
        assert_eq!(id2.as_u64(), 2);
        assert_eq!(id3.as_u64(), 3);
        assert!(id1 < id2 && id2 < id3);
        assert_eq!(allocator.peek_next(), 4);
    }

    #[test]
    fn test_allocator_never_repeats_across_threads() {
        let allocator = Arc::new(RequestIdAllocator::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let alloc = Arc::clone(&allocator);
            handles.push(thread::spawn(move || {
                (0..50).map(|_| alloc.allocate().as_u64()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "Duplicate request id: {}", id);
            }
        }
        assert_eq!(seen.len(), 400);
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&RequestId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: RequestId = serde_json::from_str("42").unwrap();
        assert_eq!(back, RequestId::new(42));
    }
}
