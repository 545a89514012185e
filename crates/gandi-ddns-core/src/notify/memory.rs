// # Memory Notifier
//
// In-memory implementation of Notifier.
//
// Keeps every delivered message in order. Useful for tests and for callers
// embedding the engine that want to forward events themselves.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::traits::Notifier;

/// Notifier that records every message
///
/// Clones share the same message list.
///
/// # Example
///
/// ```rust
/// use gandi_ddns_core::notify::MemoryNotifier;
/// use gandi_ddns_core::traits::Notifier;
///
/// #[tokio::main]
/// async fn main() {
///     let notifier = MemoryNotifier::new();
///     notifier.notify("IP mismatch: 10.0.0.2 vs. 203.0.113.9").await;
///     assert_eq!(notifier.messages().await.len(), 1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<Vec<String>>>,
}

impl MemoryNotifier {
    /// Create a new empty notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first
    pub async fn messages(&self) -> Vec<String> {
        self.inner.lock().await.clone()
    }

    /// Check if nothing was delivered
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, message: &str) {
        self.inner.lock().await.push(message.to_string());
    }
}
