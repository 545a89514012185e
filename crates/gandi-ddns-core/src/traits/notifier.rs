// # Notifier Trait
//
// Out-of-band alerting for IP mismatches and applied record updates.
//
// ## Implementations
//
// - `CommandNotifier`: runs an external program with the message as argument
// - `MemoryNotifier`: collects messages (tests, embedding)
// - `NoopNotifier`: discards everything

use async_trait::async_trait;

/// Fire-and-forget event sink
///
/// Delivery is best-effort. Implementations log their own failures and never
/// return them; the engine does not depend on delivery success.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one free-text event
    async fn notify(&self, message: &str);
}
