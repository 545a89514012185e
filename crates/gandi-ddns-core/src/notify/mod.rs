// # Notifier Implementations
//
// This module provides implementations of the Notifier trait for
// different delivery strategies.

pub mod command;
pub mod memory;

pub use command::CommandNotifier;
pub use memory::MemoryNotifier;

use crate::traits::Notifier;
use async_trait::async_trait;

/// Notifier used when nothing is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, message: &str) {
        tracing::trace!("No notifier configured, dropping: {}", message);
    }
}
