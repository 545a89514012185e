// # gandi-ddns-core
//
// Core library for declarative dynamic DNS on Gandi LiveDNS.
//
// ## Architecture Overview
//
// This library provides the core functionality for reconciling a zone with
// the host's address:
// - **IpSource**: Trait for detecting the local or public IP
// - **ZoneProvider**: Trait for reading and writing RRsets via the provider API
// - **Notifier**: Trait for best-effort event delivery
// - **IpResolver**: Combines the local and public sources, flags mismatches
// - **ReconcilerEngine**: Resolve → fetch → compare → write, per record
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the HTTP and netlink implementations
// 2. **Pure Resolution**: Desired records are never mutated; resolution yields new values
// 3. **Single Pass**: One run per invocation, strictly sequential, no retries
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Per-Record Failure Isolation**: Only IP detection and config errors abort a run

pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{DesiredState, GandiDdnsConfig};
pub use engine::{IpObservation, IpResolver, ReconcilerEngine, RecordOutcome, ReportEntry, RunReport};
pub use error::{Error, Result};
pub use notify::{CommandNotifier, MemoryNotifier, NoopNotifier};
pub use record::{DEFAULT_TTL, Record, RecordType, ResolvedRecord, ValueComparison};
pub use traits::{IpSource, LiveRecord, Notifier, ZoneProvider};
