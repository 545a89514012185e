//! Core reconciliation engine
//!
//! The ReconcilerEngine is responsible for:
//! - Detecting the local and public IP via IpResolver
//! - Resolving desired records against the local IP
//! - Reading the live RRset of every record via ZoneProvider
//! - Writing the records that differ
//! - Notifying about mismatches and applied updates
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ IpResolver  │─── IpObservation ───┐
//! └─────────────┘                     │
//!                                     ▼
//!                          ┌──────────────────┐
//!                          │ ReconcilerEngine │
//!                          └──────────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ Record      │           │ ZoneProvider │           │  Notifier   │
//! │ (resolve)   │           │ (get / put)  │           │  (events)   │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Record Flow
//!
//! 1. Resolve placeholders (IP fill-in, PTR naming)
//! 2. Fetch the live RRset and classify it (found / absent / unexpected)
//! 3. Compare live and desired values
//! 4. Write if they differ, then notify
//!
//! Per-record failures are logged and reported; they never stop the run.

pub mod resolver;

pub use resolver::{IpObservation, IpResolver};

use crate::config::{DesiredState, GandiDdnsConfig};
use crate::error::Result;
use crate::record::{ResolvedRecord, ValueComparison, describe_values};
use crate::traits::{LiveRecord, Notifier, PutOutcome, ZoneProvider};
use serde_json::Value;
use std::net::IpAddr;
use tracing::{debug, error, info};

/// What happened to one declared record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Live values already match
    Unchanged,

    /// The RRset was written
    Applied {
        previous: Option<Vec<String>>,
        current: Vec<String>,
    },

    /// Dry-run: the RRset would have been written
    WouldApply {
        previous: Option<Vec<String>>,
        current: Vec<String>,
    },

    /// The live lookup returned something unrecognized; no write attempted
    Skipped { payload: Value },

    /// A request failed (domain lookup, record read or write)
    Failed { error: String },
}

impl RecordOutcome {
    /// Whether a write was issued and accepted
    pub fn is_applied(&self) -> bool {
        matches!(self, RecordOutcome::Applied { .. })
    }

    /// Whether the record could not be reconciled
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RecordOutcome::Skipped { .. } | RecordOutcome::Failed { .. }
        )
    }
}

/// One line of the run report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    /// Domain the record belongs to
    pub domain: String,
    /// The record after resolution
    pub record: ResolvedRecord,
    /// What happened
    pub outcome: RecordOutcome,
}

/// Result of a complete run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Addresses detected at the start of the run
    pub observation: IpObservation,
    /// Outcomes in processing order
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    /// Number of records written
    pub fn applied_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_applied()).count()
    }

    /// Number of records skipped or failed
    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failure()).count()
    }
}

/// Core reconciliation engine
///
/// The engine drives a single pass over the desired state: one IP
/// resolution, then every domain and record in order, one request at a time.
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcilerEngine::new()`]
/// 2. Call [`ReconcilerEngine::run()`] once per scheduled invocation
///
/// ## Failure Handling
///
/// - IP detection failures are returned as `Err` (fatal)
/// - Everything after that is caught per record and reported in [`RunReport`]
pub struct ReconcilerEngine {
    /// Local/public IP detection
    resolver: IpResolver,

    /// Zone API
    provider: Box<dyn ZoneProvider>,

    /// Event sink
    notifier: Box<dyn Notifier>,

    /// Records to reconcile
    desired: DesiredState,

    /// RRset equality policy
    comparison: ValueComparison,
}

impl ReconcilerEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: local/public IP detection
    /// - `provider`: zone provider implementation
    /// - `notifier`: event sink
    /// - `config`: validated before use; only the desired state and the
    ///   comparison policy are kept
    pub fn new(
        resolver: IpResolver,
        provider: Box<dyn ZoneProvider>,
        notifier: Box<dyn Notifier>,
        config: &GandiDdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            provider,
            notifier,
            desired: config.domains.clone(),
            comparison: config.value_comparison,
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: the pass completed (individual records may have failed)
    /// - `Err(Error)`: IP detection failed
    pub async fn run(&self) -> Result<RunReport> {
        let observation = self.resolver.resolve().await?;
        if observation.mismatch {
            self.notifier.notify(&observation.mismatch_message()).await;
        }
        info!("Local IP: {}", observation.local);

        let entries = self.reconcile(observation.local).await;
        let report = RunReport {
            observation,
            entries,
        };

        info!(
            "Run complete: {} record(s), {} updated, {} failed",
            report.entries.len(),
            report.applied_count(),
            report.failure_count()
        );

        Ok(report)
    }

    /// Reconcile every record against an already-detected local IP
    pub async fn reconcile(&self, local_ip: IpAddr) -> Vec<ReportEntry> {
        let mut entries = Vec::new();

        for (domain, records) in &self.desired {
            let zone_href = match self.provider.domain_info(domain).await {
                Ok(info) => info.zone_records_href,
                Err(e) => {
                    error!("Failed to look up domain {}: {}", domain, e);
                    for record in records {
                        entries.push(ReportEntry {
                            domain: domain.clone(),
                            record: record.resolve(domain, local_ip),
                            outcome: RecordOutcome::Failed {
                                error: e.to_string(),
                            },
                        });
                    }
                    continue;
                }
            };

            for record in records {
                let resolved = record.resolve(domain, local_ip);
                let outcome = self.reconcile_record(domain, &zone_href, &resolved).await;
                entries.push(ReportEntry {
                    domain: domain.clone(),
                    record: resolved,
                    outcome,
                });
            }
        }

        entries
    }

    /// Fetch, compare and, if needed, write one record
    async fn reconcile_record(
        &self,
        domain: &str,
        zone_href: &str,
        record: &ResolvedRecord,
    ) -> RecordOutcome {
        debug!("Checking {} {}", domain, record);

        let live = match self
            .provider
            .get_record(zone_href, &record.name, &record.record_type)
            .await
        {
            Ok(live) => live,
            Err(e) => {
                error!("Failed to read {} {}: {}", domain, record, e);
                return RecordOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let previous = match live {
            LiveRecord::Found(set) => Some(set.values),
            LiveRecord::Absent => {
                debug!("{} {} does not exist yet, will be created", domain, record);
                None
            }
            LiveRecord::Unexpected(payload) => {
                error!(
                    "Unexpected response for {} {}, can't update: {}",
                    domain, record, payload
                );
                return RecordOutcome::Skipped { payload };
            }
        };

        if self
            .comparison
            .values_match(previous.as_deref(), &record.values)
        {
            debug!("{} {} is up to date", domain, record);
            return RecordOutcome::Unchanged;
        }

        match self.provider.put_record(zone_href, record).await {
            Ok(PutOutcome::Applied(ack)) => {
                info!(
                    "Updated {} {} {} from {} to {} ({})",
                    domain,
                    record.record_type,
                    record.name,
                    describe_values(previous.as_deref()),
                    describe_values(Some(&record.values)),
                    ack
                );
                self.notifier
                    .notify(&format!(
                        "updating {} {} {} from {} to {}",
                        domain,
                        record.record_type,
                        record.name,
                        describe_values(previous.as_deref()),
                        describe_values(Some(&record.values))
                    ))
                    .await;

                RecordOutcome::Applied {
                    previous,
                    current: record.values.clone(),
                }
            }
            Ok(PutOutcome::DryRun) => {
                info!(
                    "[DRY-RUN] Would update {} {} {} from {} to {}",
                    domain,
                    record.record_type,
                    record.name,
                    describe_values(previous.as_deref()),
                    describe_values(Some(&record.values))
                );
                RecordOutcome::WouldApply {
                    previous,
                    current: record.values.clone(),
                }
            }
            Err(e) => {
                error!("Failed to write {} {}: {}", domain, record, e);
                RecordOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Provider name, for logs
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }
}
