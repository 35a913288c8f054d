//! Sequential batch install/remove with outcome tallying
//!
//! Items are processed strictly in order, one external operation at a
//! time. The interrupt flag is checked before each item, so an in-flight
//! package operation always finishes before the batch stops.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::types::{Action, ItemOutcome};

/// The per-item collaborator that actually talks to the package manager
pub trait PackageBackend {
    /// Install one package: `Success`, `SuccessViaFallback`, `Skipped`, or `Failure`
    fn install(&mut self, name: &str) -> ItemOutcome;

    /// Remove one package: `Success` or `Failure`
    fn remove(&mut self, name: &str) -> ItemOutcome;

    /// Label of the fallback channel, shown next to fallback successes
    fn fallback_label(&self) -> &str {
        "fallback"
    }
}

/// Running success/failure counters for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failed_items: Vec<String>,
}

impl OutcomeTally {
    pub fn record(&mut self, name: &str, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Success | ItemOutcome::SuccessViaFallback => self.succeeded += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failure => {
                self.failed += 1;
                self.failed_items.push(name.to_string());
            }
        }
    }
}

/// One processed item, as handed to the observer
#[derive(Debug, Clone, Copy)]
pub struct ItemProgress<'a> {
    pub name: &'a str,
    pub outcome: ItemOutcome,
    /// 1-based position of this item
    pub position: usize,
    pub total: usize,
    pub percent: u8,
    pub fallback_label: &'a str,
}

/// Final state of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub action: Action,
    pub tally: OutcomeTally,
    pub processed: usize,
    pub total: usize,
    pub interrupted: bool,
}

/// Receives progress events during a batch
pub trait BatchObserver {
    fn batch_started(&mut self, _action: Action, _total: usize) {}
    fn item_finished(&mut self, progress: &ItemProgress<'_>);
    fn interrupted(&mut self, _processed: usize, _total: usize) {}
    fn batch_finished(&mut self, summary: &BatchSummary);
}

/// `round(100 * processed / total)`, with an empty batch counting as done
pub fn percent_complete(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (processed.min(total) as f64 * 100.0 / total as f64).round();
    pct as u8
}

/// Drives one external operation per item and tallies the results
pub struct BatchExecutor<'a> {
    interrupt: &'a AtomicBool,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(interrupt: &'a AtomicBool) -> Self {
        Self { interrupt }
    }

    pub fn run(
        &self,
        items: &[String],
        action: Action,
        backend: &mut dyn PackageBackend,
        observer: &mut dyn BatchObserver,
    ) -> BatchSummary {
        let total = items.len();
        let mut tally = OutcomeTally::default();
        let mut processed = 0;
        let mut interrupted = false;

        observer.batch_started(action, total);

        for name in items {
            if self.interrupt.load(Ordering::SeqCst) {
                interrupted = true;
                warn!(processed, total, "batch interrupted by user");
                observer.interrupted(processed, total);
                break;
            }

            let outcome = match action {
                Action::Install => backend.install(name),
                Action::Remove => backend.remove(name),
            };
            processed += 1;
            tally.record(name, outcome);
            info!(package = %name, ?outcome, action = action.verb(), "processed item");

            observer.item_finished(&ItemProgress {
                name,
                outcome,
                position: processed,
                total,
                percent: percent_complete(processed, total),
                fallback_label: backend.fallback_label(),
            });
        }

        let summary = BatchSummary {
            action,
            tally,
            processed,
            total,
            interrupted,
        };
        observer.batch_finished(&summary);
        summary
    }
}
