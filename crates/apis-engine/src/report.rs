//! Snapshot recording and the JSON run report.
//!
//! Every replicate gets a [`SnapshotRecorder`] that keeps one colony
//! snapshot every `interval` ticks. When all replicates are done their
//! summaries and snapshots are assembled into a [`RunReport`] and written
//! as one JSON document.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use apis_core::runner::{ReplicateOutcome, TickCallback};
use apis_core::tick::{SimulationState, TickSummary};
use apis_types::{ColonySnapshot, EndReason, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;

/// Tick callback that keeps a snapshot every `interval` ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecorder {
    interval: u64,
    snapshots: Vec<ColonySnapshot>,
}

impl SnapshotRecorder {
    /// Create a recorder keeping one snapshot every `interval` ticks.
    ///
    /// An interval of zero is treated as one.
    pub const fn new(interval: u64) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            snapshots: Vec::new(),
        }
    }

    /// The snapshots recorded so far, oldest first.
    pub fn snapshots(&self) -> &[ColonySnapshot] {
        &self.snapshots
    }

    /// Consume the recorder and return its snapshots.
    pub fn into_snapshots(self) -> Vec<ColonySnapshot> {
        self.snapshots
    }
}

impl TickCallback for SnapshotRecorder {
    fn on_tick(&mut self, summary: &TickSummary, _state: &SimulationState) {
        if summary.tick.checked_rem(self.interval) == Some(0) {
            debug!(
                tick = summary.tick,
                population = summary.population,
                "Snapshot recorded"
            );
            self.snapshots.push(summary.snapshot.clone());
        }
    }
}

/// One replicate in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicateReport {
    /// The replicate's summary.
    pub summary: RunSummary,
    /// Periodic snapshots, oldest first.
    pub snapshots: Vec<ColonySnapshot>,
}

/// How many replicates ended for each reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EndReasonCounts {
    /// Replicates that ran their full length.
    pub max_ticks_reached: u32,
    /// Replicates where the colony died out.
    pub extinction: u32,
    /// Replicates where the colony ran out of honey.
    pub starvation: u32,
}

impl EndReasonCounts {
    /// Count one replicate ending for `reason`.
    pub const fn record(&mut self, reason: EndReason) {
        let slot = match reason {
            EndReason::MaxTicksReached => &mut self.max_ticks_reached,
            EndReason::Extinction => &mut self.extinction,
            EndReason::Starvation => &mut self.starvation,
        };
        *slot = slot.saturating_add(1);
    }
}

/// The JSON document written at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// End reasons over all replicates.
    pub end_reasons: EndReasonCounts,
    /// Every replicate, in replicate order.
    pub replicates: Vec<ReplicateReport>,
}

impl RunReport {
    /// Assemble the report from finished replicates.
    pub fn from_outcomes(outcomes: Vec<ReplicateOutcome<SnapshotRecorder>>) -> Self {
        let mut end_reasons = EndReasonCounts::default();
        let replicates = outcomes
            .into_iter()
            .map(|outcome| {
                end_reasons.record(outcome.summary.end_reason);
                ReplicateReport {
                    summary: outcome.summary,
                    snapshots: outcome.callback.into_snapshots(),
                }
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            end_reasons,
            replicates,
        }
    }
}

/// Write `report` as pretty JSON to `path`, or to stdout when `None`.
///
/// # Errors
///
/// Returns [`EngineError::Output`] if the file cannot be written and
/// [`EngineError::Json`] if serialization fails.
pub fn write_report(report: &RunReport, path: Option<&Path>) -> Result<(), EngineError> {
    match path {
        Some(path) => {
            let output_error = |source| EngineError::Output {
                path: path.to_path_buf(),
                source,
            };
            let file = File::create(path).map_err(output_error)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n").map_err(output_error)?;
            writer.flush().map_err(output_error)
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, report)?;
            writeln!(stdout).map_err(|source| EngineError::Output {
                path: "<stdout>".into(),
                source,
            })
        }
    }
}
