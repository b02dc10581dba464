//! Per-file ingestion counters.

use serde::Serialize;

use crate::store::AddOutcome;

use super::stage::BatchStage;

/// What happened to the records of one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    /// Records in the source collection.
    pub read: usize,
    /// Records stored as a new version or entry.
    pub stored: usize,
    /// Records folded into an existing version or entry.
    pub merged: usize,
    /// Records rejected because they contradict stored data.
    pub conflicts: usize,
    /// Records skipped for malformed input, empty calendars or missing
    /// references.
    pub dropped: usize,
}

impl StageCounts {
    pub fn with_read(read: usize) -> Self {
        Self {
            read,
            ..Self::default()
        }
    }

    /// Count the outcome of a versioned insert.
    pub fn record(&mut self, outcome: &AddOutcome) {
        match outcome {
            AddOutcome::Appended => self.stored += 1,
            AddOutcome::Merged { .. } => self.merged += 1,
            AddOutcome::Conflict { .. } => self.conflicts += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: BatchStage,
    #[serde(flatten)]
    pub counts: StageCounts,
}

/// Counters for one ingested file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub file: String,
    pub stages: Vec<StageSummary>,
}

impl BatchSummary {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: BatchStage, counts: StageCounts) {
        self.stages.push(StageSummary { stage, counts });
    }

    pub fn counts(&self, stage: BatchStage) -> Option<StageCounts> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.counts)
    }

    /// Totals over all stages.
    pub fn total(&self) -> StageCounts {
        self.stages.iter().fold(StageCounts::default(), |acc, s| StageCounts {
            read: acc.read + s.counts.read,
            stored: acc.stored + s.counts.stored,
            merged: acc.merged + s.counts.merged,
            conflicts: acc.conflicts + s.counts.conflicts,
            dropped: acc.dropped + s.counts.dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_outcomes() {
        let mut counts = StageCounts::with_read(3);
        counts.record(&AddOutcome::Appended);
        counts.record(&AddOutcome::Merged { absorbed: 0 });
        counts.record(&AddOutcome::Conflict {
            existing: "1".parse().unwrap(),
        });
        assert_eq!(
            counts,
            StageCounts {
                read: 3,
                stored: 1,
                merged: 1,
                conflicts: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn totals_and_lookup() {
        let mut summary = BatchSummary::new("a.json");
        summary.push(BatchStage::StopsLoaded, StageCounts { read: 2, stored: 2, ..Default::default() });
        summary.push(BatchStage::TripsLoaded, StageCounts { read: 5, stored: 3, dropped: 2, ..Default::default() });

        assert_eq!(summary.counts(BatchStage::TripsLoaded).unwrap().dropped, 2);
        assert_eq!(summary.counts(BatchStage::RoutesLoaded), None);
        let total = summary.total();
        assert_eq!((total.read, total.stored, total.dropped), (7, 5, 2));
    }

    #[test]
    fn serializes_flat_stage_entries() {
        let mut summary = BatchSummary::new("a.json");
        summary.push(BatchStage::RunsLoaded, StageCounts::with_read(1));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stages"][0]["stage"], "runs_loaded");
        assert_eq!(json["stages"][0]["read"], 1);
    }
}
