//! Vehicle run loading.

use std::collections::hash_map::Entry;

use crate::domain::{Run, RunId, RunKey};
use crate::source::RunRecord;

use super::{BatchStage, ConsolidationPipeline, PipelineError, StageCounts};

impl ConsolidationPipeline<'_> {
    /// Load vehicle runs.
    ///
    /// Run numbers are scoped to the open file. Records for a run already
    /// seen in this file widen its calendar.
    pub fn load_runs(&mut self, records: &[RunRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::RunsLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let id = RunId(record.run_id);
            let label = format!("run {id}");
            let Some(calendar) = self.parse_calendar(&record.calendar, &label, &mut counts) else {
                continue;
            };

            let key = RunKey::new(self.batch, id);
            match self.db.runs.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(Run {
                        key,
                        calendar,
                        trips: Vec::new(),
                    });
                    counts.stored += 1;
                }
                Entry::Occupied(mut run) => {
                    run.get_mut().calendar.union_with(&calendar);
                    counts.merged += 1;
                }
            }
        }

        Ok(self.finish_stage(counts))
    }
}
