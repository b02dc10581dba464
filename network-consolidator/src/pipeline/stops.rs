//! Stop loading.

use geo_types::Coord;
use tracing::trace;

use crate::domain::{Stop, StopKey, TariffId};
use crate::source::StopRecord;

use super::{BatchStage, ConsolidationPipeline, Issue, IssueKind, PipelineError, StageCounts};

impl ConsolidationPipeline<'_> {
    /// Load stop posts.
    ///
    /// A stop referring to an unknown tariff system is kept without one.
    pub fn load_stops(&mut self, records: &[StopRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::StopsLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let key = StopKey::new(record.node_id, record.stop_id);
            let label = format!("stop {key}");
            let Some(calendar) = self.parse_calendar(&record.calendar, &label, &mut counts) else {
                continue;
            };

            let tariff = match record.tariff_id.map(TariffId) {
                Some(id) if !self.db.tariffs.contains_key(&id) => {
                    self.report(
                        Issue::warning(
                            IssueKind::MissingReference,
                            format!("tariff system {id} not found; stop kept without tariff"),
                        ),
                        &label,
                    );
                    None
                }
                other => other,
            };

            let coord = match (record.x, record.y) {
                (Some(x), Some(y)) => Some(Coord { x, y }),
                _ => None,
            };

            let stop = Stop {
                key,
                name: record.name.clone(),
                coord,
                tariff,
                zones: record.zones.clone(),
            };

            match self
                .db
                .stops
                .add_or_merge_version(key, stop, calendar, Stop::is_equivalent)
            {
                Ok(outcome) => {
                    trace!(stop = %key, outcome = ?outcome, "Stored stop");
                    if !outcome.is_stored() {
                        self.report(
                            Issue::warning(
                                IssueKind::Conflict,
                                format!("stop {key} differs from the version stored for overlapping days"),
                            ),
                            &label,
                        );
                    }
                    counts.record(&outcome);
                }
                // parse_calendar never yields an empty calendar
                Err(_) => counts.dropped += 1,
            }
        }

        Ok(self.finish_stage(counts))
    }
}
