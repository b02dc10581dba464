//! Shape fragment loading.

use geo_types::{Coord, LineString};
use tracing::{debug, trace};

use crate::domain::{CompanyId, ShapeFragment, ShapeKey, StopKey};
use crate::source::ShapeRecord;
use crate::store::AddOutcome;

use super::{BatchStage, ConsolidationPipeline, Issue, IssueKind, PipelineError, StageCounts};

fn to_coords(points: &[[f64; 2]]) -> Vec<Coord<f64>> {
    points.iter().map(|&[x, y]| Coord { x, y }).collect()
}

impl ConsolidationPipeline<'_> {
    /// Load shape fragments and free-standing network polylines.
    ///
    /// Fragments whose end stops are unknown are dropped. When the database
    /// has a shape graph, newly stored fragments and the polylines are added
    /// to it.
    pub fn load_shapes(
        &mut self,
        records: &[ShapeRecord],
        network_polylines: &[Vec<[f64; 2]>],
    ) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::ShapesLoaded)?;
        let mut counts = StageCounts::with_read(records.len());
        let mut new_polylines: Vec<LineString<f64>> = Vec::new();

        for record in records {
            let key = ShapeKey {
                company: CompanyId(record.company_id),
                from: StopKey::new(record.from_node, record.from_stop),
                to: StopKey::new(record.to_node, record.to_stop),
                variant: record.variant,
            };
            let label = format!("shape {key}");
            let Some(calendar) = self.parse_calendar(&record.calendar, &label, &mut counts) else {
                continue;
            };

            let missing: Vec<StopKey> = [key.from, key.to]
                .into_iter()
                .filter(|stop| !self.db.stops.contains_key(stop))
                .collect();
            if !missing.is_empty() {
                let list: Vec<String> = missing.iter().map(ToString::to_string).collect();
                self.report(
                    Issue::error(
                        IssueKind::MissingReference,
                        format!("stop {} not found; shape dropped", list.join(", ")),
                    ),
                    &label,
                );
                counts.dropped += 1;
                continue;
            }

            let fragment = ShapeFragment {
                key,
                coords: to_coords(&record.coords),
            };
            let polyline = LineString::new(fragment.coords.clone());

            match self.db.shapes.add_or_merge_version(
                key,
                fragment,
                calendar,
                ShapeFragment::is_equivalent,
            ) {
                Ok(outcome) => {
                    trace!(shape = %key, outcome = ?outcome, "Stored shape fragment");
                    match outcome {
                        AddOutcome::Appended => new_polylines.push(polyline),
                        AddOutcome::Merged { .. } => {}
                        AddOutcome::Conflict { .. } => self.report(
                            Issue::warning(
                                IssueKind::Conflict,
                                format!("shape {key} differs from the version stored for overlapping days"),
                            ),
                            &label,
                        ),
                    }
                    counts.record(&outcome);
                }
                Err(_) => counts.dropped += 1,
            }
        }

        new_polylines.extend(
            network_polylines
                .iter()
                .map(|points| LineString::new(to_coords(points))),
        );

        match self.db.shape_graph_mut() {
            Some(graph) => graph.load_from_polylines(new_polylines),
            None if !new_polylines.is_empty() => {
                debug!(
                    polylines = new_polylines.len(),
                    "No shape graph attached; skipping geometry"
                );
            }
            None => {}
        }

        Ok(self.finish_stage(counts))
    }
}
