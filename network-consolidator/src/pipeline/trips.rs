//! Trip loading.

use geo_types::Coord;
use tracing::trace;

use crate::calendar::ServiceCalendar;
use crate::domain::{
    CompanyId, GraphId, RemarkId, RunId, RunKey, StopKey, StopTime, Trip, TripKey, VehicleTypeId,
    clamp_stop_times, parse_clock_sequence,
};
use crate::source::{StopTimeRecord, TripRecord};
use crate::store::{AddOutcome, Lookup};

use super::{BatchStage, ConsolidationPipeline, Issue, IssueKind, PipelineError, StageCounts};

/// A trip's call at a resolved stop, with the stop's position.
pub(super) type ResolvedStop = (StopKey, Option<Coord<f64>>);

/// A trip ready to store, with what its geometry is built from.
struct BuiltTrip {
    trip: Trip,
    stops: Vec<ResolvedStop>,
    company: CompanyId,
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ConsolidationPipeline<'_> {
    /// Load trips.
    ///
    /// A trip is dropped when its graph, route or any of its stops cannot be
    /// resolved, or when its times are malformed. Missing remarks, vehicle
    /// types and runs only drop the reference.
    ///
    /// A trip number may appear once per file. Copies from other files are
    /// versioned: disjoint periods add a version, and an overlapping copy of
    /// the same service extends the stored one.
    pub fn load_trips(&mut self, records: &[TripRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::TripsLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let key = TripKey::new(record.line, record.trip);
            let label = format!("trip {key}");
            let Some(calendar) = self.parse_calendar(&record.calendar, &label, &mut counts) else {
                continue;
            };

            if self.batch_trips.contains(&key) {
                self.report(
                    Issue::warning(
                        IssueKind::Conflict,
                        format!("trip {key} defined more than once in this file; keeping the first"),
                    ),
                    &label,
                );
                counts.conflicts += 1;
                continue;
            }

            let Some(BuiltTrip {
                trip,
                stops,
                company,
            }) = self.build_trip(record, key, &calendar, &label)
            else {
                counts.dropped += 1;
                continue;
            };
            self.batch_trips.insert(key);
            let run = trip.run;

            let outcome = match self.db.trips.add_or_merge_version(
                key,
                trip,
                calendar.clone(),
                Trip::same_service,
            ) {
                Ok(outcome) => outcome,
                Err(_) => {
                    counts.dropped += 1;
                    continue;
                }
            };
            trace!(trip = %key, outcome = ?outcome, "Stored trip");
            counts.record(&outcome);

            match outcome {
                AddOutcome::Appended => self.attach_geometry(key, company, &stops, &calendar, &label),
                AddOutcome::Merged { .. } => {}
                AddOutcome::Conflict { .. } => {
                    self.report(
                        Issue::warning(
                            IssueKind::Conflict,
                            format!("trip {key} differs from the version stored for overlapping days"),
                        ),
                        &label,
                    );
                    continue;
                }
            }

            if let Some(run) = run {
                if let Some(run) = self.db.runs.get_mut(&run) {
                    run.trips.push(key);
                }
            }
        }

        Ok(self.finish_stage(counts))
    }

    /// Give a newly stored trip version its travelled path.
    fn attach_geometry(
        &mut self,
        key: TripKey,
        company: CompanyId,
        stops: &[ResolvedStop],
        calendar: &ServiceCalendar,
        label: &str,
    ) {
        if !self.config.build_geometry || self.db.shape_graph().is_none() {
            return;
        }
        let geometry = self.build_geometry(company, stops, calendar, label);
        // An appended version is the last one under its key
        if let Some(version) = self
            .db
            .trips
            .find_mut(&key)
            .and_then(|versions| versions.last_mut())
        {
            version.value.geometry = Some(geometry);
        }
    }

    fn build_trip(
        &mut self,
        record: &TripRecord,
        key: TripKey,
        calendar: &ServiceCalendar,
        label: &str,
    ) -> Option<BuiltTrip> {
        let graph = GraphId(record.graph_id);
        let Some(graph_validity) = self.db.graphs.get(&graph).map(|g| g.validity.clone()) else {
            self.report(
                Issue::error(
                    IssueKind::MissingReference,
                    format!("graph {graph} not found; trip dropped"),
                ),
                label,
            );
            return None;
        };

        if record.stop_times.len() < 2 {
            self.report(
                Issue::error(
                    IssueKind::MalformedInput,
                    format!("trip has {} stop(s); at least two needed", record.stop_times.len()),
                ),
                label,
            );
            return None;
        }

        let stops = self.resolve_trip_stops(&record.stop_times, calendar, label)?;
        let stop_times = self.build_stop_times(&record.stop_times, &stops, label)?;
        let route = self.resolve_route(key.line(), calendar, label)?;

        let run = record.run_id.map(RunId).and_then(|id| {
            let key = RunKey::new(self.batch, id);
            if self.db.runs.contains_key(&key) {
                Some(key)
            } else {
                self.report(
                    Issue::warning(
                        IssueKind::MissingReference,
                        format!("run {id} not found; trip kept without run"),
                    ),
                    label,
                );
                None
            }
        });

        let vehicle_type = record.vehicle_type_id.map(VehicleTypeId).and_then(|id| {
            if self.db.vehicle_types.contains_key(&id) {
                Some(id)
            } else {
                self.report(
                    Issue::warning(
                        IssueKind::MissingReference,
                        format!("vehicle type {id} not found; reference skipped"),
                    ),
                    label,
                );
                None
            }
        });

        let mut remarks = Vec::with_capacity(record.remark_ids.len());
        for id in record.remark_ids.iter().copied().map(RemarkId) {
            if self.db.remarks.contains_key(&id) {
                remarks.push(id);
            } else {
                self.report(
                    Issue::warning(
                        IssueKind::MissingReference,
                        format!("remark {id} not found; reference skipped"),
                    ),
                    label,
                );
            }
        }

        self.check_trip_calendar(calendar, &graph_validity, run, label);

        let trip = Trip {
            key,
            route: route.line,
            graph,
            run,
            vehicle_type,
            remarks,
            stop_times,
            geometry: None,
        };
        Some(BuiltTrip {
            trip,
            stops,
            company: route.agency,
        })
    }

    /// Look up every stop of a trip. `None` if any is missing.
    fn resolve_trip_stops(
        &mut self,
        records: &[StopTimeRecord],
        calendar: &ServiceCalendar,
        label: &str,
    ) -> Option<Vec<ResolvedStop>> {
        let mut resolved = Vec::with_capacity(records.len());

        for record in records {
            let stop = StopKey::new(record.node_id, record.stop_id);
            match self.db.stops.find_or_default(&stop, calendar) {
                Lookup::Exact(version) => resolved.push((stop, version.value.coord)),
                Lookup::OtherPeriod(version) => {
                    let coord = version.value.coord;
                    self.report(
                        Issue::warning(
                            IssueKind::Substitution,
                            format!("stop {stop} is not valid on all trip days; using version from another period"),
                        ),
                        label,
                    );
                    resolved.push((stop, coord));
                }
                Lookup::Missing => {
                    self.report(
                        Issue::error(
                            IssueKind::MissingReference,
                            format!("stop {stop} not found; trip dropped"),
                        ),
                        label,
                    );
                    return None;
                }
            }
        }

        Some(resolved)
    }

    /// Parse clock values across the whole trip, then clamp them into order.
    fn build_stop_times(
        &mut self,
        records: &[StopTimeRecord],
        stops: &[ResolvedStop],
        label: &str,
    ) -> Option<Vec<StopTime>> {
        let clock: Vec<Option<&str>> = records
            .iter()
            .flat_map(|r| [blank_to_none(&r.arrival), blank_to_none(&r.departure)])
            .collect();

        let parsed = match parse_clock_sequence(&clock, self.config.rollover_threshold_hours) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.report(
                    Issue::error(IssueKind::MalformedInput, format!("{e}; trip dropped")),
                    label,
                );
                return None;
            }
        };

        let raw: Vec<StopTime> = stops
            .iter()
            .zip(parsed.chunks(2))
            .map(|(&(stop, _), times)| StopTime::new(stop, times[0], times[1]))
            .collect();

        let (stop_times, corrections) = clamp_stop_times(&raw);
        for correction in corrections {
            self.report(
                Issue::warning(IssueKind::TimeCorrection, correction.to_string()),
                label,
            );
        }
        Some(stop_times)
    }

    /// Warn when a trip runs on days its graph or run does not cover.
    fn check_trip_calendar(
        &mut self,
        calendar: &ServiceCalendar,
        graph_validity: &ServiceCalendar,
        run: Option<RunKey>,
        label: &str,
    ) {
        if !calendar.is_subset_of(graph_validity) {
            let outside = calendar.subtract(graph_validity).count_valid_days();
            self.report(
                Issue::warning(
                    IssueKind::CalendarInconsistency,
                    format!("trip runs on {outside} day(s) outside its graph's validity"),
                ),
                label,
            );
        }

        let Some(id) = run else {
            return;
        };
        let Some(run_calendar) = self.db.runs.get(&id).map(|r| r.calendar.clone()) else {
            return;
        };
        if !calendar.is_subset_of(&run_calendar) {
            let outside = calendar.subtract(&run_calendar).count_valid_days();
            self.report(
                Issue::warning(
                    IssueKind::CalendarInconsistency,
                    format!("trip runs on {outside} day(s) when run {} does not", id.run),
                ),
                label,
            );
        }
    }
}
