//! Route loading and route resolution for trips.

use tracing::{debug, trace};

use crate::calendar::ServiceCalendar;
use crate::domain::{CompanyId, LineNumber, Route};
use crate::merge::group_and_merge;
use crate::source::RouteRecord;
use crate::store::{Lookup, Version};

use super::{BatchStage, ConsolidationPipeline, Issue, IssueKind, PipelineError, StageCounts};

impl ConsolidationPipeline<'_> {
    /// Load routes.
    ///
    /// Records of the same line with the same payload are folded together
    /// first, so a line split over several records in one file becomes one
    /// version with their union calendar.
    pub fn load_routes(&mut self, records: &[RouteRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::RoutesLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        let mut candidates = Vec::with_capacity(records.len());
        for record in records {
            let line = LineNumber(record.line);
            let label = format!("route {line}");
            let Some(calendar) = self.parse_calendar(&record.calendar, &label, &mut counts) else {
                continue;
            };

            let agency = CompanyId(record.company_id);
            if !self.db.agencies.contains_key(&agency) {
                self.report(
                    Issue::error(
                        IssueKind::MissingReference,
                        format!("agency {agency} not found; route dropped"),
                    ),
                    &label,
                );
                counts.dropped += 1;
                continue;
            }

            let route = Route {
                line,
                name: record.name.clone(),
                agency,
                category: record.category.unwrap_or_default(),
                autogenerated: false,
            };
            candidates.push(Version {
                value: route,
                calendar,
            });
        }

        let before = candidates.len();
        let grouped: Vec<Version<Route>> = group_and_merge(
            candidates,
            |a, b| a.value == b.value,
            |into, other| into.calendar.union_with(&other.calendar),
        )
        .collect();
        if grouped.len() < before {
            debug!(
                records = before,
                groups = grouped.len(),
                "Folded identical route records"
            );
            counts.merged += before - grouped.len();
        }

        for Version { value, calendar } in grouped {
            let line = value.line;
            match self
                .db
                .routes
                .add_or_merge_version(line, value, calendar, Route::is_equivalent)
            {
                Ok(outcome) => {
                    trace!(line = %line, outcome = ?outcome, "Stored route");
                    if !outcome.is_stored() {
                        self.report(
                            Issue::warning(
                                IssueKind::Conflict,
                                format!("route {line} differs from the version stored for overlapping days"),
                            ),
                            &format!("route {line}"),
                        );
                    }
                    counts.record(&outcome);
                }
                Err(_) => counts.dropped += 1,
            }
        }

        Ok(self.finish_stage(counts))
    }

    /// Find the route a trip on `line` runs on, for the trip's calendar.
    ///
    /// A route from another period is used with a warning. A missing route
    /// is made up if the line falls in a configured band; otherwise `None`
    /// is returned and the caller drops the trip.
    pub(super) fn resolve_route(
        &mut self,
        line: LineNumber,
        calendar: &ServiceCalendar,
        label: &str,
    ) -> Option<Route> {
        match self.db.routes.find_or_default(&line, calendar) {
            Lookup::Exact(version) => return Some(version.value.clone()),
            Lookup::OtherPeriod(version) => {
                let route = version.value.clone();
                self.report(
                    Issue::warning(
                        IssueKind::Substitution,
                        format!("route {line} is not valid on all trip days; using version from another period"),
                    ),
                    label,
                );
                return Some(route);
            }
            Lookup::Missing => {}
        }

        let config = self.config;
        let Some(band) = config.auto_route_band(line) else {
            self.report(
                Issue::error(
                    IssueKind::MissingReference,
                    format!("route {line} not found; trip dropped"),
                ),
                label,
            );
            return None;
        };

        let route = Route::autogenerated(line, band.agency(), band.category);
        match self.db.routes.add_or_merge_version(
            line,
            route.clone(),
            calendar.clone(),
            Route::is_equivalent,
        ) {
            Ok(_) => {
                self.report(
                    Issue::warning(
                        IssueKind::Substitution,
                        format!("route {line} not found; autogenerated as {}", band.category),
                    ),
                    label,
                );
                Some(route)
            }
            Err(_) => None,
        }
    }
}
