//! Trip geometry reconstruction.

use geo_types::Coord;
use tracing::trace;

use crate::calendar::ServiceCalendar;
use crate::domain::{CompanyId, ShapeKey};
use crate::store::Lookup;

use super::trips::ResolvedStop;
use super::{ConsolidationPipeline, Issue, IssueKind};

/// Append `segment` to `path`, skipping its first point when it repeats the
/// path's last one.
fn append(path: &mut Vec<Coord<f64>>, segment: impl IntoIterator<Item = Coord<f64>>) {
    for coord in segment {
        if path.last() != Some(&coord) {
            path.push(coord);
        }
    }
}

impl ConsolidationPipeline<'_> {
    /// Build the travelled path of a trip through its stops.
    ///
    /// Each stop-to-stop segment comes from the company's shape fragment if
    /// one exists, else from a shortest path over the shape graph. Segments
    /// with neither are drawn straight and reported as one gap issue.
    pub(super) fn build_geometry(
        &mut self,
        company: CompanyId,
        stops: &[ResolvedStop],
        calendar: &ServiceCalendar,
        label: &str,
    ) -> Vec<Coord<f64>> {
        let mut path = Vec::new();
        let mut gaps = Vec::new();

        for pair in stops.windows(2) {
            let ((from, from_coord), (to, to_coord)) = (pair[0], pair[1]);
            match self.segment_geometry(company, pair[0], pair[1], calendar, label) {
                Some(segment) => append(&mut path, segment),
                None => {
                    append(&mut path, from_coord.into_iter().chain(to_coord));
                    gaps.push(format!("{from}-{to}"));
                }
            }
        }

        if !gaps.is_empty() {
            self.report(
                Issue::warning(
                    IssueKind::GeometryGap,
                    format!(
                        "{} of {} segment(s) drawn straight: {}",
                        gaps.len(),
                        stops.len().saturating_sub(1),
                        gaps.join(", ")
                    ),
                ),
                label,
            );
        }

        path
    }

    fn segment_geometry(
        &mut self,
        company: CompanyId,
        (from, from_coord): ResolvedStop,
        (to, to_coord): ResolvedStop,
        calendar: &ServiceCalendar,
        label: &str,
    ) -> Option<Vec<Coord<f64>>> {
        let key = ShapeKey {
            company,
            from,
            to,
            variant: 0,
        };
        match self.db.shapes.find_or_default(&key, calendar) {
            Lookup::Exact(version) => {
                trace!(shape = %key, "Segment from shape fragment");
                return Some(version.value.coords.clone());
            }
            Lookup::OtherPeriod(version) => {
                let coords = version.value.coords.clone();
                self.report(
                    Issue::warning(
                        IssueKind::Substitution,
                        format!("shape {key} is not valid on all trip days; using version from another period"),
                    ),
                    label,
                );
                return Some(coords);
            }
            Lookup::Missing => {}
        }

        let (a, b) = (from_coord?, to_coord?);
        let path = self.db.shape_graph_mut()?.find_path_between(a, b);
        if path.is_some() {
            trace!(from = %from, to = %to, "Segment from shape graph");
        }
        path
    }
}
