//! Consolidation configuration.

use chrono::Duration;
use serde::Deserialize;

use crate::domain::{CompanyId, LineNumber, RouteCategory};
use crate::shape_graph::DEFAULT_ON_EDGE_TOLERANCE_M;

/// A range of line numbers whose missing routes may be made up.
///
/// Trips on lines in a band are kept even when their route is absent from
/// the export; a placeholder route with the band's category and agency is
/// created instead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoRouteBand {
    /// First line number in the band (inclusive).
    pub first: u32,

    /// Last line number in the band (inclusive).
    pub last: u32,

    pub category: RouteCategory,

    /// Agency assigned to the placeholder route.
    #[serde(default)]
    pub agency: u32,
}

impl AutoRouteBand {
    pub fn new(first: u32, last: u32, category: RouteCategory) -> Self {
        Self {
            first,
            last,
            category,
            agency: 0,
        }
    }

    pub fn contains(&self, line: LineNumber) -> bool {
        (self.first..=self.last).contains(&line.0)
    }

    pub fn agency(&self) -> CompanyId {
        CompanyId(self.agency)
    }
}

/// Configuration parameters for a consolidation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// A clock value more than this many hours before the previous one in
    /// the same trip is taken to be after midnight.
    pub rollover_threshold_hours: u32,

    /// Line-number bands for which missing routes are autogenerated.
    pub auto_route_bands: Vec<AutoRouteBand>,

    /// How close (meters) a stop must be to a geometry edge to be placed
    /// on it.
    pub on_edge_tolerance_m: f64,

    /// Whether to reconstruct trip geometry when a shape graph is attached.
    pub build_geometry: bool,
}

impl ConsolidationConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        rollover_threshold_hours: u32,
        auto_route_bands: Vec<AutoRouteBand>,
        on_edge_tolerance_m: f64,
        build_geometry: bool,
    ) -> Self {
        Self {
            rollover_threshold_hours,
            auto_route_bands,
            on_edge_tolerance_m,
            build_geometry,
        }
    }

    /// Returns the rollover threshold as a Duration.
    pub fn rollover_threshold(&self) -> Duration {
        Duration::hours(i64::from(self.rollover_threshold_hours))
    }

    /// The band a line number falls in, if any. The first matching band wins.
    pub fn auto_route_band(&self, line: LineNumber) -> Option<&AutoRouteBand> {
        self.auto_route_bands.iter().find(|band| band.contains(line))
    }
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            rollover_threshold_hours: 6,
            auto_route_bands: Vec::new(),
            on_edge_tolerance_m: DEFAULT_ON_EDGE_TOLERANCE_M,
            build_geometry: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ConsolidationConfig::default();

        assert_eq!(config.rollover_threshold_hours, 6);
        assert!(config.auto_route_bands.is_empty());
        assert_eq!(config.on_edge_tolerance_m, 1.0);
        assert!(config.build_geometry);
    }

    #[test]
    fn duration_methods() {
        let config = ConsolidationConfig::default();
        assert_eq!(config.rollover_threshold(), Duration::hours(6));
    }

    #[test]
    fn custom_config() {
        let bands = vec![AutoRouteBand::new(900, 999, RouteCategory::Substitute)];
        let config = ConsolidationConfig::new(4, bands.clone(), 2.5, false);

        assert_eq!(config.rollover_threshold_hours, 4);
        assert_eq!(config.auto_route_bands, bands);
        assert_eq!(config.on_edge_tolerance_m, 2.5);
        assert!(!config.build_geometry);
    }

    #[test]
    fn band_lookup() {
        let config = ConsolidationConfig::new(
            6,
            vec![
                AutoRouteBand::new(900, 999, RouteCategory::Substitute),
                AutoRouteBand::new(950, 960, RouteCategory::Ferry),
            ],
            1.0,
            true,
        );

        assert_eq!(config.auto_route_band(LineNumber(899)), None);
        assert_eq!(
            config.auto_route_band(LineNumber(900)).map(|b| b.category),
            Some(RouteCategory::Substitute)
        );
        // First band wins on overlap
        assert_eq!(
            config.auto_route_band(LineNumber(955)).map(|b| b.category),
            Some(RouteCategory::Substitute)
        );
        assert!(config.auto_route_band(LineNumber(999)).is_some());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ConsolidationConfig = serde_json::from_str(
            r#"{ "auto_route_bands": [ { "first": 1, "last": 5, "category": "tram" } ] }"#,
        )
        .unwrap();

        assert_eq!(config.rollover_threshold_hours, 6);
        assert_eq!(config.auto_route_bands[0].agency(), CompanyId(0));
        assert!(config.build_geometry);
    }
}
