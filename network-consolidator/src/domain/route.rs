//! Routes (public lines).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CompanyId, LineNumber};

/// Mode of a route, as printed in timetables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    Tram,
    Metro,
    Trolleybus,
    #[default]
    UrbanBus,
    RegionalBus,
    Rail,
    Ferry,
    Funicular,
    /// Rail replacement and other substitute services.
    Substitute,
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteCategory::Tram => "tram",
            RouteCategory::Metro => "metro",
            RouteCategory::Trolleybus => "trolleybus",
            RouteCategory::UrbanBus => "urban bus",
            RouteCategory::RegionalBus => "regional bus",
            RouteCategory::Rail => "rail",
            RouteCategory::Ferry => "ferry",
            RouteCategory::Funicular => "funicular",
            RouteCategory::Substitute => "substitute",
        };
        f.write_str(name)
    }
}

/// A public line operated by one agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub line: LineNumber,
    pub name: String,
    pub agency: CompanyId,
    pub category: RouteCategory,
    /// True when the route was made up to hold trips whose line was missing
    /// from the export.
    pub autogenerated: bool,
}

impl Route {
    /// A placeholder route for a line that trips reference but the export
    /// does not define.
    pub fn autogenerated(line: LineNumber, agency: CompanyId, category: RouteCategory) -> Self {
        Self {
            line,
            name: line.to_string(),
            agency,
            category,
            autogenerated: true,
        }
    }

    /// Versions of a route are interchangeable when everything but their
    /// validity matches.
    pub fn is_equivalent(&self, other: &Route) -> bool {
        self.name == other.name && self.agency == other.agency && self.category == other.category
    }
}
