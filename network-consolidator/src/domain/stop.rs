//! Stop posts.

use geo_types::Coord;
use serde::Serialize;

use super::{StopKey, TariffId};

/// A physical stop post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub key: StopKey,
    pub name: String,
    /// Position, if the export has one.
    pub coord: Option<Coord<f64>>,
    pub tariff: Option<TariffId>,
    /// Fare zones the stop belongs to.
    pub zones: Vec<String>,
}

impl Stop {
    /// Versions are interchangeable when name, position, tariff and zones
    /// all match.
    pub fn is_equivalent(&self, other: &Stop) -> bool {
        self.name == other.name
            && self.coord == other.coord
            && self.tariff == other.tariff
            && self.zones == other.zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(name: &str, x: f64) -> Stop {
        Stop {
            key: StopKey::new(10, 1),
            name: name.into(),
            coord: Some(Coord { x, y: 50.0 }),
            tariff: Some(TariffId(1)),
            zones: vec!["P".into()],
        }
    }

    #[test]
    fn equivalence() {
        assert!(stop("Hlavní", 14.0).is_equivalent(&stop("Hlavní", 14.0)));
        assert!(!stop("Hlavní", 14.0).is_equivalent(&stop("Hlavní", 14.1)));
        assert!(!stop("Hlavní", 14.0).is_equivalent(&stop("Náměstí", 14.0)));

        let mut moved_zone = stop("Hlavní", 14.0);
        moved_zone.zones = vec!["0".into()];
        assert!(!stop("Hlavní", 14.0).is_equivalent(&moved_zone));
    }
}
