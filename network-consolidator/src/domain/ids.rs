//! Numeric identifiers used by the exports.
//!
//! Every entity family numbers its records independently, so each gets its
//! own newtype to keep a `LineNumber` from being passed where a `RunId` is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// A stop area (node) number.
    NodeId
);
numeric_id!(
    /// A stop post number within its node.
    StopId
);
numeric_id!(
    /// Public line number of a route.
    LineNumber
);
numeric_id!(
    /// Company number identifying an agency.
    CompanyId
);
numeric_id!(
    /// Trip number within its line.
    TripNumber
);
numeric_id!(
    /// Vehicle run (block) number.
    RunId
);
numeric_id!(
    /// Timetable graph number.
    GraphId
);
numeric_id!(
    /// Position of a source file in ingestion order, starting at 0.
    BatchId
);
numeric_id!(RemarkId);
numeric_id!(TariffId);
numeric_id!(VehicleTypeId);

/// A stop post, identified by its node and its number within the node.
///
/// # Examples
///
/// ```
/// use network_consolidator::domain::{NodeId, StopId, StopKey};
///
/// let key = StopKey(NodeId(1204), StopId(2));
/// assert_eq!(key.to_string(), "1204/2");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopKey(pub NodeId, pub StopId);

impl StopKey {
    pub fn new(node: u32, stop: u32) -> Self {
        Self(NodeId(node), StopId(stop))
    }
}

impl fmt::Debug for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopKey({self})")
    }
}

impl fmt::Display for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// A trip, identified by its line and its number within the line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripKey(pub LineNumber, pub TripNumber);

impl TripKey {
    pub fn new(line: u32, trip: u32) -> Self {
        Self(LineNumber(line), TripNumber(trip))
    }

    pub fn line(&self) -> LineNumber {
        self.0
    }

    pub fn number(&self) -> TripNumber {
        self.1
    }
}

impl fmt::Debug for TripKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripKey({self})")
    }
}

impl fmt::Display for TripKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0, self.1)
    }
}

/// A vehicle run as numbered by one source file.
///
/// Run numbers are only meaningful within the file that defines them, so
/// the same number from two files names two different runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunKey {
    pub batch: BatchId,
    pub run: RunId,
}

impl RunKey {
    pub fn new(batch: BatchId, run: RunId) -> Self {
        Self { batch, run }
    }
}

impl fmt::Debug for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunKey({self})")
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.run, self.batch)
    }
}

/// A route geometry fragment between two stops of one company.
///
/// `variant` distinguishes alternative paths between the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeKey {
    pub company: CompanyId,
    pub from: StopKey,
    pub to: StopKey,
    pub variant: u32,
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}~{}",
            self.company, self.from, self.to, self.variant
        )
    }
}
