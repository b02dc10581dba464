//! Fatal pipeline errors.

use crate::calendar::Epoch;

use super::stage::BatchStage;

/// Errors that abort ingestion.
///
/// Everything recoverable is reported through the issue log instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// A file was exported for a different period than the database holds
    #[error(
        "file {file} covers {} days from {}, but the network covers {} days from {}",
        .found.day_count, .found.start, .expected.day_count, .expected.start
    )]
    EpochMismatch {
        file: String,
        expected: Epoch,
        found: Epoch,
    },

    /// A stage was requested out of order
    #[error("cannot load {requested} after {current}")]
    StageOrder {
        current: BatchStage,
        requested: BatchStage,
    },

    /// A stage was requested before a file was opened
    #[error("no source file is open")]
    NotOpened,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn error_display() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let err = PipelineError::EpochMismatch {
            file: "south.json".into(),
            expected: Epoch::new(day(1), 30),
            found: Epoch::new(day(2), 30),
        };
        assert_eq!(
            err.to_string(),
            "file south.json covers 30 days from 2024-03-02, but the network covers 30 days from 2024-03-01"
        );

        let err = PipelineError::StageOrder {
            current: BatchStage::TripsLoaded,
            requested: BatchStage::StopsLoaded,
        };
        assert_eq!(err.to_string(), "cannot load stops after trips");

        assert_eq!(PipelineError::NotOpened.to_string(), "no source file is open");
    }
}
