//! Consolidation pipeline.
//!
//! Source files are ingested one at a time into a [`NetworkDatabase`].
//! Within a file, entities are loaded in dependency order (see
//! [`BatchStage`]) so that every reference can be resolved against what is
//! already stored. Problems with individual records are reported to an
//! [`IssueLog`] and the record is adjusted or skipped; only a file covering
//! a different period than the database aborts ingestion.

mod config;
mod database;
mod error;
mod geometry;
mod issues;
mod reference;
mod routes;
mod runs;
mod shapes;
mod stage;
mod stops;
mod summary;
mod trips;


pub use config::{AutoRouteBand, ConsolidationConfig};
pub use database::{NetworkDatabase, NetworkStats};
pub use error::PipelineError;
pub use issues::{CollectingLog, Issue, IssueKind, IssueLog, Severity, SourceRef, TracingLog};
pub use stage::BatchStage;
pub use summary::{BatchSummary, StageCounts, StageSummary};

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::calendar::{Epoch, ServiceCalendar};
use crate::domain::{BatchId, TripKey};
use crate::source::SourceFile;

/// Ingests source files into a network database.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use network_consolidator::calendar::Epoch;
/// use network_consolidator::pipeline::{
///     CollectingLog, ConsolidationConfig, ConsolidationPipeline, NetworkDatabase,
/// };
/// use network_consolidator::source::SourceFile;
///
/// let epoch = Epoch::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 7);
/// let mut db = NetworkDatabase::new();
/// let config = ConsolidationConfig::default();
/// let mut log = CollectingLog::new();
///
/// let mut pipeline = ConsolidationPipeline::new(&mut db, &config, &mut log);
/// let summary = pipeline.ingest(&SourceFile::empty("empty.json", epoch)).unwrap();
/// assert_eq!(summary.total().read, 0);
///
/// // A file for another period is rejected
/// let other = Epoch::new(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 7);
/// assert!(pipeline.ingest(&SourceFile::empty("april.json", other)).is_err());
/// ```
pub struct ConsolidationPipeline<'a> {
    db: &'a mut NetworkDatabase,
    config: &'a ConsolidationConfig,
    log: &'a mut dyn IssueLog,
    stage: BatchStage,
    /// Name of the open file, `None` between files.
    file: Option<String>,
    /// Number of the open file, scoping its run numbers.
    batch: BatchId,
    /// Trips seen in the open file, stored or not.
    batch_trips: HashSet<TripKey>,
    summary: BatchSummary,
}

impl<'a> ConsolidationPipeline<'a> {
    pub fn new(
        db: &'a mut NetworkDatabase,
        config: &'a ConsolidationConfig,
        log: &'a mut dyn IssueLog,
    ) -> Self {
        Self {
            db,
            config,
            log,
            stage: BatchStage::Unopened,
            file: None,
            batch: BatchId(0),
            batch_trips: HashSet::new(),
            summary: BatchSummary::default(),
        }
    }

    /// Ingest a whole file, stage by stage.
    pub fn ingest(&mut self, file: &SourceFile) -> Result<BatchSummary, PipelineError> {
        self.open(&file.name, file.epoch)?;
        self.load_agencies(&file.agencies)?;
        self.load_tariffs(&file.tariffs)?;
        self.load_stops(&file.stops)?;
        self.load_routes(&file.routes)?;
        self.load_vehicle_types(&file.vehicle_types)?;
        self.load_graphs(&file.graphs)?;
        self.load_shapes(&file.shapes, &file.network_polylines)?;
        self.load_runs(&file.runs)?;
        self.load_remarks(&file.remarks)?;
        self.load_trips(&file.trips)?;
        self.close()
    }

    /// Start a new file.
    ///
    /// The first file fixes the database's epoch; later files must match it.
    pub fn open(&mut self, name: &str, epoch: Epoch) -> Result<(), PipelineError> {
        if self.file.is_some() {
            return Err(PipelineError::StageOrder {
                current: self.stage,
                requested: BatchStage::Unopened,
            });
        }

        match self.db.epoch() {
            None => self.db.set_epoch(epoch),
            Some(expected) if expected != epoch => {
                return Err(PipelineError::EpochMismatch {
                    file: name.to_string(),
                    expected,
                    found: epoch,
                });
            }
            Some(_) => {}
        }

        self.batch = self.db.begin_batch();
        self.batch_trips.clear();
        debug!(
            file = name,
            batch = %self.batch,
            start = %epoch.start,
            days = epoch.day_count,
            "Opened source file"
        );
        self.file = Some(name.to_string());
        self.stage = BatchStage::Unopened;
        self.summary = BatchSummary::new(name);
        Ok(())
    }

    /// Finish the open file and return its counters.
    pub fn close(&mut self) -> Result<BatchSummary, PipelineError> {
        self.enter(BatchStage::Closed)?;
        self.file = None;
        let summary = std::mem::take(&mut self.summary);
        debug!(file = %summary.file, records = summary.total().read, "Closed source file");
        Ok(summary)
    }

    /// Current stage of the open file.
    pub fn stage(&self) -> BatchStage {
        self.stage
    }

    /// Move to `next`, which must come after the current stage.
    fn enter(&mut self, next: BatchStage) -> Result<(), PipelineError> {
        if self.file.is_none() {
            return Err(PipelineError::NotOpened);
        }
        if !self.stage.may_advance_to(next) {
            return Err(PipelineError::StageOrder {
                current: self.stage,
                requested: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    fn finish_stage(&mut self, counts: StageCounts) -> StageCounts {
        debug!(
            stage = %self.stage,
            read = counts.read,
            stored = counts.stored,
            merged = counts.merged,
            conflicts = counts.conflicts,
            dropped = counts.dropped,
            "Stage complete"
        );
        self.summary.push(self.stage, counts);
        counts
    }

    fn source_ref(&self, record: impl Into<String>) -> SourceRef {
        SourceRef {
            file: self.file.clone().unwrap_or_default(),
            record: record.into(),
        }
    }

    fn report(&mut self, issue: Issue, record: &str) {
        let issue = issue.with_source(self.source_ref(record));
        self.log.report(issue);
    }

    /// Parse a record's calendar. Malformed calendars are reported and
    /// empty ones skipped quietly; both count as dropped.
    fn parse_calendar(
        &mut self,
        raw: &str,
        record: &str,
        counts: &mut StageCounts,
    ) -> Option<ServiceCalendar> {
        match ServiceCalendar::from_bitmap_str(raw) {
            Ok(calendar) if calendar.is_empty() => {
                trace!(record, "Skipping record with empty calendar");
                counts.dropped += 1;
                None
            }
            Ok(calendar) => Some(calendar),
            Err(e) => {
                self.report(
                    Issue::error(IssueKind::MalformedInput, format!("bad calendar: {e}")),
                    record,
                );
                counts.dropped += 1;
                None
            }
        }
    }
}
