//! Keyed reference entities: agencies, tariffs, vehicle types, graphs and
//! remarks.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::hash::Hash;

use crate::domain::{
    Agency, CompanyId, GraphId, Remark, RemarkId, TariffId, TariffSystem, TimetableGraph,
    VehicleType, VehicleTypeId,
};
use crate::source::{AgencyRecord, GraphRecord, RemarkRecord, TariffRecord, VehicleTypeRecord};

use super::{BatchStage, ConsolidationPipeline, Issue, IssueKind, PipelineError, StageCounts};

/// Outcome of a keyed insert.
enum Keyed {
    Inserted,
    /// Same key, same payload.
    Duplicate,
    /// Same key, different payload; the stored one was kept.
    Differs,
}

fn insert_keyed<K: Eq + Hash, V: PartialEq>(map: &mut HashMap<K, V>, key: K, value: V) -> Keyed {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            Keyed::Inserted
        }
        Entry::Occupied(existing) if *existing.get() == value => Keyed::Duplicate,
        Entry::Occupied(_) => Keyed::Differs,
    }
}

impl ConsolidationPipeline<'_> {
    /// Count a keyed insert, reporting a differing duplicate.
    fn record_keyed(
        &mut self,
        outcome: Keyed,
        entity: &str,
        key: impl Display,
        counts: &mut StageCounts,
    ) {
        match outcome {
            Keyed::Inserted => counts.stored += 1,
            Keyed::Duplicate => counts.merged += 1,
            Keyed::Differs => {
                counts.conflicts += 1;
                self.report(
                    Issue::warning(
                        IssueKind::Conflict,
                        format!("{entity} {key} redefined differently; keeping the first"),
                    ),
                    &format!("{entity} {key}"),
                );
            }
        }
    }

    pub fn load_agencies(&mut self, records: &[AgencyRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::AgenciesLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let id = CompanyId(record.company_id);
            let agency = Agency {
                id,
                name: record.name.clone(),
                url: record.url.clone(),
                phone: record.phone.clone(),
            };
            let outcome = insert_keyed(&mut self.db.agencies, id, agency);
            self.record_keyed(outcome, "agency", id, &mut counts);
        }

        Ok(self.finish_stage(counts))
    }

    pub fn load_tariffs(&mut self, records: &[TariffRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::TariffsLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let id = TariffId(record.tariff_id);
            let tariff = TariffSystem {
                id,
                name: record.name.clone(),
            };
            let outcome = insert_keyed(&mut self.db.tariffs, id, tariff);
            self.record_keyed(outcome, "tariff system", id, &mut counts);
        }

        Ok(self.finish_stage(counts))
    }

    pub fn load_vehicle_types(
        &mut self,
        records: &[VehicleTypeRecord],
    ) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::VehicleTypesLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let id = VehicleTypeId(record.vehicle_type_id);
            let vehicle_type = VehicleType {
                id,
                name: record.name.clone(),
                low_floor: record.low_floor,
            };
            let outcome = insert_keyed(&mut self.db.vehicle_types, id, vehicle_type);
            self.record_keyed(outcome, "vehicle type", id, &mut counts);
        }

        Ok(self.finish_stage(counts))
    }

    /// Load timetable graphs.
    ///
    /// A graph seen again under the same name extends its validity; under a
    /// different name it is a conflict.
    pub fn load_graphs(&mut self, records: &[GraphRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::GraphsLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let id = GraphId(record.graph_id);
            let label = format!("graph {id}");
            let Some(validity) = self.parse_calendar(&record.calendar, &label, &mut counts) else {
                continue;
            };

            let outcome = match self.db.graphs.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(TimetableGraph {
                        id,
                        name: record.name.clone(),
                        validity,
                    });
                    Keyed::Inserted
                }
                Entry::Occupied(mut existing) if existing.get().name == record.name => {
                    existing.get_mut().validity.union_with(&validity);
                    Keyed::Duplicate
                }
                Entry::Occupied(_) => Keyed::Differs,
            };
            self.record_keyed(outcome, "graph", id, &mut counts);
        }

        Ok(self.finish_stage(counts))
    }

    pub fn load_remarks(&mut self, records: &[RemarkRecord]) -> Result<StageCounts, PipelineError> {
        self.enter(BatchStage::RemarksLoaded)?;
        let mut counts = StageCounts::with_read(records.len());

        for record in records {
            let id = RemarkId(record.remark_id);
            let remark = Remark {
                id,
                symbol: record.symbol.clone(),
                text: record.text.clone(),
            };
            let outcome = insert_keyed(&mut self.db.remarks, id, remark);
            self.record_keyed(outcome, "remark", id, &mut counts);
        }

        Ok(self.finish_stage(counts))
    }
}
