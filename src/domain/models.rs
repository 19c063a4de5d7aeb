use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRecord {
    pub id: i64,
    pub station_name: String,
    pub date: NaiveDateTime,
    pub energy_produced: f64,
    pub energy_consumed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEnergyRecord {
    pub station_name: String,
    pub date: NaiveDateTime,
    pub energy_produced: f64,
    pub energy_consumed: f64,
}

/// A record to persist, optionally targeting an existing id.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRecordDraft {
    pub id: Option<i64>,
    pub record: NewEnergyRecord,
}

/// Fields an update is allowed to change. Only the station name is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRecordUpdate {
    pub station_name: String,
}

impl EnergyRecord {
    pub fn with_id(id: i64, record: NewEnergyRecord) -> Self {
        Self {
            id,
            station_name: record.station_name,
            date: record.date,
            energy_produced: record.energy_produced,
            energy_consumed: record.energy_consumed,
        }
    }
}
