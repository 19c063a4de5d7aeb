use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::filter::EnergyFilter;
use crate::domain::models::{
    EnergyRecord, EnergyRecordDraft, EnergyRecordUpdate, NewEnergyRecord,
};
use crate::domain::record_date::start_of_day;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("energy data {id} not found")]
    NotFound { id: i64 },
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error(transparent)]
    Database(#[from] DbError),
}

pub trait EnergyQueryHandler {
    fn list(&self) -> Result<Vec<EnergyRecord>, ServiceError>;
    fn get(&self, id: i64) -> Result<EnergyRecord, ServiceError>;
    fn get_data_between_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EnergyRecord>, ServiceError>;
    fn filter(&self, filter: &EnergyFilter) -> Result<Vec<EnergyRecord>, ServiceError>;
}

pub trait EnergyCommandHandler {
    fn save(&self, draft: &EnergyRecordDraft) -> Result<EnergyRecord, ServiceError>;
    fn update(&self, id: i64, update: &EnergyRecordUpdate) -> Result<EnergyRecord, ServiceError>;
    fn delete(&self, id: i64) -> Result<(), ServiceError>;
    /// Saves drafts one by one. Records saved before a failure stay committed.
    fn import(&self, drafts: &[EnergyRecordDraft]) -> Result<usize, ServiceError>;
}

#[derive(Clone)]
pub struct SqliteEnergyService {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteEnergyService {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, ServiceError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| ServiceError::DbLockPoisoned)?;
        op(&connection).map_err(ServiceError::from)
    }
}

impl EnergyQueryHandler for SqliteEnergyService {
    fn list(&self) -> Result<Vec<EnergyRecord>, ServiceError> {
        self.with_connection(db::list_records)
    }

    fn get(&self, id: i64) -> Result<EnergyRecord, ServiceError> {
        self.with_connection(|connection| db::find_record(connection, id))?
            .ok_or(ServiceError::NotFound { id })
    }

    fn get_data_between_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EnergyRecord>, ServiceError> {
        let from = start_of_day(start);
        let to = start_of_day(end);

        let records =
            self.with_connection(|connection| db::find_records_between(connection, from, to))?;

        tracing::debug!(%start, %end, count = records.len(), "fetched records between dates");

        Ok(records)
    }

    fn filter(&self, filter: &EnergyFilter) -> Result<Vec<EnergyRecord>, ServiceError> {
        let records = self.with_connection(db::list_records)?;
        Ok(filter.apply(records))
    }
}

impl EnergyCommandHandler for SqliteEnergyService {
    fn save(&self, draft: &EnergyRecordDraft) -> Result<EnergyRecord, ServiceError> {
        let saved = self.with_connection(|connection| db::save_record(connection, draft))?;

        tracing::info!(
            id = saved.id,
            station_name = %saved.station_name,
            "energy record saved"
        );

        Ok(saved)
    }

    fn update(&self, id: i64, update: &EnergyRecordUpdate) -> Result<EnergyRecord, ServiceError> {
        let updated = self.with_connection(|connection| {
            let Some(existing) = db::find_record(connection, id)? else {
                return Ok(None);
            };

            let draft = EnergyRecordDraft {
                id: Some(existing.id),
                record: NewEnergyRecord {
                    station_name: update.station_name.clone(),
                    date: existing.date,
                    energy_produced: existing.energy_produced,
                    energy_consumed: existing.energy_consumed,
                },
            };
            db::save_record(connection, &draft).map(Some)
        })?;

        let updated = updated.ok_or(ServiceError::NotFound { id })?;

        tracing::info!(id, station_name = %updated.station_name, "energy record updated");

        Ok(updated)
    }

    fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let removed = self.with_connection(|connection| db::delete_record(connection, id))?;

        if removed {
            tracing::info!(id, "energy record deleted");
        } else {
            tracing::debug!(id, "delete requested for unknown energy record");
        }

        Ok(())
    }

    fn import(&self, drafts: &[EnergyRecordDraft]) -> Result<usize, ServiceError> {
        for (index, draft) in drafts.iter().enumerate() {
            if let Err(error) = self.with_connection(|connection| db::save_record(connection, draft))
            {
                tracing::warn!(
                    error = %error,
                    saved = index,
                    total = drafts.len(),
                    "energy import stopped on failed record"
                );
                return Err(error);
            }
        }

        tracing::info!(count = drafts.len(), "energy records imported");

        Ok(drafts.len())
    }
}
