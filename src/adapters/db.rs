use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::domain::models::{EnergyRecord, EnergyRecordDraft, NewEnergyRecord};

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS energy_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    station_name TEXT NOT NULL,
    date TEXT NOT NULL,
    energy_produced REAL NOT NULL,
    energy_consumed REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_energy_data_date
ON energy_data (date);
"#,
)];

const SELECT_COLUMNS: &str =
    "SELECT id, station_name, date, energy_produced, energy_consumed FROM energy_data";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::from)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<EnergyRecord> {
    Ok(EnergyRecord {
        id: row.get(0)?,
        station_name: row.get(1)?,
        date: row.get(2)?,
        energy_produced: row.get(3)?,
        energy_consumed: row.get(4)?,
    })
}

pub fn insert_record(connection: &Connection, record: &NewEnergyRecord) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO energy_data (station_name, date, energy_produced, energy_consumed) VALUES (?1, ?2, ?3, ?4)",
        params![
            record.station_name,
            record.date,
            record.energy_produced,
            record.energy_consumed,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

/// Overwrites the row identified by `id`. Returns `false` when no such row exists.
pub fn update_record(
    connection: &Connection,
    id: i64,
    record: &NewEnergyRecord,
) -> Result<bool, DbError> {
    let changed = connection.execute(
        "UPDATE energy_data
         SET station_name = ?1, date = ?2, energy_produced = ?3, energy_consumed = ?4
         WHERE id = ?5",
        params![
            record.station_name,
            record.date,
            record.energy_produced,
            record.energy_consumed,
            id,
        ],
    )?;

    Ok(changed > 0)
}

/// Updates the row when the draft names an existing id, otherwise inserts a
/// new row with a freshly assigned id.
pub fn save_record(
    connection: &Connection,
    draft: &EnergyRecordDraft,
) -> Result<EnergyRecord, DbError> {
    if let Some(id) = draft.id
        && update_record(connection, id, &draft.record)?
    {
        return Ok(EnergyRecord::with_id(id, draft.record.clone()));
    }

    let id = insert_record(connection, &draft.record)?;
    Ok(EnergyRecord::with_id(id, draft.record.clone()))
}

pub fn list_records(connection: &Connection) -> Result<Vec<EnergyRecord>, DbError> {
    let mut statement = connection.prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;

    let rows = statement.query_map([], map_record)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }

    Ok(records)
}

pub fn find_record(connection: &Connection, id: i64) -> Result<Option<EnergyRecord>, DbError> {
    let record = connection
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id],
            map_record,
        )
        .optional()?;

    Ok(record)
}

/// Returns whether a row was removed.
pub fn delete_record(connection: &Connection, id: i64) -> Result<bool, DbError> {
    let removed = connection.execute("DELETE FROM energy_data WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

pub fn find_records_between(
    connection: &Connection,
    from_inclusive: NaiveDateTime,
    to_inclusive: NaiveDateTime,
) -> Result<Vec<EnergyRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "{SELECT_COLUMNS} WHERE date BETWEEN ?1 AND ?2 ORDER BY id ASC"
    ))?;

    let rows = statement.query_map(params![from_inclusive, to_inclusive], map_record)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }

    Ok(records)
}

pub fn count_records(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM energy_data", [], |row| row.get(0))?;
    Ok(count)
}
