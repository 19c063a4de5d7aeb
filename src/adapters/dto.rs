use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::filter::EnergyFilter;
use crate::domain::models::{EnergyRecord, EnergyRecordDraft, EnergyRecordUpdate, NewEnergyRecord};
use crate::domain::record_date::{
    DateParseError, format_record_date, from_epoch_millis, parse_record_date,
};

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidDate(#[from] DateParseError),
    #[error("id must not be negative, got {0}")]
    NegativeId(i64),
    #[error("{field} must be a finite number, got `{value}`")]
    InvalidNumber { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: PayloadError,
    },
}

/// Dates arrive either as ISO text or as epoch milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DateInput {
    EpochMillis(i64),
    Text(String),
}

/// Wire shape of a record. Every field may be absent; validation happens in
/// [`EnergyRecordPayload::into_draft`] and [`EnergyRecordPayload::into_update`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRecordPayload {
    pub id: Option<i64>,
    pub station_name: Option<String>,
    pub date: Option<DateInput>,
    pub energy_produced: Option<f64>,
    pub energy_consumed: Option<f64>,
}

impl EnergyRecordPayload {
    pub fn into_draft(self) -> Result<EnergyRecordDraft, PayloadError> {
        if let Some(id) = self.id
            && id < 0
        {
            return Err(PayloadError::NegativeId(id));
        }

        let station_name = self
            .station_name
            .ok_or(PayloadError::MissingField("stationName"))?;
        let date = match self.date.ok_or(PayloadError::MissingField("date"))? {
            DateInput::EpochMillis(millis) => from_epoch_millis(millis)?,
            DateInput::Text(raw) => parse_record_date(&raw)?,
        };
        let energy_produced = self
            .energy_produced
            .ok_or(PayloadError::MissingField("energyProduced"))?;
        let energy_consumed = self
            .energy_consumed
            .ok_or(PayloadError::MissingField("energyConsumed"))?;

        Ok(EnergyRecordDraft {
            id: self.id,
            record: NewEnergyRecord {
                station_name,
                date,
                energy_produced,
                energy_consumed,
            },
        })
    }

    /// Only the station name is taken from an update body.
    pub fn into_update(self) -> Result<EnergyRecordUpdate, PayloadError> {
        let station_name = self
            .station_name
            .ok_or(PayloadError::MissingField("stationName"))?;

        Ok(EnergyRecordUpdate { station_name })
    }
}

/// Parses an uploaded file: a JSON array of records, all validated up front.
pub fn parse_import_file(bytes: &[u8]) -> Result<Vec<EnergyRecordDraft>, ImportError> {
    let payloads: Vec<EnergyRecordPayload> = serde_json::from_slice(bytes)?;

    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            payload
                .into_draft()
                .map_err(|source| ImportError::Record { index, source })
        })
        .collect()
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRecordResponse {
    pub id: i64,
    pub station_name: String,
    pub date: String,
    pub energy_produced: f64,
    pub energy_consumed: f64,
}

impl From<EnergyRecord> for EnergyRecordResponse {
    fn from(record: EnergyRecord) -> Self {
        Self {
            id: record.id,
            station_name: record.station_name,
            date: format_record_date(&record.date),
            energy_produced: record.energy_produced,
            energy_consumed: record.energy_consumed,
        }
    }
}

pub fn to_responses(records: Vec<EnergyRecord>) -> Vec<EnergyRecordResponse> {
    records.into_iter().map(EnergyRecordResponse::from).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub min_energy_consumed: Option<String>,
    pub max_energy_consumed: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub station_name: Option<String>,
}

impl FilterQuery {
    pub fn into_filter(self) -> Result<EnergyFilter, PayloadError> {
        Ok(EnergyFilter {
            min_energy_consumed: parse_optional_threshold(
                "minEnergyConsumed",
                self.min_energy_consumed.as_deref(),
            )?,
            max_energy_consumed: parse_optional_threshold(
                "maxEnergyConsumed",
                self.max_energy_consumed.as_deref(),
            )?,
            start_date: parse_optional_date(self.start_date.as_deref())?,
            end_date: parse_optional_date(self.end_date.as_deref())?,
            station_name: self.station_name,
        })
    }
}

/// Blank query values count as absent.
fn parse_optional_threshold(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<f64>, PayloadError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    value
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .map(Some)
        .ok_or_else(|| PayloadError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn parse_optional_date(
    raw: Option<&str>,
) -> Result<Option<chrono::NaiveDateTime>, DateParseError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => parse_record_date(value).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::models::EnergyRecord;
    use crate::domain::record_date::parse_record_date;

    use super::{
        DateInput, EnergyRecordPayload, EnergyRecordResponse, FilterQuery, ImportError,
        PayloadError, parse_import_file,
    };

    fn payload(value: serde_json::Value) -> EnergyRecordPayload {
        serde_json::from_value(value).expect("payload should deserialize")
    }

    #[test]
    fn create_payload_without_id_becomes_insert_draft() {
        let draft = payload(json!({
            "stationName": "Station A",
            "date": "2023-06-01",
            "energyProduced": 100.0,
            "energyConsumed": 90.0
        }))
        .into_draft()
        .expect("payload should validate");

        assert_eq!(draft.id, None);
        assert_eq!(draft.record.station_name, "Station A");
        assert_eq!(
            draft.record.date,
            parse_record_date("2023-06-01T00:00:00").expect("date should parse")
        );
        assert_eq!(draft.record.energy_consumed, 90.0);
    }

    #[test]
    fn null_id_is_treated_as_absent() {
        let parsed = payload(json!({
            "id": null,
            "stationName": "Station A",
            "date": "2023-06-01",
            "energyProduced": 1.0,
            "energyConsumed": 2.0
        }));
        assert_eq!(parsed.id, None);
    }

    #[test]
    fn epoch_millis_dates_are_accepted() {
        let parsed = payload(json!({
            "stationName": "Station A",
            "date": 1_685_577_600_000_i64,
            "energyProduced": 1.0,
            "energyConsumed": 2.0
        }));
        assert_eq!(parsed.date, Some(DateInput::EpochMillis(1_685_577_600_000)));

        let draft = parsed.into_draft().expect("payload should validate");
        assert_eq!(
            draft.record.date,
            parse_record_date("2023-06-01").expect("date should parse")
        );
    }

    #[test]
    fn missing_fields_are_reported_by_wire_name() {
        let result = payload(json!({
            "stationName": "Station A",
            "date": "2023-06-01",
            "energyProduced": 1.0
        }))
        .into_draft();

        assert_eq!(result, Err(PayloadError::MissingField("energyConsumed")));
    }

    #[test]
    fn invalid_dates_are_rejected() {
        let result = payload(json!({
            "stationName": "Station A",
            "date": "first of june",
            "energyProduced": 1.0,
            "energyConsumed": 2.0
        }))
        .into_draft();

        assert!(matches!(result, Err(PayloadError::InvalidDate(_))));
    }

    #[test]
    fn update_only_needs_station_name() {
        let update = payload(json!({ "stationName": "Station Z", "energyConsumed": 1.0 }))
            .into_update()
            .expect("update should validate");
        assert_eq!(update.station_name, "Station Z");

        assert_eq!(
            payload(json!({ "energyConsumed": 1.0 })).into_update(),
            Err(PayloadError::MissingField("stationName"))
        );
    }

    #[test]
    fn response_uses_camel_case_and_iso_dates() {
        let response = EnergyRecordResponse::from(EnergyRecord {
            id: 3,
            station_name: "Station A".to_string(),
            date: parse_record_date("2023-06-01").expect("date should parse"),
            energy_produced: 100.0,
            energy_consumed: 90.0,
        });

        let value = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(
            value,
            json!({
                "id": 3,
                "stationName": "Station A",
                "date": "2023-06-01T00:00:00",
                "energyProduced": 100.0,
                "energyConsumed": 90.0
            })
        );
    }

    #[test]
    fn import_file_must_be_an_array() {
        let result = parse_import_file(br#"{"stationName":"Station A"}"#);
        assert!(matches!(result, Err(ImportError::Json(_))));
    }

    #[test]
    fn import_file_reports_offending_record_index() {
        let body = br#"[
            {"stationName":"Station A","date":"2023-06-01","energyProduced":1.0,"energyConsumed":2.0},
            {"stationName":"Station B","energyProduced":1.0,"energyConsumed":2.0}
        ]"#;

        let error = parse_import_file(body).expect_err("second record should fail");
        assert_eq!(error.to_string(), "record 1: missing required field: date");
    }

    #[test]
    fn filter_query_ignores_blank_dates_and_parses_the_rest() {
        let filter = FilterQuery {
            min_energy_consumed: Some("50".to_string()),
            start_date: Some(" ".to_string()),
            end_date: Some("2023-06-30".to_string()),
            ..FilterQuery::default()
        }
        .into_filter()
        .expect("filter should build");

        assert_eq!(filter.min_energy_consumed, Some(50.0));
        assert_eq!(filter.start_date, None);
        assert_eq!(
            filter.end_date,
            Some(parse_record_date("2023-06-30").expect("date should parse"))
        );
    }

    #[test]
    fn filter_query_treats_blank_thresholds_as_absent() {
        let filter = FilterQuery {
            min_energy_consumed: Some(String::new()),
            max_energy_consumed: Some("  ".to_string()),
            ..FilterQuery::default()
        }
        .into_filter()
        .expect("filter should build");

        assert_eq!(filter.min_energy_consumed, None);
        assert_eq!(filter.max_energy_consumed, None);
    }

    #[test]
    fn filter_query_rejects_non_finite_thresholds() {
        for raw in ["NaN", "inf", "-infinity", "lots"] {
            let result = FilterQuery {
                max_energy_consumed: Some(raw.to_string()),
                ..FilterQuery::default()
            }
            .into_filter();

            assert_eq!(
                result,
                Err(PayloadError::InvalidNumber {
                    field: "maxEnergyConsumed",
                    value: raw.to_string(),
                })
            );
        }
    }
}
