use chrono::NaiveDateTime;

use crate::domain::models::EnergyRecord;

/// Optional predicates applied to the full table. Consumption bounds are
/// inclusive, date bounds are exclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyFilter {
    pub min_energy_consumed: Option<f64>,
    pub max_energy_consumed: Option<f64>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub station_name: Option<String>,
}

impl EnergyFilter {
    pub fn matches(&self, record: &EnergyRecord) -> bool {
        if let Some(min) = self.min_energy_consumed
            && record.energy_consumed < min
        {
            return false;
        }

        if let Some(max) = self.max_energy_consumed
            && record.energy_consumed > max
        {
            return false;
        }

        if let Some(start) = self.start_date
            && record.date <= start
        {
            return false;
        }

        if let Some(end) = self.end_date
            && record.date >= end
        {
            return false;
        }

        match self.station_name.as_deref() {
            Some(name) if !name.is_empty() => {
                record.station_name.to_lowercase() == name.to_lowercase()
            }
            _ => true,
        }
    }

    pub fn apply(&self, records: Vec<EnergyRecord>) -> Vec<EnergyRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::models::EnergyRecord;
    use crate::domain::record_date::parse_record_date;

    use super::EnergyFilter;

    fn record(id: i64, station_name: &str, date: &str, energy_consumed: f64) -> EnergyRecord {
        EnergyRecord {
            id,
            station_name: station_name.to_string(),
            date: parse_record_date(date).expect("fixture date should parse"),
            energy_produced: 100.0,
            energy_consumed,
        }
    }

    fn sample_records() -> Vec<EnergyRecord> {
        vec![
            record(1, "Station A", "2023-06-01", 40.0),
            record(2, "Station A", "2023-06-02", 50.0),
            record(3, "Station B", "2023-06-03", 90.0),
            record(4, "station b", "2023-06-04", 150.0),
            record(5, "Station C", "2023-06-05", 151.0),
        ]
    }

    fn ids(records: &[EnergyRecord]) -> Vec<i64> {
        records.iter().map(|record| record.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filtered = EnergyFilter::default().apply(sample_records());
        assert_eq!(ids(&filtered), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn consumption_bounds_are_inclusive() {
        let filter = EnergyFilter {
            min_energy_consumed: Some(50.0),
            max_energy_consumed: Some(150.0),
            ..EnergyFilter::default()
        };

        assert_eq!(ids(&filter.apply(sample_records())), vec![2, 3, 4]);
    }

    #[test]
    fn date_bounds_are_exclusive() {
        let filter = EnergyFilter {
            start_date: Some(parse_record_date("2023-06-02").expect("date should parse")),
            end_date: Some(parse_record_date("2023-06-04").expect("date should parse")),
            ..EnergyFilter::default()
        };

        assert_eq!(ids(&filter.apply(sample_records())), vec![3]);
    }

    #[test]
    fn station_name_matches_ignoring_case() {
        let filter = EnergyFilter {
            station_name: Some("STATION B".to_string()),
            ..EnergyFilter::default()
        };

        assert_eq!(ids(&filter.apply(sample_records())), vec![3, 4]);
    }

    #[test]
    fn empty_station_name_is_ignored() {
        let filter = EnergyFilter {
            station_name: Some(String::new()),
            ..EnergyFilter::default()
        };

        assert_eq!(filter.apply(sample_records()).len(), 5);
    }

    #[test]
    fn predicates_combine_as_conjunction() {
        let filter = EnergyFilter {
            min_energy_consumed: Some(45.0),
            station_name: Some("station a".to_string()),
            ..EnergyFilter::default()
        };

        assert_eq!(ids(&filter.apply(sample_records())), vec![2]);
    }

    #[test]
    fn threshold_example_includes_and_excludes() {
        let records = vec![record(7, "Station A", "2023-06-01", 90.0)];

        let loose = EnergyFilter {
            min_energy_consumed: Some(80.0),
            ..EnergyFilter::default()
        };
        let strict = EnergyFilter {
            min_energy_consumed: Some(95.0),
            ..EnergyFilter::default()
        };

        assert_eq!(loose.apply(records.clone()).len(), 1);
        assert!(strict.apply(records).is_empty());
    }
}
