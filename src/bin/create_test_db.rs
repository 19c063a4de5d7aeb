use std::path::Path;

use energy_dashboard::adapters::db::{
    count_records, insert_record, open_connection, run_migrations, schema_version,
};
use energy_dashboard::domain::models::NewEnergyRecord;
use energy_dashboard::domain::record_date::parse_record_date;

const SAMPLE_RECORDS: &[(&str, &str, f64, f64)] = &[
    ("Station A", "2023-06-01", 100.0, 90.0),
    ("Station A", "2023-06-02", 110.0, 95.5),
    ("Station B", "2023-06-01", 250.0, 180.0),
    ("Station B", "2023-06-03", 240.0, 210.0),
    ("Station C", "2023-06-02", 60.0, 45.0),
];

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to create test db: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut path = "./data/energy_dashboard_test.db".to_string();
    let mut force = false;
    let mut seed = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--path requires a value".to_string());
                };
                path = value.clone();
                index += 2;
            }
            "--force" => {
                force = true;
                index += 1;
            }
            "--seed" => {
                seed = true;
                index += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    let path_ref = Path::new(&path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create parent directory: {error}"))?;
    }

    if force && path_ref.exists() {
        std::fs::remove_file(path_ref)
            .map_err(|error| format!("failed to remove existing db file: {error}"))?;
    }

    let mut connection = open_connection(&path).map_err(|error| error.to_string())?;
    run_migrations(&mut connection).map_err(|error| error.to_string())?;

    if seed {
        for (station_name, date, produced, consumed) in SAMPLE_RECORDS {
            let record = NewEnergyRecord {
                station_name: (*station_name).to_string(),
                date: parse_record_date(date).map_err(|error| error.to_string())?,
                energy_produced: *produced,
                energy_consumed: *consumed,
            };
            insert_record(&connection, &record).map_err(|error| error.to_string())?;
        }
    }

    let version = schema_version(&connection).map_err(|error| error.to_string())?;
    let records = count_records(&connection).map_err(|error| error.to_string())?;

    println!("created/updated test db at: {path}");
    println!("schema version: {version}");
    println!("energy records: {records}");
    Ok(())
}

fn print_help() {
    println!("create_test_db");
    println!();
    println!("Usage:");
    println!("  cargo run --bin create_test_db -- [--path <file>] [--force] [--seed]");
    println!();
    println!("Options:");
    println!("  --path <file>   target sqlite file (default: ./data/energy_dashboard_test.db)");
    println!("  --force         delete existing file before creating");
    println!("  --seed          insert a few sample station records");
}
