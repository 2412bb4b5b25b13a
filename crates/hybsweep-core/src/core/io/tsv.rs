use crate::core::models::melt::MeltTable;
use crate::core::thermo::ThermoParams;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Placeholder written for a fraction an evaluator did not compute.
pub const MISSING_VALUE: &str = "NA";

#[derive(Debug, Error)]
pub enum TsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Name '{0}' appears more than once in the table")]
    DuplicateName(String),
}

pub fn tab_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<File>, TsvError> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)?)
}

pub fn tab_writer<P: AsRef<Path>>(path: P) -> Result<csv::Writer<File>, TsvError> {
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

#[derive(Debug, Deserialize)]
struct ThermoRow {
    name: String,
    #[serde(rename = "dH")]
    enthalpy: f64,
    #[serde(rename = "dS")]
    entropy: f64,
}

/// Reads a `name  dH  dS` table into a map keyed by name.
pub fn read_thermo_table<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, ThermoParams>, TsvError> {
    let mut reader = tab_reader(path)?;
    let mut table = HashMap::new();
    for row in reader.deserialize() {
        let row: ThermoRow = row?;
        let params = ThermoParams {
            enthalpy: row.enthalpy,
            entropy: row.entropy,
        };
        if table.insert(row.name.clone(), params).is_some() {
            return Err(TsvError::DuplicateName(row.name));
        }
    }
    Ok(table)
}

#[derive(Debug, Deserialize)]
struct MeltRow {
    name: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    hybridization: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    fold: Option<f64>,
}

/// Reads a `name  hybridization  fold` table. `NA` (or any non-numeric value) marks
/// a fraction that was not computed for that name.
pub fn read_melt_table<P: AsRef<Path>>(path: P) -> Result<MeltTable, TsvError> {
    let mut reader = tab_reader(path)?;
    let mut table = MeltTable::new();
    for row in reader.deserialize() {
        let row: MeltRow = row?;
        if table.hybridization.contains_key(&row.name) || table.fold.contains_key(&row.name) {
            return Err(TsvError::DuplicateName(row.name));
        }
        if let Some(h) = row.hybridization {
            table.insert_hybridization(row.name.clone(), h);
        }
        if let Some(f) = row.fold {
            table.insert_fold(row.name, f);
        }
    }
    Ok(table)
}

pub fn write_melt_table<P: AsRef<Path>>(table: &MeltTable, path: P) -> Result<(), TsvError> {
    let mut writer = tab_writer(path)?;
    writer.write_record(["name", "hybridization", "fold"])?;
    for name in table.names() {
        let cell = |value: Option<&f64>| {
            value.map_or_else(|| MISSING_VALUE.to_string(), |v| format!("{:.6}", v))
        };
        writer.write_record([
            name.to_string(),
            cell(table.hybridization.get(name)),
            cell(table.fold.get(name)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
