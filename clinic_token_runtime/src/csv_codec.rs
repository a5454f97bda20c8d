//! CSV interchange codec.
//!
//! Columns, in order: Date, Token, Doctor, Patient, Age, Time, Fee.
//!
//! `Date` has two renderings:
//!   - `DateStyle::Timestamp`: full timestamp, the persisted form
//!   - `DateStyle::LongDate`:  "January 05, 2024", export and display only
//!
//! Only the timestamp form can be decoded back into a ledger.

use serde::{Deserialize, Serialize};

use clinic_token_engine::domain::{Ledger, VisitRecord, LEDGER_COLUMNS};
use clinic_token_engine::timefmt::{
    format_long_date, format_storage_timestamp, parse_storage_timestamp,
};

use crate::error::LedgerError;

/// How the `Date` column is rendered on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    Timestamp,
    LongDate,
}

/// One interchange row. Field order matches `LEDGER_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Token")]
    pub token: u32,
    #[serde(rename = "Doctor")]
    pub doctor: String,
    #[serde(rename = "Patient")]
    pub patient: String,
    #[serde(rename = "Age")]
    pub age: u8,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Fee")]
    pub fee: u32,
}

impl CsvRow {
    pub fn from_record(record: &VisitRecord, style: DateStyle) -> Self {
        let date = match style {
            DateStyle::Timestamp => format_storage_timestamp(&record.date),
            DateStyle::LongDate => format_long_date(record.date.date()),
        };
        Self {
            date,
            token: record.token,
            doctor: record.doctor.clone(),
            patient: record.patient.clone(),
            age: record.age,
            time: record.time.clone(),
            fee: record.fee,
        }
    }
}

/// Encode a ledger. The header row is always written, so an empty
/// ledger still produces a correctly shaped file.
pub fn encode_ledger(ledger: &Ledger, style: DateStyle) -> Result<Vec<u8>, LedgerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(LEDGER_COLUMNS)?;
    for record in ledger {
        writer.serialize(CsvRow::from_record(record, style))?;
    }

    writer
        .into_inner()
        .map_err(|e| LedgerError::Io(e.into_error()))
}

/// Decode rows without touching the `Date` column.
pub fn decode_rows(bytes: &[u8]) -> Result<Vec<CsvRow>, LedgerError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if !headers.iter().eq(LEDGER_COLUMNS.iter().copied()) {
        return Err(LedgerError::Header {
            expected: LEDGER_COLUMNS.join(","),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut rows = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Decode a persisted ledger, parsing every `Date` into a timestamp.
pub fn decode_ledger(bytes: &[u8]) -> Result<Ledger, LedgerError> {
    let rows = decode_rows(bytes)?;
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.into_iter().enumerate() {
        let date = parse_storage_timestamp(&row.date).map_err(|_| LedgerError::Timestamp {
            row: idx,
            value: row.date.clone(),
        })?;
        records.push(VisitRecord {
            date,
            token: row.token,
            doctor: row.doctor,
            patient: row.patient,
            age: row.age,
            time: row.time,
            fee: row.fee,
        });
    }

    Ok(Ledger::from_records(records))
}
