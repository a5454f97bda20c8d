//! Canonical ledger hashing.
//!
//! Deterministic JSON serialization + SHA-256.
//!
//! Rules:
//!   - Records in issuance order
//!   - Fields in interchange column order
//!   - Dates as storage timestamps, never the long display form
//!   - No whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{Ledger, VisitRecord};
use crate::timefmt::format_storage_timestamp;
use crate::LEDGER_SCHEMA_VERSION;

/// Canonical UTF-8 JSON of a ledger.
pub fn canonical_serialize(ledger: &Ledger) -> Vec<u8> {
    let rows: Vec<Value> = ledger.iter().map(canonical_record).collect();

    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::from(LEDGER_SCHEMA_VERSION),
    );
    root.insert("records".to_string(), Value::Array(rows));

    Value::Object(root).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization, lowercase hex.
pub fn canonical_hash(ledger: &Ledger) -> String {
    sha256_hex(&canonical_serialize(ledger))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn canonical_record(r: &VisitRecord) -> Value {
    let mut m = Map::new();
    m.insert("date".to_string(), Value::String(format_storage_timestamp(&r.date)));
    m.insert("token".to_string(), Value::from(r.token));
    m.insert("doctor".to_string(), Value::String(r.doctor.clone()));
    m.insert("patient".to_string(), Value::String(r.patient.clone()));
    m.insert("age".to_string(), Value::from(r.age));
    m.insert("time".to_string(), Value::String(r.time.clone()));
    m.insert("fee".to_string(), Value::from(r.fee));
    Value::Object(m)
}
