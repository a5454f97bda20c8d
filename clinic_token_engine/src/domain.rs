//! Core domain types.
//!
//! Pure data. Issuance and reset logic live in `engine`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Consultation fee charged for every visit.
pub const CONSULTATION_FEE: u32 = 500;

/// Currency label shown next to the fee.
pub const CURRENCY: &str = "Rs.";

/// Column order of the interchange format.
pub const LEDGER_COLUMNS: [&str; 7] = ["Date", "Token", "Doctor", "Patient", "Age", "Time", "Fee"];

/// One issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisitRecord {
    /// Full issuance timestamp, microsecond precision.
    pub date: NaiveDateTime,
    /// Positive, unique within the current counter epoch only.
    pub token: u32,
    pub doctor: String,
    pub patient: String,
    pub age: u8,
    /// 12-hour wall clock, e.g. "02:15 PM".
    pub time: String,
    pub fee: u32,
}

/// Ordered visit history. Insertion order is issuance order.
///
/// Records are never edited or removed one at a time; `clear` is the
/// only bulk removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: Vec<VisitRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<VisitRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[VisitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recently issued record.
    pub fn last(&self) -> Option<&VisitRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisitRecord> {
        self.records.iter()
    }

    pub fn push(&mut self, record: VisitRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a VisitRecord;
    type IntoIter = std::slice::Iter<'a, VisitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Receptionist input for one issuance, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub doctor: String,
    pub patient: String,
    pub age: u8,
}

impl IssueRequest {
    pub fn new(doctor: impl Into<String>, patient: impl Into<String>, age: u8) -> Self {
        Self {
            doctor: doctor.into(),
            patient: patient.into(),
            age,
        }
    }
}
