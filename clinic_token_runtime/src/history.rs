//! History views.
//!
//! Every view is a copy: dates are rendered as long calendar strings
//! on the copy, never on the ledger itself.

use chrono::NaiveDate;

use clinic_token_engine::domain::{Ledger, VisitRecord};

use crate::csv_codec::{CsvRow, DateStyle};

/// Which records a history view includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    All,
    /// Records dated within the last N days, today included.
    LastDays(u32),
}

impl HistoryWindow {
    /// Every record unless a day count is asked for. `--all` wins over a
    /// configured default; an explicit `--days` wins over both.
    pub fn resolve(days: Option<u32>, all: bool, configured_days: Option<u32>) -> Self {
        match (days, all, configured_days) {
            (Some(n), _, _) => HistoryWindow::LastDays(n),
            (None, true, _) => HistoryWindow::All,
            (None, false, Some(n)) => HistoryWindow::LastDays(n),
            (None, false, None) => HistoryWindow::All,
        }
    }

    pub fn heading(&self) -> String {
        match *self {
            HistoryWindow::All => "Patient History".to_string(),
            HistoryWindow::LastDays(n) => format!("Patient History (Last {} Days)", n),
        }
    }

    pub fn includes(&self, record: &VisitRecord, today: NaiveDate) -> bool {
        match *self {
            HistoryWindow::All => true,
            HistoryWindow::LastDays(days) => {
                (today - record.date.date()).num_days() < i64::from(days)
            }
        }
    }
}

/// Display rows for `ledger`, issuance order preserved.
pub fn history_rows(ledger: &Ledger, window: HistoryWindow, today: NaiveDate) -> Vec<CsvRow> {
    ledger
        .iter()
        .filter(|r| window.includes(r, today))
        .map(|r| CsvRow::from_record(r, DateStyle::LongDate))
        .collect()
}
