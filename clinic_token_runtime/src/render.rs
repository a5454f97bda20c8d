//! Plain-text presentation.

use chrono::NaiveDate;
use serde::Serialize;

use clinic_token_engine::domain::{VisitRecord, CONSULTATION_FEE, CURRENCY, LEDGER_COLUMNS};
use clinic_token_engine::timefmt::format_long_date;

use crate::csv_codec::CsvRow;
use crate::settings::Settings;

pub const NO_TOKENS: &str = "No tokens generated yet";
pub const NO_HISTORY: &str = "No patient history available";
pub const NO_HISTORY_IN_WINDOW: &str = "No patient history in the selected window";
pub const RESET_DONE: &str = "Token numbers have been reset to 1";

/// Machine-readable `status` output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub clinic: String,
    pub contact: String,
    pub address: String,
    pub fee: u32,
    pub currency: &'static str,
    pub today: String,
    pub next_token: u32,
    pub records: usize,
    pub ledger_hash: String,
    pub consistent: bool,
}

pub fn render_banner(settings: &Settings, today: NaiveDate, next_token: u32) -> String {
    format!(
        "{title}\nManage patient queue efficiently\n{contact}\nDate: {date}\nCurrent Token Number: {next}\n",
        title = settings.clinic.title,
        contact = settings.contact_line(),
        date = format_long_date(today),
        next = next_token,
    )
}

pub fn render_token_card(record: &VisitRecord) -> String {
    format!(
        "Token Number: {}\n  Doctor:  {}\n  Patient: {}\n  Age:     {}\n  Time:    {}\n  Fee:     {} {}\n",
        record.token,
        record.doctor,
        record.patient,
        record.age,
        record.time,
        CURRENCY,
        CONSULTATION_FEE,
    )
}

/// Fixed-width table, one line per row, header first.
///
/// `total_records` is the ledger size before windowing, so an empty
/// window over a non-empty ledger is not reported as "no history".
pub fn render_history(rows: &[CsvRow], heading: &str, total_records: usize) -> String {
    if rows.is_empty() {
        if total_records == 0 {
            return format!("{}\n", NO_HISTORY);
        }
        return format!(
            "{} ({} records in total; use --all to show them)\n",
            NO_HISTORY_IN_WINDOW, total_records
        );
    }

    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|r| {
            [
                r.date.clone(),
                r.token.to_string(),
                r.doctor.clone(),
                r.patient.clone(),
                r.age.to_string(),
                r.time.clone(),
                r.fee.to_string(),
            ]
        })
        .collect();

    let mut widths = LEDGER_COLUMNS.map(|c| c.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(heading);
    out.push('\n');
    push_line(&mut out, LEDGER_COLUMNS.iter().copied(), &widths);
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 7]) {
    let line = cells
        .zip(widths.iter())
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
