//! Integration tests for clinic_token_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use clinic_token_engine::domain::{IssueRequest, VisitRecord};
use clinic_token_engine::validation::RequiredField;
use clinic_token_runtime::csv_codec::{decode_rows, encode_ledger, DateStyle};
use clinic_token_runtime::error::LedgerError;
use clinic_token_runtime::history::HistoryWindow;
use clinic_token_runtime::ledger_store::LedgerStore;
use clinic_token_runtime::session::{Session, SharedSession};
use clinic_token_runtime::settings::Settings;

fn ledger_path(dir: &TempDir) -> PathBuf {
    dir.path().join("patient_records.csv")
}

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_micro_opt(h, m, 7, 250_000)
        .unwrap()
}

fn khan(patient: &str, age: u8) -> IssueRequest {
    IssueRequest::new("Dr. Khan", patient, age)
}

// ─────────────────────────────────────────────────────────────
// Issuance and reset
// ─────────────────────────────────────────────────────────────

#[test]
fn issue_twice_then_reset_scenario() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).expect("open session");
    assert_eq!(session.next_token(), 1);

    let ali = session.issue_at(&khan("Ali", 30), at(5, 10, 0)).unwrap();
    assert_eq!((ali.token, ali.fee), (1, 500));
    let sara = session.issue_at(&khan("Sara", 25), at(5, 10, 5)).unwrap();
    assert_eq!((sara.token, sara.fee), (2, 500));
    assert_eq!(session.next_token(), 3);

    session.reset().unwrap();
    assert_eq!(session.next_token(), 1);
    assert!(!path.exists());

    let again = session.issue_at(&khan("Ali", 30), at(5, 11, 0)).unwrap();
    assert_eq!(again.token, 1);

    let reloaded = LedgerStore::open(&path).unwrap().load().unwrap();
    assert_eq!(reloaded.records(), &[again]);
}

#[test]
fn valid_issue_appends_exactly_one_record() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();

    let before = session.next_token();
    let rec = session.issue_at(&khan("Sara", 25), at(5, 9, 1)).unwrap();

    assert_eq!(rec.token, before);
    assert_eq!(session.next_token(), before + 1);
    assert_eq!(session.ledger().len(), 2);
    assert_eq!(LedgerStore::open(&path).unwrap().load().unwrap().len(), 2);
}

#[test]
fn zero_age_leaves_ledger_and_counter_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();
    let bytes_before = fs::read(&path).unwrap();

    let err = session.issue_at(&khan("Sara", 0), at(5, 9, 5)).unwrap_err();

    assert!(err.is_validation());
    match err {
        LedgerError::Validation(v) => assert_eq!(v.missing(), &[RequiredField::Age]),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(session.next_token(), 2);
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(fs::read(&path).unwrap(), bytes_before);
}

#[test]
fn missing_names_never_create_the_ledger_file() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();

    for request in [
        IssueRequest::new("", "Ali", 30),
        IssueRequest::new("Dr. Khan", "", 30),
    ] {
        let err = session.issue_at(&request, at(5, 9, 0)).unwrap_err();
        assert!(err.is_validation());
    }

    assert!(!path.exists());
    assert_eq!(session.next_token(), 1);
}

#[test]
fn reset_empties_ledger_regardless_of_size() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);

    for n in [0u32, 1, 7] {
        let mut session = Session::open(&path).unwrap();
        for i in 0..n {
            session
                .issue_at(&khan(&format!("Patient {}", i), 40), at(5, 12, i))
                .unwrap();
        }
        session.reset().unwrap();
        assert_eq!(session.next_token(), 1);

        let reopened = Session::open(&path).unwrap();
        assert!(reopened.ledger().is_empty());
        assert_eq!(reopened.next_token(), 1);
    }
}

#[test]
fn failed_reset_keeps_rows_and_counter() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    for (i, name) in ["Ali", "Sara", "Omar"].iter().enumerate() {
        session.issue_at(&khan(name, 30), at(5, 9, i as u32)).unwrap();
    }
    let persisted = fs::read(&path).unwrap();

    // A non-empty directory where the ledger file was makes the delete fail.
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), b"x").unwrap();

    let err = session.reset().unwrap_err();
    assert!(matches!(err, LedgerError::Io(_)), "got {:?}", err);
    assert!(!err.is_validation());
    assert_eq!(session.next_token(), 4);
    assert_eq!(session.ledger().len(), 3);

    // Once the file is back, the next issue extends it instead of
    // replacing it with a lone token 1.
    fs::remove_dir_all(&path).unwrap();
    fs::write(&path, &persisted).unwrap();

    let rec = session.issue_at(&khan("Zara", 19), at(5, 9, 30)).unwrap();
    assert_eq!(rec.token, 4);
    let on_disk = LedgerStore::open(&path).unwrap().load().unwrap();
    let tokens: Vec<u32> = on_disk.iter().map(|r| r.token).collect();
    assert_eq!(tokens, [1, 2, 3, 4]);
}

// ─────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────

#[test]
fn missing_store_loads_as_empty_ledger() {
    let dir = TempDir::new().unwrap();
    let mut store = LedgerStore::open(&dir.path().join("nested").join("records.csv")).unwrap();
    assert!(store.load().unwrap().is_empty());
    assert!(store.fingerprint().is_none());
}

#[test]
fn append_then_load_returns_record_last() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut store = LedgerStore::open(&path).unwrap();

    let ledger = store.load().unwrap();
    let record = VisitRecord {
        date: at(5, 14, 3),
        token: 1,
        doctor: "Dr. Khan".to_string(),
        patient: "Ali".to_string(),
        age: 30,
        time: "02:03 PM".to_string(),
        fee: 500,
    };
    let appended = store.append(&ledger, record.clone()).unwrap();
    assert_eq!(appended.last(), Some(&record));

    let loaded = LedgerStore::open(&path).unwrap().load().unwrap();
    assert_eq!(loaded.last(), Some(&record));
    assert_eq!(loaded, appended);
}

#[test]
fn append_leaves_no_temp_files_and_ignores_stale_ones() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let stale = dir.path().join("patient_records.csv.tmp");
    fs::write(&stale, b"half-written").unwrap();

    let mut session = Session::open(&path).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();
    session.issue_at(&khan("Sara", 25), at(5, 9, 1)).unwrap();

    assert_eq!(fs::read(&stale).unwrap(), b"half-written".to_vec());
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["patient_records.csv", "patient_records.csv.tmp"]);
    assert_eq!(LedgerStore::open(&path).unwrap().load().unwrap().len(), 2);
}

#[test]
fn issued_timestamp_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    let issued_at = NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_nano_opt(14, 3, 22, 123_456_789)
        .unwrap();
    let rec = session.issue_at(&khan("Ali", 30), issued_at).unwrap();

    let reopened = Session::open(&path).unwrap();
    assert_eq!(reopened.latest(), Some(&rec));
    assert_eq!(rec.time, "02:03 PM");
}

#[test]
fn pandas_style_timestamps_without_fraction_load() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    fs::write(
        &path,
        "Date,Token,Doctor,Patient,Age,Time,Fee\n\
         2024-01-05 09:00:00,1,Dr. Khan,Ali,30,09:00 AM,500\n\
         2024-01-05 09:10:00.500000,2,Dr. Khan,Sara,25,09:10 AM,500\n",
    )
    .unwrap();

    let session = Session::open(&path).unwrap();
    assert_eq!(session.ledger().len(), 2);
    assert_eq!(session.next_token(), 3);
    assert!(session.is_consistent());
}

#[test]
fn long_date_ledger_cannot_be_reloaded() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();

    // What the history view shows must never be written back.
    fs::write(&path, session.export_blob().unwrap()).unwrap();

    match Session::open(&path) {
        Err(LedgerError::Timestamp { row, value }) => {
            assert_eq!(row, 0);
            assert_eq!(value, "January 05, 2024");
        }
        Err(other) => panic!("expected timestamp error, got {:?}", other),
        Ok(_) => panic!("long-date ledger should not load"),
    }
}

#[test]
fn unwritable_location_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"x").unwrap();

    let err = Session::open(&blocker.join("records.csv")).err().expect("open must fail");
    assert!(!err.is_validation());
    assert!(matches!(err, LedgerError::Io(_)));
}

// ─────────────────────────────────────────────────────────────
// Export and history
// ─────────────────────────────────────────────────────────────

#[test]
fn export_blob_matches_ledger_rows() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(&ledger_path(&dir)).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();
    session.issue_at(&IssueRequest::new("Dr. Rana", "Sara", 25), at(6, 16, 45)).unwrap();

    let rows = decode_rows(&session.export_blob().unwrap()).unwrap();
    assert_eq!(rows.len(), session.ledger().len());

    for (row, rec) in rows.iter().zip(session.ledger().iter()) {
        assert_eq!(row.token, rec.token);
        assert_eq!(row.doctor, rec.doctor);
        assert_eq!(row.patient, rec.patient);
        assert_eq!(row.age, rec.age);
        assert_eq!(row.time, rec.time);
        assert_eq!(row.fee, rec.fee);
    }
    assert_eq!(rows[0].date, "January 05, 2024");
    assert_eq!(rows[1].date, "January 06, 2024");
    assert_eq!(rows[1].time, "04:45 PM");
}

#[test]
fn default_history_window_shows_every_record() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(&ledger_path(&dir)).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();

    let settings = Settings::default();
    let window = HistoryWindow::resolve(None, false, settings.history.window_days);
    assert_eq!(window, HistoryWindow::All);

    let far_later = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let rows = session.history(window, far_later);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "January 05, 2024");
}

#[test]
fn empty_export_is_header_only() {
    let dir = TempDir::new().unwrap();
    let session = Session::open(&ledger_path(&dir)).unwrap();
    let blob = session.export_blob().unwrap();
    assert_eq!(blob, b"Date,Token,Doctor,Patient,Age,Time,Fee\n".to_vec());
}

#[test]
fn history_window_filters_copies_only() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    session.issue_at(&khan("Old", 60), at(1, 9, 0)).unwrap();
    session.issue_at(&khan("Recent", 33), at(8, 9, 0)).unwrap();
    session.issue_at(&khan("Today", 21), at(10, 9, 0)).unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let recent = session.history(HistoryWindow::LastDays(8), today);
    let names: Vec<&str> = recent.iter().map(|r| r.patient.as_str()).collect();
    assert_eq!(names, ["Recent", "Today"]);
    assert_eq!(recent[1].date, "January 10, 2024");

    assert_eq!(session.history(HistoryWindow::All, today).len(), 3);
    assert!(session.history(HistoryWindow::LastDays(0), today).is_empty());

    // Display formatting did not touch the persisted form.
    let reopened = Session::open(&path).unwrap();
    assert_eq!(reopened.ledger(), session.ledger());
}

// ─────────────────────────────────────────────────────────────
// Restarts and multiple sessions
// ─────────────────────────────────────────────────────────────

#[test]
fn restart_resumes_counter_from_ledger() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    {
        let mut session = Session::open(&path).unwrap();
        session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();
        session.issue_at(&khan("Sara", 25), at(5, 9, 5)).unwrap();
    }

    let mut session = Session::open(&path).unwrap();
    assert_eq!(session.next_token(), 3);
    let rec = session.issue_at(&khan("Omar", 51), at(5, 9, 10)).unwrap();
    assert_eq!(rec.token, 3);
}

#[test]
fn second_session_must_reload_after_concurrent_write() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut a = Session::open(&path).unwrap();
    let mut b = Session::open(&path).unwrap();

    a.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();

    // Without the fingerprint check b would overwrite Ali with its
    // own token 1.
    let err = b.issue_at(&khan("Sara", 25), at(5, 9, 1)).unwrap_err();
    assert!(matches!(err, LedgerError::ConcurrentModification { .. }));
    assert_eq!(b.next_token(), 1);

    b.reload().unwrap();
    let rec = b.issue_at(&khan("Sara", 25), at(5, 9, 2)).unwrap();
    assert_eq!(rec.token, 2);

    let ledger = LedgerStore::open(&path).unwrap().load().unwrap();
    let tokens: Vec<u32> = ledger.iter().map(|r| r.token).collect();
    assert_eq!(tokens, [1, 2]);
}

#[test]
fn duplicate_tokens_on_disk_are_flagged_not_renumbered() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut ledger_bytes = Vec::new();
    {
        let mut a = Session::open(&path).unwrap();
        a.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();
        ledger_bytes.extend(fs::read(&path).unwrap());
    }
    // Simulate two sessions that both issued token 1.
    let text = String::from_utf8(ledger_bytes).unwrap();
    let dup_row = text.lines().nth(1).unwrap().replace("Ali", "Sara");
    fs::write(&path, format!("{}{}\n", text, dup_row)).unwrap();

    let mut session = Session::open(&path).unwrap();
    assert!(!session.is_consistent());
    let tokens: Vec<u32> = session.ledger().iter().map(|r| r.token).collect();
    assert_eq!(tokens, [1, 1]);

    let next = session.issue_at(&khan("Omar", 51), at(5, 9, 30)).unwrap();
    assert_eq!(next.token, 3);
}

#[test]
fn shared_session_serialises_issuance() {
    let dir = TempDir::new().unwrap();
    let shared = Arc::new(SharedSession::new(Session::open(&ledger_path(&dir)).unwrap()));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..5 {
                    shared
                        .issue(&khan(&format!("T{}-{}", t, i), 20 + i as u8))
                        .expect("issue");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(shared.next_token().unwrap(), 21);
    let tokens: Vec<u32> = shared.ledger().unwrap().iter().map(|r| r.token).collect();
    assert_eq!(tokens, (1..=20).collect::<Vec<u32>>());

    shared.reset().unwrap();
    assert_eq!(shared.next_token().unwrap(), 1);
    assert!(shared.ledger().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────

#[test]
fn settings_defaults_without_config_file() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(
        settings.contact_line(),
        "Contact: 03345389032 | Address: City Karachi | Consultation Fee: Rs. 500"
    );
    assert_eq!(settings.storage.data_file, PathBuf::from("patient_records.csv"));
    assert_eq!(settings.history.window_days, None);
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("pch-token.toml");
    fs::write(
        &config_path,
        r#"
[clinic]
address = "Clifton, Karachi"

[storage]
data_file = "/var/lib/pch/records.csv"

[history]
window_days = 3
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(config_path.as_path())).unwrap();
    assert_eq!(settings.clinic.address, "Clifton, Karachi");
    assert_eq!(settings.clinic.contact, "03345389032");
    assert_eq!(settings.storage.data_file, PathBuf::from("/var/lib/pch/records.csv"));
    assert_eq!(settings.history.window_days, Some(3));
}

#[test]
fn timestamp_encoding_is_what_the_store_writes() {
    let dir = TempDir::new().unwrap();
    let path = ledger_path(&dir);
    let mut session = Session::open(&path).unwrap();
    session.issue_at(&khan("Ali", 30), at(5, 9, 0)).unwrap();

    let expected = encode_ledger(session.ledger(), DateStyle::Timestamp).unwrap();
    assert_eq!(fs::read(&path).unwrap(), expected);
}
