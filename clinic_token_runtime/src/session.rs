//! Session: ledger store and token engine handled as one state object.
//!
//! Issue order (persist before commit):
//!   1. engine.preview(request)   - validation; no state change on error
//!   2. store.append(ledger, rec) - full rewrite; no state change on error
//!   3. engine.commit(rec)        - append in memory, advance counter
//!
//! Reset order: delete the file, then counter to 1 and ledger emptied.
//! If the delete fails nothing in memory changes, so the next issue
//! still appends to the rows that remain on disk.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::info;

use clinic_token_engine::domain::{IssueRequest, Ledger, VisitRecord};
use clinic_token_engine::engine::TokenEngine;

use crate::csv_codec::CsvRow;
use crate::error::LedgerError;
use crate::history::{history_rows, HistoryWindow};
use crate::ledger_store::LedgerStore;
use crate::replay;

/// One receptionist's view of the clinic ledger.
pub struct Session {
    store: LedgerStore,
    engine: TokenEngine,
}

impl Session {
    /// Open the ledger at `path` and restore the counter from it.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let mut store = LedgerStore::open(path)?;
        let ledger = store.load()?;
        let (engine, hash) = replay::rebuild_state(ledger);

        info!(
            path = %path.display(),
            records = engine.ledger().len(),
            next_token = engine.next_token(),
            hash = %hash,
            "session opened"
        );

        Ok(Self { store, engine })
    }

    /// Re-read the ledger from disk, discarding in-memory state.
    pub fn reload(&mut self) -> Result<(), LedgerError> {
        let ledger = self.store.load()?;
        let (engine, _) = replay::rebuild_state(ledger);
        self.engine = engine;
        Ok(())
    }

    /// Issue a token stamped with the local wall clock.
    pub fn issue(&mut self, request: &IssueRequest) -> Result<VisitRecord, LedgerError> {
        self.issue_at(request, Local::now().naive_local())
    }

    /// Issue a token stamped with `issued_at`.
    pub fn issue_at(
        &mut self,
        request: &IssueRequest,
        issued_at: NaiveDateTime,
    ) -> Result<VisitRecord, LedgerError> {
        let record = self.engine.preview(request, issued_at)?;
        self.store.append(self.engine.ledger(), record.clone())?;
        self.engine.commit(record.clone());

        info!(
            token = record.token,
            doctor = %record.doctor,
            next_token = self.engine.next_token(),
            "token issued"
        );
        Ok(record)
    }

    /// Counter back to 1 and the persisted ledger deleted.
    pub fn reset(&mut self) -> Result<(), LedgerError> {
        self.store.clear()?;
        self.engine.reset();
        info!(path = %self.store.path().display(), "token numbers reset to 1");
        Ok(())
    }

    pub fn latest(&self) -> Option<&VisitRecord> {
        self.engine.ledger().last()
    }

    pub fn ledger(&self) -> &Ledger {
        self.engine.ledger()
    }

    pub fn history(&self, window: HistoryWindow, today: NaiveDate) -> Vec<CsvRow> {
        history_rows(self.engine.ledger(), window, today)
    }

    pub fn export_blob(&self) -> Result<Vec<u8>, LedgerError> {
        LedgerStore::to_export_blob(self.engine.ledger())
    }

    pub fn next_token(&self) -> u32 {
        self.engine.next_token()
    }

    /// Canonical hash of the in-memory ledger.
    pub fn current_hash(&self) -> String {
        replay::rebuild_hash(self.engine.ledger())
    }

    pub fn is_consistent(&self) -> bool {
        self.engine.is_consistent()
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Issue under lock.
    pub fn issue(&self, request: &IssueRequest) -> Result<VisitRecord, LedgerError> {
        self.lock()?.issue(request)
    }

    /// Reset under lock.
    pub fn reset(&self) -> Result<(), LedgerError> {
        self.lock()?.reset()
    }

    /// Next token under lock.
    pub fn next_token(&self) -> Result<u32, LedgerError> {
        Ok(self.lock()?.next_token())
    }

    /// Copy of the ledger under lock.
    pub fn ledger(&self) -> Result<Ledger, LedgerError> {
        Ok(self.lock()?.ledger().clone())
    }
}
