//! Token engine.
//!
//! Top-level orchestrator over `TokenState`. Issuance is split in two
//! so a caller that persists can do it between the steps:
//!   1. `preview`: validate and build the record for the current token
//!   2. `commit`:  append it and advance the counter
//!
//! `issue` runs both back to back.

use chrono::NaiveDateTime;

use crate::domain::{IssueRequest, Ledger, VisitRecord, CONSULTATION_FEE};
use crate::invariants::{try_validate_invariants, validate_invariants};
use crate::state::{create_initial_state, restore_state, TokenState};
use crate::timefmt::{format_clock, truncate_to_storage_precision};
use crate::validation::{validate_request, ValidationError};

/// Stateful engine owning one ledger and its counter.
#[derive(Debug, Clone)]
pub struct TokenEngine {
    state: TokenState,
    /// False when a restored ledger broke an invariant (e.g. duplicate
    /// tokens written by another session). Checks are then skipped
    /// rather than panicking on data this engine did not produce.
    consistent: bool,
}

impl Default for TokenEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEngine {
    /// Empty ledger, next token 1.
    pub fn new() -> Self {
        Self {
            state: create_initial_state(),
            consistent: true,
        }
    }

    /// Engine over a previously persisted ledger, counter repaired to
    /// `len + 1`.
    pub fn restore(ledger: Ledger) -> Self {
        let state = restore_state(ledger);
        let consistent = try_validate_invariants(&state).is_ok();
        Self { state, consistent }
    }

    pub fn state(&self) -> &TokenState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn next_token(&self) -> u32 {
        self.state.counter.current()
    }

    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Validate `request` and build the record the next issuance would
    /// produce. No state changes.
    pub fn preview(
        &self,
        request: &IssueRequest,
        issued_at: NaiveDateTime,
    ) -> Result<VisitRecord, ValidationError> {
        let valid = validate_request(request)?;
        let issued_at = truncate_to_storage_precision(issued_at);

        Ok(VisitRecord {
            date: issued_at,
            token: self.state.counter.current(),
            doctor: valid.doctor,
            patient: valid.patient,
            age: valid.age,
            time: format_clock(&issued_at),
            fee: CONSULTATION_FEE,
        })
    }

    /// Append a previewed record and advance the counter by one.
    ///
    /// Panics if `record` was not built for the current token.
    pub fn commit(&mut self, record: VisitRecord) {
        let expected = self.state.counter.current();
        if record.token != expected {
            panic!(
                "Token mismatch on commit: expected {}, got {}",
                expected, record.token
            );
        }

        self.state.ledger.push(record);
        self.state.counter.advance();

        if self.consistent {
            validate_invariants(&self.state);
        }
    }

    /// Validate, append and advance in one step.
    pub fn issue(
        &mut self,
        request: &IssueRequest,
        issued_at: NaiveDateTime,
    ) -> Result<VisitRecord, ValidationError> {
        let record = self.preview(request, issued_at)?;
        self.commit(record.clone());
        Ok(record)
    }

    /// Counter back to 1 and ledger emptied, unconditionally.
    pub fn reset(&mut self) {
        self.state.counter.reset();
        self.state.ledger.clear();
        self.consistent = true;
    }
}
