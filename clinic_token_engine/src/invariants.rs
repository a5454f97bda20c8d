//! Invariant checks over ledger and counter.
//!
//! `validate_invariants` panics and guards the engine's own
//! transitions. `try_validate_invariants` reports instead, for ledgers
//! read back from disk that other sessions may have written.

use crate::domain::CONSULTATION_FEE;
use crate::state::TokenState;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Panics on the first failure.
pub fn validate_invariants(state: &TokenState) {
    if let Err(msg) = try_validate_invariants(state) {
        panic!("Invariant violation: {}", msg);
    }
}

/// Non-panicking variant. `Err(message)` on the first failure.
pub fn try_validate_invariants(state: &TokenState) -> Result<(), String> {
    check_counter_positive(state)?;
    check_counter_matches_ledger(state)?;
    check_tokens_sequential(state)?;
    check_fixed_fee(state)?;
    check_names_present(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_counter_positive(state: &TokenState) -> Result<(), String> {
    if state.counter.current() == 0 {
        return Err("[INVARIANT:counter_positive] counter must be >= 1".to_string());
    }
    Ok(())
}

fn check_counter_matches_ledger(state: &TokenState) -> Result<(), String> {
    let expected = state.ledger.len() as u64 + 1;
    let actual = state.counter.current() as u64;
    if actual != expected {
        return Err(format!(
            "[INVARIANT:counter_matches_ledger] counter is {} but ledger holds {} records (expected {})",
            actual,
            state.ledger.len(),
            expected
        ));
    }
    Ok(())
}

/// Tokens are exactly 1..=len in issuance order.
fn check_tokens_sequential(state: &TokenState) -> Result<(), String> {
    for (idx, record) in state.ledger.iter().enumerate() {
        let expected = idx as u64 + 1;
        if record.token as u64 != expected {
            return Err(format!(
                "[INVARIANT:tokens_sequential] row {} has token {}, expected {}",
                idx, record.token, expected
            ));
        }
    }
    Ok(())
}

fn check_fixed_fee(state: &TokenState) -> Result<(), String> {
    if let Some((idx, record)) = state
        .ledger
        .iter()
        .enumerate()
        .find(|(_, r)| r.fee != CONSULTATION_FEE)
    {
        return Err(format!(
            "[INVARIANT:fixed_fee] row {} (token {}) has fee {}, expected {}",
            idx, record.token, record.fee, CONSULTATION_FEE
        ));
    }
    Ok(())
}

fn check_names_present(state: &TokenState) -> Result<(), String> {
    for (idx, record) in state.ledger.iter().enumerate() {
        if record.doctor.trim().is_empty() || record.patient.trim().is_empty() {
            return Err(format!(
                "[INVARIANT:names_present] row {} (token {}) is missing a doctor or patient name",
                idx, record.token
            ));
        }
    }
    Ok(())
}
