//! Rebuild engine state from a persisted ledger.
//!
//! The counter is never read from anywhere but the ledger: a fresh
//! engine is restored over the records, so `next token = len + 1`
//! after every load, across restarts.

use tracing::warn;

use clinic_token_engine::domain::Ledger;
use clinic_token_engine::engine::TokenEngine;
use clinic_token_engine::hashing::canonical_hash;
use clinic_token_engine::invariants::try_validate_invariants;

/// Restore an engine over `ledger` and return it with the ledger's
/// canonical hash.
pub fn rebuild_state(ledger: Ledger) -> (TokenEngine, String) {
    let hash = canonical_hash(&ledger);
    let engine = TokenEngine::restore(ledger);

    if let Err(msg) = try_validate_invariants(engine.state()) {
        warn!(
            records = engine.ledger().len(),
            next_token = engine.next_token(),
            "restored ledger is inconsistent: {}",
            msg
        );
    }

    (engine, hash)
}

/// Canonical hash only.
pub fn rebuild_hash(ledger: &Ledger) -> String {
    canonical_hash(ledger)
}
