//! Token state construction.

use crate::counter::Counter;
use crate::domain::Ledger;

/// Ledger and counter, always handled together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub ledger: Ledger,
    pub counter: Counter,
}

/// Empty ledger, counter at 1.
pub fn create_initial_state() -> TokenState {
    TokenState::default()
}

/// State for a ledger loaded from storage.
///
/// The counter is re-derived from the record count so a restart can
/// never leave it behind the persisted rows.
pub fn restore_state(ledger: Ledger) -> TokenState {
    let counter = Counter::from_ledger_len(ledger.len());
    TokenState { ledger, counter }
}
