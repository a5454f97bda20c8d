#![forbid(unsafe_code)]

//! Clinic token engine.
//!
//! Pure kernel for sequential token issuance: the visit ledger, the
//! next-token counter, request validation and the invariants tying the
//! two together. No I/O and no clock live here; callers pass the
//! issuance timestamp in.

/// Ledger schema version. Bumped only if the interchange columns change.
pub const LEDGER_SCHEMA_VERSION: u32 = 1;

pub mod domain;
pub mod counter;
pub mod timefmt;
pub mod validation;
pub mod state;
pub mod invariants;
pub mod hashing;
pub mod engine;
