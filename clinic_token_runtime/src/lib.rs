#![forbid(unsafe_code)]

//! Clinic token runtime.
//!
//! Wraps the token engine with CSV persistence, sessions, settings,
//! history views and the `pch-token` command line.
//!
//! No issuance rules live here; validation, numbering and invariants
//! are delegated to the engine.

pub mod error;
pub mod csv_codec;
pub mod ledger_store;
pub mod replay;
pub mod session;
pub mod history;
pub mod settings;
pub mod cli;
pub mod render;
