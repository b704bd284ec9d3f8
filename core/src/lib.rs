//! triage-core — the case lifecycle and decision audit engine behind
//! the triage desk.
//!
//! The engine owns a SQLite-backed store, an append-only event log,
//! and a deterministic action loop: select a case, simulate case
//! events, commit a decision. Start at [`engine::DeskEngine`].

pub mod assessment;
pub mod clock;
pub mod command;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod event;
pub mod intake;
pub mod ledger;
pub mod lifecycle;
pub mod queue;
pub mod reviewer_role;
pub mod rng;
pub mod snapshot;
pub mod store;
pub mod types;
