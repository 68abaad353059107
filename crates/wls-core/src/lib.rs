//! Core domain logic for the worklog sync tool.
//!
//! This crate contains the fundamental types and logic for:
//! - Ledger loading: validating user-supplied time entries
//! - Reconciliation: pairing ledger rows with existing remote worklogs and
//!   deciding create/update/delete
//! - Scheduling: synthesizing non-overlapping start-of-day timestamps
//!
//! Everything here is pure: no I/O and no HTTP.

pub mod duration;
pub mod ledger;
mod reconcile;
mod schedule;
pub mod types;

pub use duration::{ParseDurationError, format_duration, parse_duration};
pub use ledger::{LedgerError, RowError, RowErrorKind, load_ledger};
pub use reconcile::{ReconcilePlan, Upsert, WorklogTarget, reconcile};
pub use schedule::Scheduler;
pub use types::{IdentityMap, IssueKey, LedgerRow, RemoteWorklog, ValidationError};
