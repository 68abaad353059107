//! Remote time-tracking service integration.
//!
//! Provides a typed HTTP client for the three remote surfaces the
//! reconciliation pipeline depends on:
//! - batch work-item key resolution (key -> numeric id)
//! - reading existing worklogs for a set of calendar dates
//! - applying create/update/delete mutations
//!
//! The client is constructed once per run and passed to every collaborator
//! that needs network access; there is no process-wide shared state.

mod apply;
mod client;
mod issues;
mod worklogs;

pub use apply::{ApplyReport, apply_plan, clear_dates};
pub use client::{Client, PAGE_LIMIT, RemoteError};
