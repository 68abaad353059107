//! The reconciliation engine.
//!
//! Given the ledger and a read-only snapshot of the remote worklogs for the
//! ledger's dates, computes the minimal set of create/update/delete actions
//! that make the remote state match the ledger.
//!
//! # Algorithm
//!
//! 1. Index every ledger row by `(issue key, date)` into FIFO queues,
//!    preserving ledger order.
//! 2. Walk the remote snapshot. A record whose numeric issue id maps back to
//!    a ledger key claims the earliest unmatched row with the same key and
//!    calendar date (first-fit); the pair becomes an update. Records with no
//!    claimable row, including orphans referencing work items the ledger
//!    never mentions, become deletions.
//! 3. Rows left unclaimed become creations, in ledger order.
//! 4. Creations and updates are sorted by row date, and within a date by the
//!    existing record's start (creations last), so the scheduling pass
//!    assigns start times deterministically even when the snapshot arrives
//!    in arbitrary order.
//!
//! Matching is on key and calendar date only; duration and description are
//! payload, not identity. When several rows share a `(key, date)` pair the
//! pairing is first-fit by ledger order; the engine cannot disambiguate
//! same-day same-issue entries beyond pure count.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::types::{IdentityMap, IssueKey, LedgerRow, RemoteWorklog};

/// A create-or-update decision: one ledger row, optionally paired with the
/// existing remote record it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub row: LedgerRow,
    /// `Some` for updates, `None` for creations.
    pub existing: Option<RemoteWorklog>,
}

/// The full set of decisions for one invocation.
///
/// Computed once from the ledger and the remote snapshot, consumed by the
/// mutation applier, then discarded; nothing persists across runs.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Creations and updates, sorted by row date ascending; same-date
    /// updates keep the existing records' start order, creations follow in
    /// ledger order.
    pub upserts: Vec<Upsert>,
    /// Remote records with no ledger support, in snapshot order.
    pub deletions: Vec<RemoteWorklog>,
}

impl ReconcilePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}

/// Computes the reconciliation plan.
///
/// `tz` is the zone used to derive each remote record's calendar date from
/// its absolute start instant; it must be the same zone the worklog reader
/// filtered with. This function cannot fail: the ledger was validated by the
/// loader, and it never runs when resolution or the remote fetch failed.
pub fn reconcile<Tz: TimeZone>(
    rows: Vec<LedgerRow>,
    identities: &IdentityMap,
    remote: Vec<RemoteWorklog>,
    tz: &Tz,
) -> ReconcilePlan {
    let mut slots: Vec<Option<LedgerRow>> = rows.into_iter().map(Some).collect();

    // First-fit arena: (key, date) -> queue of unmatched row indices.
    let mut unmatched: HashMap<(IssueKey, NaiveDate), VecDeque<usize>> = HashMap::new();
    for (idx, slot) in slots.iter().enumerate() {
        if let Some(row) = slot {
            unmatched
                .entry((row.issue_key.clone(), row.date))
                .or_default()
                .push_back(idx);
        }
    }

    let mut upserts = Vec::new();
    let mut deletions = Vec::new();

    for record in remote {
        let claimed = identities.key_for(record.issue_id).and_then(|key| {
            let date = record.start.with_timezone(tz).date_naive();
            unmatched
                .get_mut(&(key.clone(), date))
                .and_then(VecDeque::pop_front)
        });

        match claimed {
            Some(idx) => {
                let row = slots[idx].take();
                debug_assert!(row.is_some(), "row index claimed twice");
                if let Some(row) = row {
                    upserts.push(Upsert {
                        row,
                        existing: Some(record),
                    });
                }
            }
            None => {
                tracing::debug!(worklog_id = %record.id, issue_id = record.issue_id,
                    "remote worklog has no ledger support");
                deletions.push(record);
            }
        }
    }

    upserts.extend(slots.into_iter().flatten().map(|row| Upsert {
        row,
        existing: None,
    }));

    // Within a date, updates come first ordered by the existing record's
    // start, then creations in ledger-file order (stable sort). Keying on
    // the existing start makes same-date scheduling independent of the
    // snapshot's emission order: a rerun re-assigns each record the slot it
    // already occupies instead of shuffling starts around.
    upserts.sort_by_key(|upsert| {
        let existing_start = upsert
            .existing
            .as_ref()
            .map_or(DateTime::<Utc>::MAX_UTC, |existing| existing.start);
        (upsert.row.date, existing_start)
    });

    ReconcilePlan { upserts, deletions }
}

/// The fully computed target state for one worklog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklogTarget {
    pub description: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
}

impl WorklogTarget {
    /// Builds the target for a row and its synthesized start instant.
    ///
    /// A row without a description defaults to `"Working on issue {key}"`.
    #[must_use]
    pub fn for_row(row: &LedgerRow, start: DateTime<Utc>) -> Self {
        let description = row
            .description
            .clone()
            .unwrap_or_else(|| format!("Working on issue {}", row.issue_key));
        Self {
            description,
            start,
            duration: row.duration,
        }
    }

    /// Whether an existing record already carries exactly this target.
    ///
    /// When true the update degrades to a silent no-op, which is what makes
    /// re-running the same ledger safe.
    #[must_use]
    pub fn matches(&self, existing: &RemoteWorklog) -> bool {
        existing.description.as_deref() == Some(self.description.as_str())
            && existing.start == self.start
            && existing.duration_seconds == self.duration.num_seconds()
    }
}
