//! Mutation applier: walks a reconciliation plan and executes it.
//!
//! Mutations run strictly sequentially, creations and updates first in the
//! plan's date-sorted order, then deletions. Nothing is parallelized: the
//! scheduler's per-date cursor must observe assignments in order, and the
//! remote ledger should never see out-of-order writes. A transport failure
//! aborts on the spot; already-applied mutations stay in place, and
//! re-running the same ledger no-ops whatever already matches.

use chrono::{Duration, NaiveDate, TimeZone};

use wls_core::{
    IdentityMap, IssueKey, ReconcilePlan, RemoteWorklog, Scheduler, WorklogTarget,
    format_duration,
};

use crate::client::{Client, RemoteError};

/// Counts of what one apply pass actually did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Updates that degraded to no-ops because the remote record already
    /// carried the computed target.
    pub unchanged: usize,
}

impl ApplyReport {
    #[must_use]
    pub const fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Applies the plan against the remote service, reporting each mutation.
pub async fn apply_plan<Tz: TimeZone>(
    client: &Client,
    plan: ReconcilePlan,
    identities: &IdentityMap,
    tz: &Tz,
) -> Result<ApplyReport, RemoteError> {
    let mut scheduler = Scheduler::new(tz.clone());
    let mut report = ApplyReport::default();

    for upsert in plan.upserts {
        let row = upsert.row;
        let start = scheduler.assign(row.date, row.duration);
        let target = WorklogTarget::for_row(&row, start);

        match upsert.existing {
            None => {
                client.create_worklog(&row.issue_key, &target).await?;
                println!("{}", render_create(&row.issue_key, row.date, row.duration));
                report.created += 1;
            }
            Some(existing) if target.matches(&existing) => {
                tracing::debug!(worklog_id = %existing.id, key = %row.issue_key,
                    "worklog already up to date");
                report.unchanged += 1;
            }
            Some(existing) => {
                client.update_worklog(&existing, &target).await?;
                println!(
                    "{}",
                    render_update(
                        &row.issue_key,
                        row.date,
                        Duration::seconds(existing.duration_seconds),
                        row.duration,
                    )
                );
                report.updated += 1;
            }
        }
    }

    for existing in plan.deletions {
        client.delete_worklog(&existing.id).await?;
        println!("{}", render_delete(&existing, identities, tz));
        report.deleted += 1;
    }

    Ok(report)
}

/// Deletes every remote worklog on the given dates, ledger-free.
pub async fn clear_dates<Tz: TimeZone>(
    client: &Client,
    dates: &std::collections::BTreeSet<NaiveDate>,
    tz: &Tz,
) -> Result<ApplyReport, RemoteError> {
    let worklogs = client.list_worklogs(dates, tz).await?;
    let mut report = ApplyReport::default();
    for existing in worklogs {
        client.delete_worklog(&existing.id).await?;
        println!("{}", render_delete(&existing, &IdentityMap::default(), tz));
        report.deleted += 1;
    }
    Ok(report)
}

fn render_create(key: &IssueKey, date: NaiveDate, duration: Duration) -> String {
    format!("created {key} {date} {}", format_duration(duration))
}

fn render_update(key: &IssueKey, date: NaiveDate, old: Duration, new: Duration) -> String {
    format!(
        "updated {key} {date} {} -> {}",
        format_duration(old),
        format_duration(new)
    )
}

fn render_delete<Tz: TimeZone>(
    existing: &RemoteWorklog,
    identities: &IdentityMap,
    tz: &Tz,
) -> String {
    let date = existing.start.with_timezone(tz).date_naive();
    let duration = format_duration(Duration::seconds(existing.duration_seconds));
    match identities.key_for(existing.issue_id) {
        Some(key) => format!("deleted {key} {date} {duration}"),
        None => format!("deleted issue #{} {date} {duration}", existing.issue_id),
    }
}
