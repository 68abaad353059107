//! Import command: reconcile a ledger against the remote service.
//!
//! Pipeline: load and validate the ledger, then resolve work-item keys and
//! fetch the remote snapshot as two concurrent requests, then reconcile,
//! schedule, and apply. Ledger validation happens strictly before any
//! network access.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use wls_core::{LedgerRow, load_ledger, reconcile};
use wls_remote::{ApplyReport, Client, apply_plan};

use crate::config::Config;

pub fn run(config: &Config, file: Option<&Path>) -> Result<ApplyReport> {
    let rows = read_ledger(file)?;
    if rows.is_empty() {
        println!("ledger contains no rows, nothing to do");
        return Ok(ApplyReport::default());
    }
    tracing::debug!(rows = rows.len(), "ledger loaded");

    let settings = config.remote()?;
    let client = Client::new(settings.base_url, settings.account_id, settings.api_token)
        .context("failed to construct remote client")?;

    let keys: BTreeSet<_> = rows.iter().map(|row| row.issue_key.clone()).collect();
    let dates: BTreeSet<_> = rows.iter().map(|row| row.date).collect();

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let report = runtime.block_on(async {
        // The two reads are independent; run them as concurrent requests.
        let (identities, worklogs) = tokio::join!(
            client.resolve_issues(&keys),
            client.list_worklogs(&dates, &Local),
        );
        let identities = identities.context("failed to resolve work-item keys")?;
        let worklogs = worklogs.context("failed to fetch remote worklogs")?;
        tracing::debug!(
            resolved = identities.len(),
            remote = worklogs.len(),
            "remote state fetched"
        );

        let plan = reconcile(rows, &identities, worklogs, &Local);
        apply_plan(&client, plan, &identities, &Local)
            .await
            .context("failed to apply mutations")
    })?;

    println!(
        "{} created, {} updated, {} deleted, {} unchanged",
        report.created, report.updated, report.deleted, report.unchanged
    );
    Ok(report)
}

fn read_ledger(file: Option<&Path>) -> Result<Vec<LedgerRow>> {
    match file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            load_ledger(BufReader::new(file))
                .with_context(|| format!("invalid ledger {}", path.display()))
        }
        None => {
            let stdin = io::stdin();
            load_ledger(stdin.lock()).context("invalid ledger on stdin")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn read_ledger_reports_file_name_on_invalid_input() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,Time,IssueKey").unwrap();
        writeln!(file, "bad-date,1h,PRJ-1").unwrap();
        file.flush().unwrap();

        let err = read_ledger(Some(file.path())).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("invalid ledger"));
        assert!(chain.contains("unparseable date"));
    }

    #[test]
    fn read_ledger_loads_a_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,Time,IssueKey,Description").unwrap();
        writeln!(file, "2023-10-01,2h13m,PRJ-1234,code review").unwrap();
        file.flush().unwrap();

        let rows = read_ledger(Some(file.path())).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].issue_key.as_str(), "PRJ-1234");
    }
}
