//! Clear command: delete every remote worklog on explicit dates.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use wls_remote::{ApplyReport, Client, clear_dates};

use crate::config::Config;

pub fn run(config: &Config, dates: &[NaiveDate]) -> Result<ApplyReport> {
    let settings = config.remote()?;
    let client = Client::new(settings.base_url, settings.account_id, settings.api_token)
        .context("failed to construct remote client")?;

    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    tracing::debug!(dates = distinct.len(), "clearing remote worklogs");

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let report = runtime
        .block_on(clear_dates(&client, &distinct, &Local))
        .context("failed to clear worklogs")?;

    println!("{} deleted", report.deleted);
    Ok(report)
}
