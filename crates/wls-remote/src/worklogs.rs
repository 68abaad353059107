//! Worklog reading and mutation calls.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use wls_core::{IssueKey, RemoteWorklog, WorklogTarget};

use crate::client::{Client, PAGE_LIMIT, RemoteError, ensure_within_page_limit};

/// Wire format for start instants: millisecond-precision UTC with an
/// explicit `+0000` offset marker (`2023-10-01T08:00:00.000+0000`).
mod wire_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&text, FORMAT)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorklogPage {
    total: usize,
    results: Vec<WorklogDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorklogDto {
    id: String,
    issue_id: i64,
    #[serde(with = "wire_time")]
    start_date_time: DateTime<Utc>,
    duration_seconds: i64,
    #[serde(default)]
    description: Option<String>,
    author_id: String,
}

impl From<WorklogDto> for RemoteWorklog {
    fn from(dto: WorklogDto) -> Self {
        Self {
            id: dto.id,
            issue_id: dto.issue_id,
            start: dto.start_date_time,
            duration_seconds: dto.duration_seconds,
            description: dto.description,
            author_id: dto.author_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorklog<'a> {
    issue_key: &'a str,
    #[serde(with = "wire_time")]
    start_date_time: DateTime<Utc>,
    duration_seconds: i64,
    description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWorklog<'a> {
    #[serde(with = "wire_time")]
    start_date_time: DateTime<Utc>,
    duration_seconds: i64,
    description: &'a str,
    author_id: &'a str,
}

impl Client {
    /// Fetches every remote worklog whose start falls on one of the given
    /// calendar dates, interpreted in `tz`.
    ///
    /// Dates are deduplicated by the caller's `BTreeSet`; one round trip per
    /// distinct date. Results are filtered precisely to local
    /// midnight-to-midnight, and a page reporting more than the fixed page
    /// size is a fatal error rather than a truncated result.
    pub async fn list_worklogs<Tz: TimeZone>(
        &self,
        dates: &BTreeSet<NaiveDate>,
        tz: &Tz,
    ) -> Result<Vec<RemoteWorklog>, RemoteError> {
        let limit = PAGE_LIMIT.to_string();
        let mut worklogs = Vec::new();
        for &date in dates {
            let date_text = date.to_string();
            tracing::debug!(date = %date_text, "fetching remote worklogs");
            let response = self
                .http
                .get(self.url("/rest/worklogs"))
                .bearer_auth(&self.api_token)
                .query(&[
                    ("user", self.account_id.as_str()),
                    ("from", date_text.as_str()),
                    ("to", date_text.as_str()),
                    ("limit", limit.as_str()),
                ])
                .send()
                .await?;
            let body = Self::read_body(response).await?;

            let page: WorklogPage = serde_json::from_str(&body)
                .map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
            ensure_within_page_limit(page.total)?;

            worklogs.extend(
                page.results
                    .into_iter()
                    .map(RemoteWorklog::from)
                    .filter(|worklog| worklog.start.with_timezone(tz).date_naive() == date),
            );
        }
        Ok(worklogs)
    }

    /// Creates a new worklog for the given work item.
    pub async fn create_worklog(
        &self,
        issue_key: &IssueKey,
        target: &WorklogTarget,
    ) -> Result<(), RemoteError> {
        let payload = CreateWorklog {
            issue_key: issue_key.as_str(),
            start_date_time: target.start,
            duration_seconds: target.duration.num_seconds(),
            description: &target.description,
        };
        let response = self
            .http
            .post(self.url("/rest/worklogs"))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }

    /// Rewrites an existing worklog to the computed target, preserving the
    /// record's original author identity.
    pub async fn update_worklog(
        &self,
        existing: &RemoteWorklog,
        target: &WorklogTarget,
    ) -> Result<(), RemoteError> {
        let payload = UpdateWorklog {
            start_date_time: target.start,
            duration_seconds: target.duration.num_seconds(),
            description: &target.description,
            author_id: &existing.author_id,
        };
        let response = self
            .http
            .put(self.url(&format!("/rest/worklogs/{}", existing.id)))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }

    /// Deletes an existing worklog.
    pub async fn delete_worklog(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(self.url(&format!("/rest/worklogs/{id}")))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    #[test]
    fn worklog_page_decodes_wire_format() {
        let body = r#"{
            "total": 1,
            "results": [{
                "id": "w-42",
                "issueId": 10001,
                "startDateTime": "2023-10-01T08:00:00.000+0000",
                "durationSeconds": 7980,
                "description": "code review",
                "authorId": "acct-1"
            }]
        }"#;
        let page: WorklogPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total, 1);
        let worklog = RemoteWorklog::from(
            page.results.into_iter().next().unwrap(),
        );
        assert_eq!(worklog.id, "w-42");
        assert_eq!(worklog.issue_id, 10_001);
        assert_eq!(worklog.start.to_rfc3339(), "2023-10-01T08:00:00+00:00");
        assert_eq!(worklog.duration_seconds, 7980);
        assert_eq!(worklog.author_id, "acct-1");
    }

    #[test]
    fn worklog_missing_description_decodes_to_none() {
        let body = r#"{
            "id": "w-1",
            "issueId": 1,
            "startDateTime": "2023-10-01T08:00:00.000+0000",
            "durationSeconds": 60,
            "authorId": "acct-1"
        }"#;
        let dto: WorklogDto = serde_json::from_str(body).unwrap();
        assert_eq!(dto.description, None);
    }

    #[test]
    fn start_instants_serialize_with_explicit_zero_offset() {
        let target = WorklogTarget {
            description: "code review".to_string(),
            start: "2023-10-01T08:00:00Z".parse().unwrap(),
            duration: Duration::minutes(133),
        };
        let payload = CreateWorklog {
            issue_key: "PRJ-1234",
            start_date_time: target.start,
            duration_seconds: target.duration.num_seconds(),
            description: &target.description,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["startDateTime"], "2023-10-01T08:00:00.000+0000");
        assert_eq!(json["issueKey"], "PRJ-1234");
        assert_eq!(json["durationSeconds"], 7980);
    }

    #[test]
    fn update_payload_carries_the_original_author() {
        let existing = RemoteWorklog {
            id: "w-1".to_string(),
            issue_id: 10_001,
            start: "2023-10-01T08:00:00Z".parse().unwrap(),
            duration_seconds: 3600,
            description: None,
            author_id: "someone-else".to_string(),
        };
        let target = WorklogTarget {
            description: "updated".to_string(),
            start: existing.start,
            duration: Duration::hours(2),
        };
        let payload = UpdateWorklog {
            start_date_time: target.start,
            duration_seconds: target.duration.num_seconds(),
            description: &target.description,
            author_id: &existing.author_id,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["authorId"], "someone-else");
    }
}
