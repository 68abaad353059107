//! Batch work-item key resolution.

use std::collections::BTreeSet;

use serde::Deserialize;

use wls_core::{IdentityMap, IssueKey};

use crate::client::{Client, PAGE_LIMIT, RemoteError, ensure_within_page_limit};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total: usize,
    issues: Vec<IssueRef>,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    id: String,
    key: String,
}

impl Client {
    /// Resolves a set of distinct work-item keys to their remote numeric
    /// identifiers in a single round trip.
    ///
    /// Keys the service does not know are simply absent from the returned
    /// mapping; a match count beyond the page limit is a fatal
    /// [`RemoteError::TooManyResults`].
    pub async fn resolve_issues(
        &self,
        keys: &BTreeSet<IssueKey>,
    ) -> Result<IdentityMap, RemoteError> {
        if keys.is_empty() {
            return Ok(IdentityMap::default());
        }

        let joined = keys
            .iter()
            .map(IssueKey::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let jql = format!("issuekey in ({joined})");
        let limit = PAGE_LIMIT.to_string();
        tracing::debug!(count = keys.len(), "resolving work-item keys");

        let response = self
            .http
            .get(self.url("/rest/api/2/search"))
            .bearer_auth(&self.api_token)
            .query(&[
                ("jql", jql.as_str()),
                ("fields", "id,key"),
                ("maxResults", limit.as_str()),
                ("validateQuery", "false"),
            ])
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let payload: SearchResponse = serde_json::from_str(&body)
            .map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
        ensure_within_page_limit(payload.total)?;

        let mut pairs = Vec::with_capacity(payload.issues.len());
        for issue in payload.issues {
            let numeric_id: i64 = issue.id.parse().map_err(|_| {
                RemoteError::InvalidResponse(format!(
                    "non-numeric issue id {:?} for key {}",
                    issue.id, issue.key
                ))
            })?;
            let key = IssueKey::new(issue.key)
                .map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
            pairs.push((key, numeric_id));
        }
        Ok(IdentityMap::from_pairs(pairs))
    }
}
