//! HTTP client for the account endpoints.
//!
//! Implements both remote ports: the reconciliation lookup (infallible by
//! contract, every failure collapses into `LookupFailed`) and the
//! idempotent result upsert, keyed by account reference in the URL.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sm_core::account::{AccountLookup, AccountRef};
use sm_core::ports::{AccountLookupPort, ResultSyncPort};
use sm_core::quiz::QuizResult;

#[derive(Debug, Clone)]
pub struct AccountApiConfig {
    /// Base URL of the account service, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout; also bounds the reconciliation lookup.
    pub timeout: Duration,
}

impl AccountApiConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

pub struct HttpAccountClient {
    http: reqwest::Client,
    config: AccountApiConfig,
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    found: bool,
    #[serde(default)]
    account_ref: Option<String>,
}

#[derive(Serialize)]
struct UpsertResultRequest<'a> {
    classification: &'a str,
    score: u8,
}

impl HttpAccountClient {
    pub fn new(config: AccountApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn lookup_url(&self) -> String {
        format!("{}/v1/accounts/lookup", self.config.base_url)
    }

    fn upsert_url(&self, account: &AccountRef) -> String {
        format!(
            "{}/v1/accounts/{}/quiz-result",
            self.config.base_url,
            account.as_str()
        )
    }

    async fn try_lookup(&self, email: &str) -> anyhow::Result<AccountLookup> {
        let response: LookupResponse = self
            .http
            .post(self.lookup_url())
            .json(&LookupRequest { email })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.found {
            return Ok(AccountLookup::NotFound);
        }
        match response.account_ref {
            Some(account_ref) => Ok(AccountLookup::Found(AccountRef::new(account_ref))),
            None => anyhow::bail!("lookup reported found without an account_ref"),
        }
    }
}

#[async_trait]
impl AccountLookupPort for HttpAccountClient {
    async fn lookup(&self, email: &str) -> AccountLookup {
        match self.try_lookup(email).await {
            Ok(outcome) => outcome,
            Err(err) => AccountLookup::LookupFailed(err.to_string()),
        }
    }
}

#[async_trait]
impl ResultSyncPort for HttpAccountClient {
    async fn upsert_result(
        &self,
        account: &AccountRef,
        result: &QuizResult,
    ) -> anyhow::Result<()> {
        let url = self.upsert_url(account);
        debug!(account = %account, "uploading quiz result");
        self.http
            .put(&url)
            .json(&UpsertResultRequest {
                classification: result.classification.as_str(),
                score: result.score,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_core::quiz::Classification;

    fn client() -> HttpAccountClient {
        HttpAccountClient::new(AccountApiConfig::new(
            "https://api.example.com/",
            Duration::from_secs(5),
        ))
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = client();
        assert_eq!(
            client.lookup_url(),
            "https://api.example.com/v1/accounts/lookup"
        );
    }

    #[test]
    fn upsert_url_is_keyed_by_account_ref() {
        let client = client();
        assert_eq!(
            client.upsert_url(&AccountRef::new("acct_42")),
            "https://api.example.com/v1/accounts/acct_42/quiz-result"
        );
    }

    #[test]
    fn upsert_body_uses_wire_names() {
        let body = UpsertResultRequest {
            classification: Classification::Ruminator.as_str(),
            score: 71,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"classification": "ruminator", "score": 71})
        );
    }

    #[test]
    fn lookup_response_tolerates_missing_account_ref() {
        let response: LookupResponse = serde_json::from_str(r#"{"found": false}"#).unwrap();
        assert!(!response.found);
        assert!(response.account_ref.is_none());
    }
}
