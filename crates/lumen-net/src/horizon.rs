//! Horizon REST client.
//!
//! Endpoints used:
//! - `GET  /accounts/{id}`
//! - `GET  /accounts/{id}/operations?order={order}&limit={limit}`
//! - `POST /transactions` with the envelope in the `tx` form field

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use lumen_core::crypto::PublicKey;
use lumen_core::error::LedgerError;
use lumen_core::records::{AccountRecord, OperationRecord, Order, SubmitResponse};
use lumen_core::traits::LedgerApi;

use crate::REQUEST_TIMEOUT;

pub struct HorizonClient {
    client: Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<T, LedgerError> {
        debug!(%url, "horizon GET");
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        decode(resp, resource).await
    }
}

#[async_trait]
impl LedgerApi for HorizonClient {
    async fn load_account(&self, account: &PublicKey) -> Result<AccountRecord, LedgerError> {
        let id = account.account_id();
        let url = format!("{}/accounts/{id}", self.base_url);
        self.get_json(&url, &[], &id).await
    }

    async fn operations_for_account(
        &self,
        account: &PublicKey,
        limit: u32,
        order: Order,
    ) -> Result<Vec<OperationRecord>, LedgerError> {
        let id = account.account_id();
        let url = format!("{}/accounts/{id}/operations", self.base_url);
        let query = [
            ("order", order.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let page: Page<OperationRecord> = self.get_json(&url, &query, &id).await?;
        Ok(page.embedded.records)
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResponse, LedgerError> {
        let url = format!("{}/transactions", self.base_url);
        debug!(%url, "horizon submit");
        let resp = self
            .client
            .post(&url)
            .form(&[("tx", envelope_xdr)])
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "transaction").await
    }
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

/// Horizon problem document (RFC 7807).
#[derive(Deserialize, Default)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Deserialize)]
struct ResultCodes {
    transaction: String,
    #[serde(default)]
    operations: Vec<String>,
}

fn transport(e: reqwest::Error) -> LedgerError {
    LedgerError::Transport(e.to_string())
}

async fn decode<T: DeserializeOwned>(resp: Response, resource: &str) -> Result<T, LedgerError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;
    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| LedgerError::InvalidResponse(e.to_string()));
    }
    let err = error_from_response(status, &body, resource);
    warn!(status = status.as_u16(), "horizon error: {err}");
    Err(err)
}

/// Map a non-success Horizon response to a [`LedgerError`].
fn error_from_response(status: StatusCode, body: &str, resource: &str) -> LedgerError {
    if status == StatusCode::NOT_FOUND {
        return LedgerError::NotFound(resource.to_string());
    }
    let problem: Problem = serde_json::from_str(body).unwrap_or_default();
    if let Some(codes) = problem.extras.and_then(|x| x.result_codes) {
        return LedgerError::Rejected {
            transaction: codes.transaction,
            operations: codes.operations,
        };
    }
    let message = problem
        .detail
        .or(problem.title)
        .unwrap_or_else(|| body.chars().take(200).collect());
    LedgerError::Http {
        status: status.as_u16(),
        message,
    }
}
