//! HTTP client for the settlement/catalog service.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use comanda_core::types::{HistoryFilter, OrderDetail, PaymentRecord, PaymentRequest};

use crate::error::{ClientError, ClientResult};
use crate::SettlementApi;

/// Configuration for the settlement client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service, no trailing slash required.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// HTTP client for the settlement service.
#[derive(Debug, Clone)]
pub struct SettlementClient {
    client: Client,
    base_url: String,
}

/// The history endpoint answers either a bare array or `{ "rows": [...] }`
/// depending on the service version; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    List(Vec<PaymentRecord>),
    Rows { rows: Vec<PaymentRecord> },
}

/// Error envelope the service uses for failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl SettlementClient {
    /// Creates a new client from configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(SettlementClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Make a GET request.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::handle_response(response).await
    }

    /// Maps the HTTP response to a deserialized result.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::error_from(status, &text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Maps a response where only the status matters (commit
    /// acknowledgements may carry an empty body).
    async fn ack_response(response: reqwest::Response) -> ClientResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(Self::error_from(status, &text))
    }

    /// Failed requests carry `{ "error": "<message>" }`; that message is
    /// what the station shows the user verbatim.
    fn error_from(status: StatusCode, body: &str) -> ClientError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| format!("service error ({})", status.as_u16()));

        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Builds the history query parameters, omitting unset filters.
    fn history_query(filter: &HistoryFilter) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(from) = filter.from {
            query.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.to {
            query.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(table) = filter.table {
            query.push(("table", table.to_string()));
        }
        if let Some(method) = filter.method {
            query.push(("method", method.as_str().to_string()));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

impl SettlementApi for SettlementClient {
    /// Fetches the order currently open at a table.
    ///
    /// The service answers `null` when the table has no open order;
    /// that is a regular result, not an error.
    async fn order_for_table(&self, table: u32) -> ClientResult<Option<OrderDetail>> {
        debug!(table, "fetching order detail");
        self.get(&format!("api/cashier/tables/{table}/order"), &[])
            .await
    }

    /// Submits a payment commit.
    async fn submit_payment(&self, request: &PaymentRequest) -> ClientResult<()> {
        debug!(
            order_id = %request.order_id,
            table = request.table_number,
            amount = %request.amount_paid,
            method = %request.method,
            "submitting payment"
        );
        // The acknowledgement body carries nothing we use
        let response = self
            .client
            .post(self.url("api/cashier/payments"))
            .json(request)
            .send()
            .await?;
        Self::ack_response(response).await
    }

    /// Fetches settled payments with optional filters.
    async fn payment_history(&self, filter: &HistoryFilter) -> ClientResult<Vec<PaymentRecord>> {
        let query = Self::history_query(filter);
        debug!(filters = query.len(), "fetching payment history");
        let response: HistoryResponse = self.get("api/cashier/payments", &query).await?;
        Ok(match response {
            HistoryResponse::List(records) => records,
            HistoryResponse::Rows { rows } => rows,
        })
    }
}
