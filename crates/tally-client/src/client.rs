//! Tally HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use tally_core::MetaMap;

use crate::error::ClientError;
use crate::types::{
    AlterRequest, AlterResponse, ApiErrorResponse, BalanceResponse, CreateTypeResponse,
    DefaultTypeResponse, ListLogsResponse, ListTypesResponse, LogMetaResponse, LogsQuery,
    PointsTypeSettings, RegenerateResponse, TopUsersResponse,
};

/// Tally API client.
///
/// Provides methods for altering balances, querying the transaction log,
/// and managing points types.
#[derive(Debug, Clone)]
pub struct TallyClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl TallyClient {
    /// Create a new tally client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the tally service (e.g., `"http://tally:8080"`)
    /// * `api_key` - Service API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new tally client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        }
    }

    /// Alter a balance by a signed delta.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn alter(&self, request: AlterRequest) -> Result<AlterResponse, ClientError> {
        self.post("/v1/points/alter", &request).await
    }

    /// Credit points to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn add_points(
        &self,
        user_id: u64,
        points_type: impl Into<String>,
        amount: i64,
        kind: impl Into<String>,
        meta: MetaMap,
    ) -> Result<AlterResponse, ClientError> {
        self.post(
            "/v1/points/add",
            &serde_json::json!({
                "user_id": user_id,
                "points_type": points_type.into(),
                "amount": amount,
                "kind": kind.into(),
                "meta": meta,
            }),
        )
        .await
    }

    /// Debit points from a user, clamped at the type's minimum.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn subtract_points(
        &self,
        user_id: u64,
        points_type: impl Into<String>,
        amount: i64,
        kind: impl Into<String>,
        meta: MetaMap,
    ) -> Result<AlterResponse, ClientError> {
        self.post(
            "/v1/points/subtract",
            &serde_json::json!({
                "user_id": user_id,
                "points_type": points_type.into(),
                "amount": amount,
                "kind": kind.into(),
                "meta": meta,
            }),
        )
        .await
    }

    /// Move a balance to a target value.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn set_points(
        &self,
        user_id: u64,
        points_type: impl Into<String>,
        target: i64,
        kind: impl Into<String>,
        meta: MetaMap,
    ) -> Result<AlterResponse, ClientError> {
        self.post(
            "/v1/points/set",
            &serde_json::json!({
                "user_id": user_id,
                "points_type": points_type.into(),
                "target": target,
                "kind": kind.into(),
                "meta": meta,
            }),
        )
        .await
    }

    /// Get a user's balance for a points type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn balance(
        &self,
        user_id: u64,
        points_type: &str,
    ) -> Result<BalanceResponse, ClientError> {
        let url = format!("{}/v1/points/balance", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("user_id", user_id.to_string()),
                ("points_type", points_type.to_string()),
            ])
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Get the top users by balance for a points type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn top_users(
        &self,
        points_type: &str,
        limit: usize,
    ) -> Result<TopUsersResponse, ClientError> {
        let url = format!("{}/v1/points/top", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("points_type", points_type.to_string()),
                ("limit", limit.to_string()),
            ])
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// List transaction log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_logs(&self, query: &LogsQuery) -> Result<ListLogsResponse, ClientError> {
        let url = format!("{}/v1/points/logs", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&query.to_query_pairs())
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Get the meta rows attached to one log entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn log_meta(&self, log_id: u64) -> Result<LogMetaResponse, ClientError> {
        let url = format!("{}/v1/points/logs/{log_id}/meta", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Re-render the text of matching log entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn regenerate_logs(
        &self,
        query: &LogsQuery,
    ) -> Result<RegenerateResponse, ClientError> {
        self.post(
            "/v1/points/regenerate-logs",
            &serde_json::json!({
                "user_id": query.user_id,
                "points_type": query.points_type,
                "kind": query.kind,
            }),
        )
        .await
    }

    /// Remove one user's balance and log entries for a points type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn purge_user(
        &self,
        user_id: u64,
        points_type: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.post(
            "/v1/points/purge",
            &serde_json::json!({
                "user_id": user_id,
                "points_type": points_type,
            }),
        )
        .await
    }

    /// Register a new points type and return its slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_points_type(
        &self,
        settings: &PointsTypeSettings,
    ) -> Result<CreateTypeResponse, ClientError> {
        self.post("/v1/points-types", settings).await
    }

    /// List registered points types.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_points_types(&self) -> Result<ListTypesResponse, ClientError> {
        let url = format!("{}/v1/points-types", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Get one points type's settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_points_type(&self, slug: &str) -> Result<PointsTypeSettings, ClientError> {
        let url = format!("{}/v1/points-types/{slug}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Replace a points type's settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn update_points_type(
        &self,
        slug: &str,
        settings: &PointsTypeSettings,
    ) -> Result<PointsTypeSettings, ClientError> {
        let url = format!("{}/v1/points-types/{slug}", self.base_url);

        let response = self
            .client
            .put(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(settings)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Delete a points type, cascading to its balances and log entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn delete_points_type(&self, slug: &str) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/v1/points-types/{slug}", self.base_url);

        let response = self
            .client
            .delete(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Get the default points type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn default_points_type(&self) -> Result<DefaultTypeResponse, ClientError> {
        let url = format!("{}/v1/points-types/default", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Set or clear the default points type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn set_default_points_type(
        &self,
        slug: Option<&str>,
    ) -> Result<DefaultTypeResponse, ClientError> {
        let url = format!("{}/v1/points-types/default", self.base_url);

        let response = self
            .client
            .put(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&serde_json::json!({ "slug": slug }))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// POST a JSON body and decode the response.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code;
                let message = api_error.error.message;

                match code.as_str() {
                    "bad_request" => Err(ClientError::InvalidArgument(message)),
                    "not_found" => Err(ClientError::NotFound(message)),
                    _ => Err(ClientError::Api {
                        code,
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
