//! HTTP client for the backend's row API.
//!
//! Thin wrapper over the hosted backend's PostgREST-style interface:
//! filters, ordering, and pagination are query parameters; inserts and
//! updates return representations. Status codes and backend error codes
//! are mapped to the [`DataError`] taxonomy here and nowhere else.

use crate::auth::AuthClient;
use crate::config::BackendConfig;
use crate::error::{DataError, DataResult};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Where this client sources its bearer token from.
enum TokenSource {
    /// Browser-style client: the current user's session token when
    /// signed in, the anon key otherwise.
    Session(Arc<AuthClient>),
    /// Request-scoped server-side client with a fixed service token.
    Service(String),
}

/// Client for the backend row API.
pub struct ApiClient {
    client: Client,
    config: BackendConfig,
    tokens: TokenSource,
}

impl ApiClient {
    /// Creates the browser-side variant, which attaches the signed-in
    /// user's token to every request.
    pub fn new_browser(config: BackendConfig, auth: Arc<AuthClient>) -> DataResult<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
            tokens: TokenSource::Session(auth),
        })
    }

    /// Creates the server-side variant with a fixed service token.
    pub fn new_service(config: BackendConfig, service_key: String) -> DataResult<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
            tokens: TokenSource::Service(service_key),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Auth client backing this API client, if it is the browser variant.
    pub fn auth(&self) -> Option<&Arc<AuthClient>> {
        match &self.tokens {
            TokenSource::Session(auth) => Some(auth),
            TokenSource::Service(_) => None,
        }
    }

    async fn bearer_token(&self) -> String {
        match &self.tokens {
            TokenSource::Session(auth) => auth
                .access_token()
                .await
                .unwrap_or_else(|| self.config.anon_key.clone()),
            TokenSource::Service(key) => key.clone(),
        }
    }

    async fn request(
        &self,
        method: Method,
        table: &str,
        query: &TableQuery,
        body: Option<serde_json::Value>,
        prefer: Option<&str>,
    ) -> DataResult<Response> {
        let url = format!("{}/rest/v1/{table}", self.config.base_url);
        let token = self.bearer_token().await;

        let mut req = self
            .client
            .request(method.clone(), &url)
            .query(&query.params)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token);

        if let Some(prefer) = prefer {
            req = req.header("Prefer", prefer);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await?;
        debug!("{method} {table}: {}", resp.status());
        Ok(resp)
    }

    /// Fetches a list of rows.
    pub async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: TableQuery,
    ) -> DataResult<Vec<T>> {
        let resp = self.request(Method::GET, table, &query, None, None).await?;
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Fetches a list of rows together with the exact total count,
    /// parsed from the `Content-Range` response header.
    pub async fn get_rows_counted<T: DeserializeOwned>(
        &self,
        table: &str,
        query: TableQuery,
    ) -> DataResult<(Vec<T>, Option<u64>)> {
        let resp = self
            .request(Method::GET, table, &query, None, Some("count=exact"))
            .await?;
        let resp = check(resp).await?;
        let count = parse_content_range(resp.headers());
        let rows = resp.json().await?;
        Ok((rows, count))
    }

    /// Fetches exactly one row; zero matches is a [`DataError::NotFound`].
    pub async fn get_row<T: DeserializeOwned>(
        &self,
        table: &str,
        query: TableQuery,
    ) -> DataResult<T> {
        let mut rows: Vec<T> = self.get_rows(table, query.limit(1)).await?;
        match rows.pop() {
            Some(row) => Ok(row),
            None => Err(DataError::NotFound(format!("no matching row in {table}"))),
        }
    }

    /// Inserts a row and returns the stored representation.
    pub async fn insert_row<T: DeserializeOwned>(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> DataResult<T> {
        let resp = self
            .request(
                Method::POST,
                table,
                &TableQuery::new(),
                Some(serde_json::to_value(body)?),
                Some("return=representation"),
            )
            .await?;
        let resp = check(resp).await?;
        let mut rows: Vec<T> = resp.json().await?;
        rows.pop()
            .ok_or_else(|| DataError::Api(format!("insert into {table} returned no rows")))
    }

    /// Updates matching rows and returns the first updated representation.
    pub async fn update_row<T: DeserializeOwned>(
        &self,
        table: &str,
        query: TableQuery,
        body: &impl Serialize,
    ) -> DataResult<T> {
        let resp = self
            .request(
                Method::PATCH,
                table,
                &query,
                Some(serde_json::to_value(body)?),
                Some("return=representation"),
            )
            .await?;
        let resp = check(resp).await?;
        let mut rows: Vec<T> = resp.json().await?;
        rows.pop()
            .ok_or_else(|| DataError::NotFound(format!("no matching row in {table}")))
    }

    /// Updates matching rows without requesting a representation.
    pub async fn update_rows(
        &self,
        table: &str,
        query: TableQuery,
        body: &impl Serialize,
    ) -> DataResult<()> {
        let resp = self
            .request(
                Method::PATCH,
                table,
                &query,
                Some(serde_json::to_value(body)?),
                None,
            )
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Deletes matching rows.
    pub async fn delete_rows(&self, table: &str, query: TableQuery) -> DataResult<()> {
        let resp = self
            .request(Method::DELETE, table, &query, None, None)
            .await?;
        check(resp).await?;
        Ok(())
    }
}

fn build_http_client(config: &BackendConfig) -> DataResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))
}

/// Query-string builder for row operations.
///
/// Parameters are emitted in call order, so the same sequence of calls
/// always produces the same request.
#[derive(Clone, Debug, Default)]
pub struct TableQuery {
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    /// Equality filter.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params
            .push((column.into(), format!("eq.{}", value.to_string())));
        self
    }

    /// Case-insensitive substring match.
    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.params
            .push((column.into(), format!("ilike.*{needle}*")));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.params.push((column.into(), "is.null".into()));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.params.push((column.into(), "not.is.null".into()));
        self
    }

    pub fn in_list<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.into(), format!("in.({joined})")));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.params.push(("order".into(), format!("{column}.{dir}")));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.params.push(("limit".into(), limit.to_string()));
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.params.push(("offset".into(), offset.to_string()));
        self
    }
}

/// Error payload shape returned by the backend.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Maps a non-success response to the error taxonomy.
async fn check(resp: Response) -> DataResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body: ApiErrorBody = resp.json().await.unwrap_or(ApiErrorBody {
        code: None,
        message: None,
    });
    let message = body.message.unwrap_or_else(|| status.to_string());
    let code = body.code.as_deref().unwrap_or("");

    Err(match (status, code) {
        (StatusCode::UNAUTHORIZED, _) => DataError::Unauthenticated,
        // 42501: insufficient privilege — how row-level security denials
        // surface from the backend.
        (StatusCode::FORBIDDEN, _) | (_, "42501") => DataError::PermissionDenied(message),
        (StatusCode::NOT_FOUND, _) | (_, "PGRST116") => DataError::NotFound(message),
        // 23505: unique violation. The only client-writable unique
        // columns are slugs.
        (_, "23505") | (StatusCode::CONFLICT, _) => DataError::DuplicateSlug(message),
        (s, c) if s.is_client_error() && !c.is_empty() => DataError::ValidationFailed(message),
        _ => DataError::Api(format!("{status}: {message}")),
    })
}

fn parse_content_range(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(|range| range.rsplit('/').next())
        .and_then(|total| total.parse().ok())
}
