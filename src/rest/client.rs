//! HTTP plumbing shared by every endpoint group.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::cache::CacheKey;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::SessionContext;

/// REST client for the game server.
///
/// Every request carries the session's bearer token when one is present.
/// A 401 response clears the session through
/// [`SessionContext::handle_unauthorized`] before the error is returned.
/// Requests are never retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    session: Arc<SessionContext>,
}

impl ApiClient {
    /// Creates a client for the configured API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<SessionContext>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: directory_url(&config.api_base_url),
            http: builder.build()?,
            session,
        })
    }

    /// Returns the API base URL, normalized with a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Fetches the raw body behind a cached view.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error from the GET.
    pub async fn fetch_query(&self, key: CacheKey) -> Result<serde_json::Value, ClientError> {
        self.get(&key.kind.path(key.game_id)).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        decode(response).await
    }

    /// GET with an explicit token, for the login handshake before the
    /// session holds one.
    pub(crate) async fn get_with_token<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let response = self.send(self.http.get(url).bearer_auth(token)).await?;
        decode(response).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::POST, path)?.json(body)).await?;
        decode(response).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::POST, path)?).await?;
        decode(response).await
    }

    /// POST whose response body is not meaningful (`"Success"`, plain text).
    pub(crate) async fn post_unit<B>(&self, path: &str, body: Option<&B>) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(Method::POST, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await.map(drop)
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::PUT, path)?.json(body)).await?;
        decode(response).await
    }

    pub(crate) async fn put_unit<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path)?.json(body))
            .await
            .map(drop)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, path)?).await.map(drop)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_status(status.as_u16(), &body);
        if err.is_unauthorized() {
            self.session.handle_unauthorized();
        }
        tracing::debug!(%url, status = status.as_u16(), error = %err, "request failed");
        Err(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Ensures the URL path ends with `/` so relative joins append instead of
/// replacing the last segment.
fn directory_url(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
