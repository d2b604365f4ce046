//! Authenticated request pipeline.
//!
//! Every call goes through two hooks around the network round-trip:
//!
//! * pre-send: refresh proactively when the stored access token is inside
//!   the staleness window, falling back to the stale token if that fails;
//! * post-receive: on a 401, refresh once and replay the request once.

pub mod http;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{
    is_stale, AuthError, AuthService, CredentialStore, FileCredentialStore, LogRedirect,
    LoginRedirect, RefreshCoordinator,
};
use crate::config::ClientConfig;
use crate::error::ClientError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Payload of an [`ApiRequest`]. Owned so the request can be replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Bytes { content_type: String, data: Vec<u8> },
}

/// Immutable, replayable description of a resource call.
///
/// # Example
/// ```
/// use hitos_client::client::ApiRequest;
///
/// let request = ApiRequest::get("/clients").query("page", "2");
/// assert_eq!(request.path(), "/clients");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn bytes(mut self, content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.body = RequestBody::Bytes {
            content_type: content_type.into(),
            data: data.into(),
        };
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

/// A request plus the pipeline's per-call bookkeeping, threaded by value.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: ApiRequest,
    /// Set once the request has been replayed after a reactive refresh.
    pub retried: bool,
    /// Failure of the proactive refresh performed for this call, if that
    /// refresh ended the session.
    pub proactive_failure: Option<AuthError>,
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
            proactive_failure: None,
            request_id: Uuid::new_v4(),
        }
    }

    fn into_retry(self) -> Self {
        Self {
            retried: true,
            ..self
        }
    }

    fn with_proactive_failure(self, error: AuthError) -> Self {
        Self {
            proactive_failure: Some(error),
            ..self
        }
    }
}

/// HTTP client for the hitos backend with transparent credential refresh.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use hitos_client::auth::{LogRedirect, MemoryCredentialStore};
/// use hitos_client::client::ApiClient;
/// use hitos_client::config::ClientConfig;
///
/// # async fn example() -> hitos_client::error::Result<()> {
/// let client = ApiClient::new(
///     ClientConfig::new("http://localhost:8000"),
///     Arc::new(MemoryCredentialStore::new()),
///     Arc::new(LogRedirect),
/// )?;
/// client.auth().login("ana", "secret").await?;
/// let clients: serde_json::Value = client.get_json("/clients").await?;
/// # let _ = clients;
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    coordinator: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ClientError> {
        let http = http::build_client(config.request_timeout)?;
        Ok(Self::with_http_client(config, http, store, redirect))
    }

    pub fn with_http_client(
        config: ClientConfig,
        http: reqwest::Client,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        let coordinator = Arc::new(RefreshCoordinator::new(
            http.clone(),
            config.endpoint("refresh-token"),
            store,
            redirect,
        ));
        Self {
            http,
            config,
            coordinator,
        }
    }

    /// Client configured from the environment, persisting credentials to
    /// the configured file and logging the login redirect.
    pub fn from_env() -> Result<Self, ClientError> {
        let config = ClientConfig::from_env()?;
        let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
        Self::new(config, store, Arc::new(LogRedirect))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Login/logout helper sharing this client's store and HTTP client.
    pub fn auth(&self) -> AuthService {
        AuthService::new(
            &self.config,
            self.http.clone(),
            self.coordinator.store().clone(),
        )
    }

    /// Send a request through both hooks.
    ///
    /// Any status other than 401 is returned as-is. A 401 triggers one
    /// refresh and one replay; a second 401 becomes
    /// [`AuthError::AuthorizationFailure`].
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ClientError> {
        let (context, access_token) = self.pre_send(RequestContext::new(request)).await?;
        let response = self.dispatch(&context, access_token.as_deref()).await?;
        self.post_receive(context, response).await
    }

    async fn pre_send(
        &self,
        context: RequestContext,
    ) -> Result<(RequestContext, Option<String>), ClientError> {
        let Some(credential) = self.coordinator.store().get()? else {
            return Ok((context, None));
        };
        if !is_stale(&credential, self.config.stale_threshold) {
            return Ok((context, Some(credential.access_token)));
        }

        match self.coordinator.refresh().await {
            Ok(fresh) => Ok((context, Some(fresh.access_token))),
            Err(error) => {
                tracing::warn!(
                    request_id = %context.request_id,
                    %error,
                    "proactive refresh failed, sending with current credential"
                );
                let context = if error.is_terminal() {
                    context.with_proactive_failure(error)
                } else {
                    context
                };
                Ok((context, Some(credential.access_token)))
            }
        }
    }

    async fn post_receive(
        &self,
        context: RequestContext,
        response: Response,
    ) -> Result<Response, ClientError> {
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if context.retried {
            let body = http::error_body(response).await;
            return Err(AuthError::AuthorizationFailure(body).into());
        }

        let context = context.into_retry();
        if let Some(error) = context.proactive_failure.clone() {
            // This call already ran a refresh cycle and it ended the session.
            return Err(error.into());
        }

        let credential = self.coordinator.refresh().await?;
        tracing::debug!(
            request_id = %context.request_id,
            path = %context.request.path,
            "replaying request after reactive refresh"
        );
        let replay = self
            .dispatch(&context, Some(&credential.access_token))
            .await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            let body = http::error_body(replay).await;
            return Err(AuthError::AuthorizationFailure(body).into());
        }
        Ok(replay)
    }

    async fn dispatch(
        &self,
        context: &RequestContext,
        access_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let request = &context.request;
        let mut builder = self
            .http
            .request(request.method.clone(), self.config.endpoint(&request.path))
            .headers(request.headers.clone())
            .header(REQUEST_ID_HEADER, context.request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Bytes { content_type, data } => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(data.clone()),
        };
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder.send().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |request, (k, v)| request.query(*k, *v));
        self.send_json(request).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        http::ensure_success(self.send(ApiRequest::delete(path)).await?).await?;
        Ok(())
    }

    /// Upload raw file content; the backend answers with JSON metadata.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        content_type: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<T, ClientError> {
        if HeaderValue::from_str(content_type).is_err() {
            return Err(ClientError::InvalidArgument(format!(
                "invalid content type {content_type:?}"
            )));
        }
        self.send_json(ApiRequest::post(path).bytes(content_type, data))
            .await
    }

    /// Download a file as raw bytes.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let request = ApiRequest::get(path).header(ACCEPT, HeaderValue::from_static("*/*"));
        let response = http::ensure_success(self.send(request).await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = http::ensure_success(self.send(request).await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
