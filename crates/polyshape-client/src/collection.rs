use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use futures::future::join_all;
use polyshape_core::abort::AbortSignal;
use polyshape_core::actions::CollectionApi;
use polyshape_core::config::HttpConfig;
use polyshape_core::error::AppError;
use polyshape_core::models::{parse_list, Collection, EnrichedItem, ListItem, Projects, Publications};
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// HTTP controller for the publications collection.
pub type PublicationsClient = CollectionClient<Publications>;

/// HTTP controller for the projects collection.
pub type ProjectsClient = CollectionClient<Projects>;

/// HTTP client for one collection of the content API.
///
/// All requests go under `<api_root>/<collection>/`:
///
/// | Operation | Request |
/// |-----------|---------|
/// | list      | `GET /` then `GET <item url>?_=<millis>` per item |
/// | create    | `POST /` with the payload as JSON |
/// | update    | `PUT /<id>` with `{"contents": "<payload JSON>", "contentType": "application/json"}` |
/// | delete    | `DELETE /<id>` |
///
/// Requests are never retried.
///
/// # Examples
///
/// ```no_run
/// use polyshape_client::PublicationsClient;
/// use polyshape_core::actions::CollectionApi;
/// use polyshape_core::config::HttpConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PublicationsClient::new("https://example.com/api", None, &HttpConfig::default())?;
/// let items = client.fetch_list(None).await?;
/// println!("Found {} publications", items.len());
/// # Ok(())
/// # }
/// ```
pub struct CollectionClient<C> {
    client: Client,
    api_root: Url,
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
    _collection: PhantomData<fn() -> C>,
}

impl<C> Clone for CollectionClient<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api_root: self.api_root.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
            _collection: PhantomData,
        }
    }
}

impl<C> fmt::Debug for CollectionClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl<C: Collection> CollectionClient<C> {
    /// Creates a controller for the collection under `api_root`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if `api_root` is not an absolute URL.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(api_root: &str, token: Option<String>, http: &HttpConfig) -> Result<Self, AppError> {
        let api_root = Url::parse(&format!("{}/", api_root.trim().trim_end_matches('/')))
            .map_err(|_| AppError::InvalidUrl(api_root.to_string()))?;
        if api_root.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(api_root.to_string()));
        }
        let base_url = api_root.join(&format!("{}/", C::NAME))?;

        let client = Client::builder()
            .user_agent(concat!("polyshape-admin/", env!("CARGO_PKG_VERSION")))
            .timeout(http.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            api_root,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
            timeout: http.timeout,
            _collection: PhantomData,
        })
    }

    /// Collection root, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of a single record: the id becomes one percent-encoded path segment.
    pub fn item_url(&self, id: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        builder.send().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout.as_secs())
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {}", e))
        } else {
            AppError::ClientError(e.to_string())
        }
    }

    async fn fetch_index(&self) -> Result<Vec<ListItem>, AppError> {
        debug!("GET {}", self.base_url);
        let resp = self
            .send(self.request(Method::GET, self.base_url.clone()))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::from_status(status.as_u16(), None));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::ClientError(e.to_string()))?;
        Ok(parse_list(&body))
    }

    async fn fetch_detail(&self, item_url: &str, stamp: i64) -> Result<C::Detail, AppError> {
        let url = with_cache_buster(self.api_root.join(item_url)?, stamp);

        let resp = self
            .send(
                self.request(Method::GET, url)
                    .header(CACHE_CONTROL, "no-store"),
            )
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::from_status(status.as_u16(), None));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::ClientError(e.to_string()))?;
        C::parse_detail(&body).ok_or(AppError::InvalidDetail)
    }

    async fn enrich(
        &self,
        item: ListItem,
        stamp: i64,
        signal: Option<&AbortSignal>,
    ) -> EnrichedItem<C::Detail> {
        let url = item.url.clone();
        let fetch = self.fetch_detail(&url, stamp);
        let result = match signal {
            Some(signal) => match signal.run(fetch).await {
                Some(result) => result,
                None => return EnrichedItem::bare(item),
            },
            None => fetch.await,
        };

        match result {
            Ok(detail) => EnrichedItem::with_detail(item, detail),
            Err(e) => {
                warn!("Detail {} failed: {}", item.pathname, e);
                EnrichedItem::with_error(item, e.to_string())
            }
        }
    }

    /// Sends a mutation and maps a non-success response to `AppError::Http`.
    async fn mutate(&self, builder: RequestBuilder) -> Result<(), AppError> {
        let resp = self.send(builder).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body: Option<Value> = resp.json().await.ok();
        let err = AppError::from_status(status.as_u16(), body.as_ref().and_then(error_message));
        warn!("{} {} failed: {}", C::NAME, status.as_u16(), err);
        Err(err)
    }
}

impl<C: Collection> CollectionApi<C> for CollectionClient<C> {
    async fn fetch_list(
        &self,
        signal: Option<&AbortSignal>,
    ) -> Result<Vec<EnrichedItem<C::Detail>>, AppError> {
        let items = match signal {
            Some(signal) => signal
                .run(self.fetch_index())
                .await
                .ok_or(AppError::Cancelled)??,
            None => self.fetch_index().await?,
        };
        debug!("{} index lists {} items", C::NAME, items.len());

        let stamp = chrono::Utc::now().timestamp_millis();
        let enriched = join_all(
            items
                .into_iter()
                .map(|item| self.enrich(item, stamp, signal)),
        )
        .await;

        Ok(enriched)
    }

    async fn create(&self, payload: &C::Payload) -> Result<(), AppError> {
        debug!("POST {}", self.base_url);
        self.mutate(self.request(Method::POST, self.base_url.clone()).json(payload))
            .await
    }

    async fn update(&self, id: &str, payload: &C::Payload) -> Result<(), AppError> {
        let url = self.item_url(id)?;
        let body = json!({
            "contents": serde_json::to_string(payload)?,
            "contentType": "application/json",
        });
        debug!("PUT {}", url);
        self.mutate(self.request(Method::PUT, url).json(&body)).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let url = self.item_url(id)?;
        debug!("DELETE {}", url);
        self.mutate(self.request(Method::DELETE, url)).await
    }
}

/// Sets the `_` query parameter to `stamp`, dropping any previous value.
pub fn with_cache_buster(mut url: Url, stamp: i64) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "_")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("_", &stamp.to_string());
    url
}

/// Server-provided failure text: `message`, else `error`.
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "error"].iter().find_map(|key| {
        body.get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PublicationsClient {
        PublicationsClient::new("https://example.com/api", None, &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_new_with_valid_url() {
        let client = client();
        assert_eq!(client.base_url().as_str(), "https://example.com/api/publications/");
    }

    #[test]
    fn test_new_with_trailing_slash() {
        let client =
            ProjectsClient::new("https://example.com/api/", None, &HttpConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://example.com/api/projects/");
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = PublicationsClient::new("not-a-valid-url", None, &HttpConfig::default());
        match result {
            Err(AppError::InvalidUrl(url)) => assert_eq!(url, "not-a-valid-url"),
            other => panic!("Expected AppError::InvalidUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let client = PublicationsClient::new(
            "https://example.com/api",
            Some("  ".to_string()),
            &HttpConfig::default(),
        )
        .unwrap();
        assert!(client.token.is_none());
    }

    #[test]
    fn test_item_url_encodes_single_segment() {
        let client = client();
        assert_eq!(
            client.item_url("test file.json").unwrap().as_str(),
            "https://example.com/api/publications/test%20file.json"
        );
        assert_eq!(
            client.item_url("a/b").unwrap().as_str(),
            "https://example.com/api/publications/a%2Fb"
        );
    }

    #[test]
    fn test_cache_buster_appends_param() {
        let url = Url::parse("https://cdn.example.com/p/a.json").unwrap();
        assert_eq!(
            with_cache_buster(url, 42).as_str(),
            "https://cdn.example.com/p/a.json?_=42"
        );
    }

    #[test]
    fn test_cache_buster_replaces_existing_param() {
        let url = Url::parse("https://cdn.example.com/a.json?v=1&_=7").unwrap();
        assert_eq!(
            with_cache_buster(url, 42).as_str(),
            "https://cdn.example.com/a.json?v=1&_=42"
        );
    }

    #[test]
    fn test_error_message_prefers_message() {
        let body = json!({"message": "Title taken", "error": "conflict"});
        assert_eq!(error_message(&body).as_deref(), Some("Title taken"));
    }

    #[test]
    fn test_error_message_falls_back_to_error() {
        assert_eq!(
            error_message(&json!({"error": "Not allowed"})).as_deref(),
            Some("Not allowed")
        );
        assert_eq!(error_message(&json!({"message": ""})), None);
        assert_eq!(error_message(&json!(["x"])), None);
    }
}
