use crate::{Collection, CredentialResolver, Error, Paginate, Result, Session, SessionCache};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use url::Url;

/// The root of the MLHub API.
pub const MLHUB_URL: &str = "https://api.radiant.earth/mlhub/v1/";

/// The default property that holds a page's items.
pub const DEFAULT_ITEMS_FIELD: &str = "features";

/// A blocking client for the MLHub API.
///
/// Relative paths are resolved against the client's base url, and sessions
/// are cached per explicit token in the client's [SessionCache].
///
/// # Examples
///
/// ```no_run
/// use mlhub::Client;
///
/// let client = Client::new();
/// let collection = client.collection("ref_african_crops_uganda_01").unwrap();
/// println!("{}", collection.description());
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    api_token: Option<String>,
    credentials: CredentialResolver,
    sessions: Arc<SessionCache>,
}

/// Extra options for a single request.
///
/// Options are applied after the session's defaults and authentication, so
/// anything set here takes precedence.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters.
    pub query: Vec<(String, String)>,

    /// Headers, replacing any session headers with the same name.
    pub headers: HeaderMap,

    /// A timeout for the whole request.
    pub timeout: Option<Duration>,
}

impl Client {
    /// Creates a client for the MLHub API.
    pub fn new() -> Client {
        Client {
            base_url: Url::parse(MLHUB_URL).expect("MLHUB_URL is a valid url"),
            api_token: None,
            credentials: CredentialResolver::new(),
            sessions: Arc::new(SessionCache::new()),
        }
    }

    /// Sets the base url.
    ///
    /// A trailing slash is added if missing, so relative paths are appended
    /// to the url's path rather than replacing its last segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use mlhub::Client;
    ///
    /// let client = Client::new().with_base_url("http://mlhub.test/v1").unwrap();
    /// assert_eq!(client.url("collections").unwrap().as_str(), "http://mlhub.test/v1/collections");
    /// ```
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Client> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        Ok(self)
    }

    /// Sets the token used when a request doesn't provide one.
    pub fn with_api_token(mut self, api_token: impl ToString) -> Client {
        self.api_token = Some(api_token.to_string());
        self
    }

    /// Sets the resolver used when no explicit token is available.
    pub fn with_credentials(mut self, credentials: CredentialResolver) -> Client {
        self.credentials = credentials;
        self
    }

    /// Uses a shared session cache.
    pub fn with_session_cache(mut self, sessions: Arc<SessionCache>) -> Client {
        self.sessions = sessions;
        self
    }

    /// Returns the base url.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns this client's session cache.
    pub fn session_cache(&self) -> &Arc<SessionCache> {
        &self.sessions
    }

    /// Resolves a path against the base url.
    ///
    /// Absolute urls are returned as-is.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Error::from)
    }

    /// Returns the session for this explicit token, creating it if needed.
    ///
    /// If `api_token` is `None` or empty, the client's token is used. If that's also
    /// `None`, the token is resolved from the environment or a config file
    /// the first time, and the resulting session is reused afterwards.
    pub fn session(&self, api_token: Option<&str>) -> Result<Arc<Session>> {
        let api_token = non_empty(api_token).or(non_empty(self.api_token.as_deref()));
        self.sessions.get_or_try_insert_with(api_token, || {
            let token = self.credentials.resolve(api_token)?;
            Session::new(token)
        })
    }

    /// Makes a GET request and returns the JSON response.
    ///
    /// `path` can be relative to the base url or an absolute url.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mlhub::{Client, RequestOptions};
    ///
    /// let client = Client::new();
    /// let value = client.get("collections", None, RequestOptions::default()).unwrap();
    /// ```
    pub fn get(
        &self,
        path: &str,
        api_token: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value> {
        let url = self.url(path)?;
        let session = self.session(api_token)?;
        tracing::debug!("GET {url}");
        let mut request = session.get(url);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if !options.headers.is_empty() {
            request = request.headers(options.headers);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_else(|err| {
                tracing::debug!("could not read error response body: {err}");
                String::new()
            });
            tracing::debug!("request failed with status={status}");
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        response.json().map_err(Error::from)
    }

    /// Lazily iterates over the items in every page, starting at `link`.
    ///
    /// Items are read from each page's `features` property.
    pub fn paginate(&self, link: impl ToString) -> Paginate<'_> {
        self.paginate_with(link, DEFAULT_ITEMS_FIELD)
    }

    /// Lazily iterates over the items in every page, reading items from
    /// `items_field`.
    pub fn paginate_with(&self, link: impl ToString, items_field: impl ToString) -> Paginate<'_> {
        Paginate::new(self, link.to_string(), items_field.to_string())
    }

    /// Fetches a collection by id.
    pub fn collection(&self, id: &str) -> Result<Collection> {
        let value = self.get(
            &format!("{}/{}", Collection::PATH, id),
            None,
            RequestOptions::default(),
        )?;
        Collection::from_value(value)
    }

    /// Fetches all collections.
    pub fn collections(&self) -> Result<Vec<Collection>> {
        let mut value = self.get(Collection::PATH, None, RequestOptions::default())?;
        match value.get_mut("collections").map(Value::take) {
            Some(Value::Array(collections)) => {
                collections.into_iter().map(Collection::from_value).collect()
            }
            Some(_) => Err(Error::Parse(
                "collections field is not an array".to_string(),
            )),
            None => Err(Error::Parse("no collections field".to_string())),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestOptions {
    /// Adds a query parameter.
    pub fn query(mut self, key: impl ToString, value: impl ToString) -> RequestOptions {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Sets a timeout.
    pub fn timeout(mut self, timeout: Duration) -> RequestOptions {
        self.timeout = Some(timeout);
        self
    }
}

fn non_empty(token: Option<&str>) -> Option<&str> {
    token.filter(|token| !token.is_empty())
}
