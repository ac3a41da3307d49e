use crate::Result;
use reqwest::{
    blocking::RequestBuilder,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::{Arc, Mutex, PoisonError},
};
use url::Url;

/// An authenticated HTTP session.
///
/// Every request built through a session carries an `accept:
/// application/json` header and an `authorization: Bearer <token>` header.
/// The token can't be changed after construction.
pub struct Session {
    client: reqwest::blocking::Client,
    token: String,
}

/// Caches [Session]s by the explicit token they were requested with.
///
/// The "no explicit token" case is its own key, so the environment or config
/// file is only consulted once per cache. Share a cache between clients by
/// wrapping it in an [Arc].
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: Mutex<HashMap<Option<String>, Arc<Session>>>,
}

impl Session {
    /// Creates a new session that authenticates with the given token.
    ///
    /// # Examples
    ///
    /// ```
    /// use mlhub::Session;
    ///
    /// let session = Session::new("a-token").unwrap();
    /// assert_eq!(session.token(), "a-token");
    /// ```
    pub fn new(token: impl ToString) -> Result<Session> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .user_agent(crate::user_agent())
            .build()?;
        Ok(Session {
            client,
            token: token.to_string(),
        })
    }

    /// Returns this session's token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Starts an authenticated GET request.
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authenticate(self.client.get(url))
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl SessionCache {
    /// Creates a new, empty cache.
    pub fn new() -> SessionCache {
        SessionCache::default()
    }

    /// Returns the session stored for this key, or creates and stores one.
    ///
    /// If `f` fails nothing is stored, so the next call will try again.
    ///
    /// # Examples
    ///
    /// ```
    /// use mlhub::{Session, SessionCache};
    /// use std::sync::Arc;
    ///
    /// let cache = SessionCache::new();
    /// let a = cache.get_or_try_insert_with(Some("a"), || Session::new("a")).unwrap();
    /// let b = cache.get_or_try_insert_with(Some("a"), || Session::new("a")).unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn get_or_try_insert_with<F>(&self, key: Option<&str>, f: F) -> Result<Arc<Session>>
    where
        F: FnOnce() -> Result<Session>,
    {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let key = key.map(String::from);
        if let Some(session) = sessions.get(&key) {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(f()?);
        tracing::debug!("created session, explicit token: {}", key.is_some());
        let _ = sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    /// Returns the number of cached sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if there are no cached sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached session.
    pub fn clear(&self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
