use std::path::PathBuf;
use std::sync::Arc;

use http::Method;
use tokio::task::JoinHandle;

use crate::config::{self, ClientConfig};
use crate::cookies::PersistentCookieStore;
use crate::errors::NetError;
use crate::net::{Callback, RequestBuilder, Response};

/// HTTP client whose cookies live in a [`PersistentCookieStore`].
///
/// Cloning is cheap; clones share the connection pool and the cookie store.
///
/// # Blocking
/// `reqwest` hands `Set-Cookie` headers to the store on the tokio worker that
/// drives the request. Storing a cookie rewrites the durable store under the
/// store's mutex, so a file or SQLite backend blocks that worker for the
/// duration of the write. Use a multi-threaded runtime when responses set
/// cookies often.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    cookies: Arc<PersistentCookieStore>,
}

impl HttpClient {
    /// Builds a client configured by `config` that reads and writes cookies through `cookies`.
    pub fn new(config: &ClientConfig, cookies: Arc<PersistentCookieStore>) -> Result<Self, NetError> {
        config::validate(config)?;

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .cookie_provider(cookies.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            cookies,
        })
    }

    pub fn cookie_store(&self) -> &Arc<PersistentCookieStore> {
        &self.cookies
    }

    /// Starts a request with an arbitrary method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.client.clone(), method, url.into())
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn head(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// POSTs the content of `path` as `application/octet-stream`; chain
    /// [`media_type`](RequestBuilder::media_type) to change it.
    pub fn post_file(&self, url: impl Into<String>, path: impl Into<PathBuf>) -> RequestBuilder {
        self.post(url).file(path)
    }

    /// Loads an URL and returns the buffered response.
    pub async fn fetch(&self, url: &str) -> Result<Response, NetError> {
        self.get(url).send().await
    }

    /// Loads `url` in the background and reports the outcome to `callback`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue<C: Callback>(&self, url: impl Into<String>, callback: C) -> JoinHandle<()> {
        self.get(url).enqueue(callback)
    }
}
