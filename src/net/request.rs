//! Per-request builder for [`HttpClient`](crate::net::HttpClient).
//!
//! A [`RequestBuilder`] collects the method, headers, body and timeout of one
//! request and is consumed by [`send`](RequestBuilder::send) or
//! [`enqueue`](RequestBuilder::enqueue). Errors in headers or bodies are kept
//! until then, so the builder chain itself never fails.
//!
//! Bodies:
//! - [`body`](RequestBuilder::body) sends text as `text/plain; charset=utf-8`;
//!   an empty string means no body.
//! - [`bytes`](RequestBuilder::bytes) and [`file`](RequestBuilder::file) default
//!   to `application/octet-stream`.
//! - [`media_type`](RequestBuilder::media_type) overrides the default, an explicit
//!   `Content-Type` header overrides both.
//!
//! `POST`, `PUT`, `PATCH`, `PROPPATCH` and `REPORT` need a body; `GET` and `HEAD`
//! must not have one.
use std::path::PathBuf;
use std::time::Duration;

use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use tokio::task::JoinHandle;

use crate::errors::NetError;
use crate::net::{Callback, Response};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

enum Body {
    Text(String),
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// One request, ready to be sent through the client's cookie-aware connection pool.
#[must_use = "a request does nothing until it is sent or enqueued"]
pub struct RequestBuilder {
    client: reqwest::Client,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Body>,
    media_type: Option<String>,
    timeout: Option<Duration>,
    error: Option<NetError>,
}

impl RequestBuilder {
    pub(crate) fn new(client: reqwest::Client, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            media_type: None,
            timeout: None,
            error: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Appends a header. An invalid name or value fails the request when it is sent.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        if self.error.is_some() {
            return self;
        }
        match (HeaderName::try_from(key), HeaderValue::try_from(value)) {
            (Ok(k), Ok(v)) => {
                self.headers.append(k, v);
            }
            (Err(e), _) => self.error = Some(NetError::InvalidHeader(e.into())),
            (_, Err(e)) => self.error = Some(NetError::InvalidHeader(e.into())),
        }
        self
    }

    /// Merges `headers` into the request, replacing values of the same name.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut last: Option<HeaderName> = None;
        for (key, value) in headers {
            match key {
                Some(key) => {
                    self.headers.insert(key.clone(), value);
                    last = Some(key);
                }
                None => {
                    if let Some(key) = &last {
                        self.headers.append(key.clone(), value);
                    }
                }
            }
        }
        self
    }

    /// Text body. Ignored when `content` is empty.
    pub fn body(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.body = Some(Body::Text(content));
        }
        self
    }

    /// Raw body.
    pub fn bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Bytes(body.into()));
        self
    }

    /// Uploads the content of `path`. The file is read when the request is sent.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body = Some(Body::File(path.into()));
        self
    }

    /// Content type of the body.
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Overall deadline for this request, replacing the client's.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends the request and buffers the response.
    pub async fn send(self) -> Result<Response, NetError> {
        let Self {
            client,
            method,
            url,
            mut headers,
            body,
            media_type,
            timeout,
            error,
        } = self;

        if let Some(e) = error {
            return Err(e);
        }
        if body.is_none() && requires_body(&method) {
            return Err(NetError::MissingBody(method));
        }
        if body.is_some() && !permits_body(&method) {
            return Err(NetError::BodyNotAllowed(method));
        }

        let mut req = client.request(method.clone(), url.as_str());

        if let Some(body) = body {
            let (data, default_type) = match body {
                Body::Text(text) => (text.into_bytes(), TEXT_PLAIN),
                Body::Bytes(data) => (data, OCTET_STREAM),
                Body::File(path) => {
                    let data = tokio::fs::read(&path)
                        .await
                        .map_err(|source| NetError::File { path, source })?;
                    (data, OCTET_STREAM)
                }
            };
            if !headers.contains_key(CONTENT_TYPE) {
                let media_type = media_type.as_deref().unwrap_or(default_type);
                let value = HeaderValue::from_str(media_type).map_err(|e| NetError::InvalidHeader(e.into()))?;
                headers.insert(CONTENT_TYPE, value);
            }
            req = req.body(data);
        }

        req = req.headers(headers);
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let res = req.send().await?;
        log::debug!("{} {} -> {}", method, res.url(), res.status());
        Ok(Response::from_reqwest(res).await?)
    }

    /// Sends the request in the background and reports the outcome to `callback`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue<C: Callback>(self, callback: C) -> JoinHandle<()> {
        tokio::spawn(async move {
            let method = self.method.clone();
            let url = self.url.clone();
            match self.send().await {
                Ok(response) => callback.on_response(response),
                Err(e) => {
                    log::debug!("{method} {url} failed: {e}");
                    callback.on_failure(e)
                }
            }
        })
    }
}

fn requires_body(method: &Method) -> bool {
    matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "PROPPATCH" | "REPORT")
}

fn permits_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}
