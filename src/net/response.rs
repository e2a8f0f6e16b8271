//! Buffered HTTP response model.
//!
//! A [`Response`] is what [`HttpClient`](crate::net::HttpClient) hands back once a
//! request has completed: the final URL, status, headers and the whole body.
//! Cookies carried by the response have already been handed to the cookie store
//! by the time the caller sees it.
use http::HeaderMap;

/// Fully buffered HTTP response.
#[derive(Debug)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Reason phrase for `status`, `"Unknown"` for non-standard codes.
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Drains a `reqwest` response into memory.
    pub(crate) async fn from_reqwest(res: reqwest::Response) -> Result<Self, reqwest::Error> {
        let url = res.url().clone();
        let status = res.status().as_u16();
        let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
        let headers = res.headers().clone();

        // No streaming; the whole body is buffered.
        let body = res.bytes().await?.to_vec();

        Ok(Self {
            url,
            status,
            status_text,
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
