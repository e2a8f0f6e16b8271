//! Network glue between `reqwest` and the persistent cookie store.
//!
//! - [`HttpClient`] wraps a `reqwest::Client` whose cookie provider is a
//!   [`PersistentCookieStore`](crate::cookies::PersistentCookieStore), so every
//!   `Set-Cookie` received is persisted and every request carries the matching
//!   `Cookie` header.
//! - [`RequestBuilder`] carries a single request of any method with its headers
//!   and body.
//! - [`Callback`] receives the outcome of requests started with
//!   [`HttpClient::enqueue`] or [`RequestBuilder::enqueue`].
//!
//! Transport, TLS and pooling are left to `reqwest`.

mod callback;
mod cookie_provider;
mod fetch;
mod request;
mod response;

pub use callback::Callback;
pub use fetch::HttpClient;
pub use request::RequestBuilder;
pub use response::Response;
