//! HTTP client configuration.
//!
//! `ClientConfig` controls how the [`HttpClient`](crate::net::HttpClient) talks to the
//! network: the user agent it announces and the timeouts applied to every request.
//! Transport concerns (TLS, pooling, redirects) stay with `reqwest`.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use persistent_cookie_store::config::ClientConfig;
//! let cfg = ClientConfig::default();
//! assert_eq!(cfg.connect_timeout.as_secs(), 10);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use std::time::Duration;
//! use persistent_cookie_store::config::ClientConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ClientConfig::builder()
//!     .user_agent("my-app/0.1")
//!     .connect_timeout(Duration::from_secs(3))
//!     .read_timeout(Duration::from_secs(15))
//!     .build()?; // returns Result<ClientConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`ConfigError`] for zero timeouts, a total timeout
//! shorter than the connect timeout, or an empty user agent.

use std::fmt;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("persistent-cookie-store/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Maximum time to establish a connection
    pub connect_timeout: Duration,
    /// Maximum idle time between two reads of the response
    pub read_timeout: Duration,
    /// Overall deadline for a request, `None` means no deadline
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    inner: ClientConfig,
}

impl ClientConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ClientConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn connect_timeout(self, d: Duration) -> Self { self.map(|c| c.connect_timeout = d) }
    pub fn read_timeout(self, d: Duration) -> Self { self.map(|c| c.read_timeout = d) }
    pub fn timeout(self, d: Duration) -> Self { self.map(|c| c.timeout = Some(d)) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ClientConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyUserAgent,
    ZeroTimeout(&'static str),
    TimeoutShorterThanConnect { timeout: Duration, connect: Duration },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyUserAgent =>
                write!(f, "user_agent must not be empty"),
            ConfigError::ZeroTimeout(which) =>
                write!(f, "{which} must be greater than zero"),
            ConfigError::TimeoutShorterThanConnect { timeout, connect } =>
                write!(f, "timeout ({timeout:?}) < connect_timeout ({connect:?})"),
        }
    }
}
impl std::error::Error for ConfigError {}

pub(crate) fn validate(c: &ClientConfig) -> Result<(), ConfigError> {
    if c.user_agent.trim().is_empty() {
        return Err(ConfigError::EmptyUserAgent);
    }
    if c.connect_timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout("connect_timeout"));
    }
    if c.read_timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout("read_timeout"));
    }
    if let Some(timeout) = c.timeout {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("timeout"));
        }
        if timeout < c.connect_timeout {
            return Err(ConfigError::TimeoutShorterThanConnect {
                timeout,
                connect: c.connect_timeout,
            });
        }
    }
    Ok(())
}
