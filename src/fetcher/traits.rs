//! Transport abstraction for document requests

use crate::error::FetchError;
use crate::request::RequestSpec;
use async_trait::async_trait;
use std::time::Duration;

/// Executes a [`RequestSpec`] and returns the full response body
///
/// Implementations must not interpret the status code: the portal answers 200 for
/// login pages and missing documents alike. Content checks happen in
/// [`fetch_document`](super::fetch_document).
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use getlush::error::FetchError;
/// use getlush::fetcher::Transport;
/// use getlush::request::RequestSpec;
/// use std::time::Duration;
///
/// struct Canned(Vec<u8>);
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn send(&self, _spec: &RequestSpec, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
///         Ok(self.0.clone())
///     }
///
///     fn name(&self) -> &'static str {
///         "canned"
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the whole body
    ///
    /// `timeout` is a hint for implementations with their own deadline handling; the
    /// caller enforces it regardless.
    ///
    /// # Errors
    ///
    /// Returns a network-class [`FetchError`] (timeout, connect, transport, body).
    async fn send(&self, spec: &RequestSpec, timeout: Duration) -> Result<Vec<u8>, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, spec: &RequestSpec, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        (**self).send(spec, timeout).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
