//! Request construction for a single (kind, period) work item
//!
//! Building a request is pure: no I/O, no clock, no shared state. The same inputs
//! always produce the same [`RequestSpec`].

use crate::config::Config;
use crate::error::RequestError;
use crate::period::Period;
use crate::types::DocumentKind;
use reqwest::Method;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use url::Url;

/// Fully formed description of one document request
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
    /// Always GET
    pub method: Method,
    /// Absolute document URL
    pub url: Url,
    /// Headers, holding the session cookie
    pub headers: HeaderMap,
}

/// Ensure the base URL ends with exactly one `/`
pub fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

/// Build the request for one document
///
/// The URL is the normalized base, the kind's path segment, and the kind's file and
/// query template for `period`. The cookie is attached verbatim.
///
/// # Errors
///
/// Fails when the resulting URL does not parse, is not http(s), or the cookie holds
/// bytes that cannot appear in a header value.
pub fn build_request(
    config: &Config,
    kind: DocumentKind,
    period: Period,
) -> Result<RequestSpec, RequestError> {
    let raw = format!(
        "{}{}{}",
        normalize_base_url(&config.portal.base_url),
        kind.path_segment(),
        kind.remote_file(period, &config.portal.user_id())
    );
    let url = Url::parse(&raw).map_err(|source| RequestError::InvalidUrl {
        url: raw.clone(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RequestError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }

    let cookie =
        HeaderValue::from_str(config.cookie.as_str()).map_err(|_| RequestError::InvalidCookie)?;
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie);

    Ok(RequestSpec {
        method: Method::GET,
        url,
        headers,
    })
}
