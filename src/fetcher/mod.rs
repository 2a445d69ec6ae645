//! Document fetching and validation
//!
//! The portal answers HTTP 200 for everything, including its login page when the
//! session has expired and its error page when a document does not exist. The status
//! code therefore proves nothing. A response counts as a document only when its body
//! starts with the PDF signature; anything else is a content-validation failure and
//! the body is dropped.
//!
//! ## Architecture
//!
//! - [`Transport`]: sends a [`RequestSpec`] and returns the raw body
//! - [`HttpTransport`]: the reqwest implementation used by the binary
//! - [`fetch_document`]: bounds a transport call by the timeout and sniffs the body

mod http;
mod traits;

pub use http::{HttpTransport, USER_AGENT};
pub use traits::Transport;

use crate::error::FetchError;
use crate::request::RequestSpec;
use std::time::Duration;

/// First bytes shared by every PDF version
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// How many leading bytes of a rejected body are kept for diagnostics
const PREFIX_PREVIEW_LEN: usize = 16;

/// A validated document body, or why there is none
pub type FetchResult = std::result::Result<Vec<u8>, FetchError>;

/// Check that `body` starts with the PDF signature
///
/// # Errors
///
/// [`FetchError::TooShort`] when the body is shorter than the signature,
/// [`FetchError::NotADocument`] when the leading bytes differ.
pub fn sniff_document(body: &[u8]) -> Result<(), FetchError> {
    if body.len() < PDF_SIGNATURE.len() {
        return Err(FetchError::TooShort { len: body.len() });
    }
    if !body.starts_with(PDF_SIGNATURE) {
        let preview = &body[..body.len().min(PREFIX_PREVIEW_LEN)];
        return Err(FetchError::NotADocument {
            len: body.len(),
            prefix: String::from_utf8_lossy(preview).into_owned(),
        });
    }
    Ok(())
}

/// Execute `spec` on `transport` within `timeout` and validate the body
///
/// The whole exchange, body included, must finish within `timeout`. There is no
/// retry and no partial result.
pub async fn fetch_document<T>(transport: &T, spec: &RequestSpec, timeout: Duration) -> FetchResult
where
    T: Transport + ?Sized,
{
    let body = match tokio::time::timeout(timeout, transport.send(spec, timeout)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(FetchError::Timeout {
                url: spec.url.to_string(),
                timeout,
            });
        }
    };
    sniff_document(&body)?;
    Ok(body)
}
