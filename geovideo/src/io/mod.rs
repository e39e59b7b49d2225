mod http;
mod throttle;

pub use http::{HeaderMap, HeaderValue, HttpTransport, StatusCode, TransportError};
pub(crate) use throttle::Throttle;

use bytes::Bytes;

/// Something able to GET a resource. [`HttpTransport`] is the one talking to real tile servers,
/// tests plug in their own.
pub trait Transport: Send + Sync {
    /// Fetch the body of `url`. Anything but a complete, successful response is an error.
    fn get(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<Bytes, TransportError>> + Send;
}
