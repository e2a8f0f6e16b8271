use crate::errors::NetError;
use crate::net::Response;

/// Receives the outcome of a request started with
/// [`HttpClient::enqueue`](crate::net::HttpClient::enqueue) or
/// [`RequestBuilder::enqueue`](crate::net::RequestBuilder::enqueue).
///
/// Exactly one of the two methods is called, on a tokio worker thread.
pub trait Callback: Send + 'static {
    /// Called with the buffered response, whatever its status code.
    fn on_response(self, response: Response);

    /// Called when no response could be obtained.
    fn on_failure(self, error: NetError);
}
