use std::future::Future;

use bytes::Bytes;

use crate::error::FetchError;

/// A fully-read HTTP response.
///
/// Bodies are small (one JSON page or one artifact) and are buffered whole so
/// they can be cached and retried as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface the transport needs: one GET
/// returning status and body. Implementations own timeout configuration and
/// redirect following; non-2xx statuses are returned as responses, not
/// errors, so the transport can classify them.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Scripted mocks in tests
pub trait HttpClient: Send + Sync {
    /// Error type for connection-level failures.
    type Error: std::error::Error + Into<FetchError> + Send + 'static;

    /// Issue a GET for `url` with the given extra headers.
    ///
    /// # Errors
    ///
    /// Returns an error only when no HTTP response was obtained (DNS failure,
    /// refused connection, timeout, truncated body).
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::ClientConfig;

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Build a client honoring the configured timeout and user agent.
        pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .user_agent(config.user_agent.clone())
                .build()?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;

            Ok(HttpResponse { status, body })
        }
    }

    impl From<reqwest::Error> for FetchError {
        fn from(e: reqwest::Error) -> Self {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_builder() {
                FetchError::InvalidRequest(e.to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
