//! Scripted [`HttpClient`] for unit tests.

use std::sync::{Arc, Mutex};

use super::http::{HttpClient, HttpResponse};
use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    Refused,
    TimedOut,
}

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockError::Refused => write!(f, "connection refused"),
            MockError::TimedOut => write!(f, "timed out"),
        }
    }
}

impl std::error::Error for MockError {}

impl From<MockError> for FetchError {
    fn from(e: MockError) -> Self {
        match e {
            MockError::Refused => FetchError::Network(e.to_string()),
            MockError::TimedOut => FetchError::Timeout,
        }
    }
}

type Handler = dyn Fn(&str, usize) -> Result<HttpResponse, MockError> + Send + Sync;

/// Answers each GET by calling a handler with the URL and the zero-based
/// call index, and records every URL it was asked for.
#[derive(Clone)]
pub struct MockClient {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockClient {
    pub fn new(
        handler: impl Fn(&str, usize) -> Result<HttpResponse, MockError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answers `status` with `body`.
    pub fn fixed(status: u16, body: &'static str) -> Self {
        Self::new(move |_, _| Ok(HttpResponse::new(status, body)))
    }

    pub fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }

    pub fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }
}

impl HttpClient for MockClient {
    type Error = MockError;

    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, Self::Error> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.len() - 1
        };
        (self.handler)(url, index)
    }
}

/// A Solr select body with `num_found` total and docs `{"id": "<n>"}` for
/// each `n` in `ids`.
pub fn solr_page(num_found: u64, start: u64, ids: impl IntoIterator<Item = u64>) -> String {
    let docs: Vec<String> = ids.into_iter().map(|n| format!(r#"{{"id":"{n}"}}"#)).collect();
    format!(
        r#"{{"responseHeader":{{"status":0,"QTime":1}},"response":{{"numFound":{num_found},"start":{start},"docs":[{}]}}}}"#,
        docs.join(",")
    )
}

/// The `start` parameter of a search URL.
pub fn start_param(url: &str) -> u64 {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "start")
                .and_then(|(_, v)| v.parse().ok())
        })
        .unwrap_or(0)
}
