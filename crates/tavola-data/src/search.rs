//! Search with supersession: starting a query cancels the one in flight.

use crate::client::ApiClient;
use crate::error::FetchError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tavola_commerce::search::{SearchQuery, SearchResults};
use tokio::task::AbortHandle;
use tracing::debug;

/// Anything that can answer a search query.
#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, FetchError>;
}

#[async_trait]
impl SearchSource for ApiClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, FetchError> {
        ApiClient::search(self, query).await
    }
}

/// Runs at most one search at a time.
///
/// A newer call aborts the older task, which then resolves to
/// [`FetchError::Cancelled`].
pub struct SearchSession<S: SearchSource> {
    source: Arc<S>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl<S: SearchSource> SearchSession<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            in_flight: Mutex::new(None),
        }
    }

    pub async fn search(&self, query: SearchQuery) -> Result<SearchResults, FetchError> {
        let source = Arc::clone(&self.source);
        let handle = tokio::spawn(async move { source.search(&query).await });

        {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| FetchError::Connection("search session lock poisoned".to_string()))?;
            if let Some(previous) = in_flight.replace(handle.abort_handle()) {
                if !previous.is_finished() {
                    debug!("superseding in-flight search");
                }
                previous.abort();
            }
        }

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(FetchError::Cancelled),
            Err(e) => Err(FetchError::Connection(e.to_string())),
        }
    }

    /// Abort whatever search is running.
    pub fn cancel(&self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            if let Some(previous) = in_flight.take() {
                previous.abort();
            }
        }
    }
}
