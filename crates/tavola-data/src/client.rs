//! Client for the Tavola HTTP API.

use crate::endpoint::{CallPolicy, Endpoint};
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tavola_commerce::catalog::{Food, FoodAttribute, Menu, Restaurant};
use tavola_commerce::checkout::{
    CodeVerdict, Command, CommandReceipt, ConfirmCodeRequest, OrderGateway, SendCodeRequest,
};
use tavola_commerce::ids::{FoodId, MenuId, RestaurantId};
use tavola_commerce::search::{SearchQuery, SearchResults};
use tavola_commerce::CommerceError;
use tracing::{debug, warn};

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_cap: Option<Duration>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `https://api.tavola.app`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("tavola/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            timeout_cap: None,
        })
    }

    /// Upper bound applied on top of every endpoint's own timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_cap = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self, endpoint: Endpoint) -> CallPolicy {
        CallPolicy::for_endpoint(endpoint).capped(self.timeout_cap)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    // === Catalog ===

    pub async fn restaurant(&self, id: &RestaurantId) -> Result<Restaurant, FetchError> {
        self.get_json(Endpoint::Restaurant, &format!("/restaurants/{id}"), &[])
            .await
    }

    /// Foods offered by a restaurant.
    pub async fn foods(&self, restaurant: &RestaurantId) -> Result<Vec<Food>, FetchError> {
        self.get_json(
            Endpoint::Foods,
            "/foods",
            &[("restaurant", restaurant.to_string())],
        )
        .await
    }

    pub async fn food(&self, id: &FoodId) -> Result<Food, FetchError> {
        self.get_json(Endpoint::Food, &format!("/foods/{id}"), &[])
            .await
    }

    pub async fn menu(&self, id: &MenuId) -> Result<Menu, FetchError> {
        self.get_json(Endpoint::Menu, &format!("/menus/{id}"), &[])
            .await
    }

    pub async fn food_attributes(&self) -> Result<Vec<FoodAttribute>, FetchError> {
        self.get_json(Endpoint::FoodAttributes, "/foodAttributes", &[])
            .await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults, FetchError> {
        self.get_json(Endpoint::Search, "/search", &query.to_query_pairs())
            .await
    }

    // === Orders ===

    pub async fn send_code(&self, request: &SendCodeRequest) -> Result<(), FetchError> {
        self.post(Endpoint::SendCode, "/commands/sendCode", request)
            .await?;
        Ok(())
    }

    pub async fn confirm_code(&self, request: &ConfirmCodeRequest) -> Result<CodeVerdict, FetchError> {
        let response = self
            .post(Endpoint::ConfirmCode, "/commands/confirmCode", request)
            .await?;
        decode(response).await
    }

    pub async fn submit_command(&self, command: &Command) -> Result<CommandReceipt, FetchError> {
        let response = self.post(Endpoint::SubmitCommand, "/commands", command).await?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .execute(endpoint, || self.request(Method::GET, path).query(query))
            .await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        path: &str,
        body: &B,
    ) -> Result<Response, FetchError> {
        self.execute(endpoint, || self.request(Method::POST, path).json(body))
            .await
    }

    /// Send a request under the endpoint's policy, retrying what it allows.
    async fn execute<F>(&self, endpoint: Endpoint, build: F) -> Result<Response, FetchError>
    where
        F: Fn() -> RequestBuilder,
    {
        let policy = self.policy(endpoint);
        let mut attempt = 0;

        loop {
            let started = Instant::now();
            let result = match build().timeout(policy.timeout).send().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(FetchError::Http {
                    status: response.status().as_u16(),
                    url: response.url().to_string(),
                }),
                Err(e) => Err(FetchError::from(e)),
            };

            match result {
                Ok(response) => {
                    debug!(
                        endpoint = %endpoint,
                        status = response.status().as_u16(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        attempt,
                        "api call"
                    );
                    return Ok(response);
                }
                Err(e) if policy.retry.should_retry(&e, attempt) => {
                    let delay = policy.retry.backoff.delay_for_attempt(attempt);
                    warn!(endpoint = %endpoint, attempt, error = %e, delay_ms = delay.as_millis() as u64, "retrying api call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, attempt, error = %e, "api call failed");
                    return Err(e);
                }
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl OrderGateway for ApiClient {
    async fn send_code(&self, request: &SendCodeRequest) -> Result<(), CommerceError> {
        Ok(ApiClient::send_code(self, request).await?)
    }

    async fn confirm_code(&self, request: &ConfirmCodeRequest) -> Result<CodeVerdict, CommerceError> {
        Ok(ApiClient::confirm_code(self, request).await?)
    }

    async fn submit(&self, command: &Command) -> Result<CommandReceipt, CommerceError> {
        Ok(self.submit_command(command).await?)
    }
}
