//! HTTP client for the Tavola API.
//!
//! Catalog reads retry per endpoint policy; order submission and phone
//! confirmation never retry. [`ApiClient`] implements
//! [`OrderGateway`](tavola_commerce::checkout::OrderGateway), so it plugs
//! straight into a checkout session.
//!
//! # Example
//!
//! ```rust,no_run
//! use tavola_commerce::ids::RestaurantId;
//! use tavola_data::ApiClient;
//!
//! # async fn run() -> Result<(), tavola_data::FetchError> {
//! let client = ApiClient::new("https://api.tavola.app")?;
//! let foods = client.foods(&RestaurantId::new("r1")).await?;
//! println!("{} foods", foods.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod endpoint;
mod error;
mod retry;
mod search;

pub use client::ApiClient;
pub use endpoint::{CallPolicy, Endpoint};
pub use error::FetchError;
pub use retry::{BackoffStrategy, RetryCondition, RetryPolicy};
pub use search::{SearchSession, SearchSource};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{ApiClient, Endpoint, FetchError, SearchSession};
}
