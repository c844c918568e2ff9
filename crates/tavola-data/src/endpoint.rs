//! API endpoints and their call policies.

use crate::retry::RetryPolicy;
use std::time::Duration;

/// Endpoints of the Tavola HTTP API.
///
/// Each endpoint carries a default timeout and retry budget. Writes and
/// confirmation calls never retry: a duplicate order or code is worse than
/// a visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /restaurants/:id`
    Restaurant,
    /// `GET /foods?restaurant=`
    Foods,
    /// `GET /foods/:id`
    Food,
    /// `GET /menus/:id`
    Menu,
    /// `GET /foodAttributes`
    FoodAttributes,
    /// `GET /search`
    Search,
    /// `POST /commands/sendCode`
    SendCode,
    /// `POST /commands/confirmCode`
    ConfirmCode,
    /// `POST /commands`
    SubmitCommand,
}

impl Endpoint {
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Restaurant | Self::Food | Self::Menu => Duration::from_millis(2_000),
            Self::Foods | Self::FoodAttributes => Duration::from_millis(3_000),
            Self::Search => Duration::from_millis(1_500),
            Self::SendCode | Self::ConfirmCode => Duration::from_millis(5_000),
            Self::SubmitCommand => Duration::from_millis(10_000),
        }
    }

    pub fn default_max_retries(&self) -> u32 {
        match self {
            Self::Restaurant | Self::Foods | Self::Food | Self::Menu | Self::FoodAttributes => 2,
            // Superseded by the next keystroke anyway.
            Self::Search => 0,
            Self::SendCode | Self::ConfirmCode | Self::SubmitCommand => 0,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::SendCode | Self::ConfirmCode | Self::SubmitCommand)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Foods => "foods",
            Self::Food => "food",
            Self::Menu => "menu",
            Self::FoodAttributes => "food_attributes",
            Self::Search => "search",
            Self::SendCode => "send_code",
            Self::ConfirmCode => "confirm_code",
            Self::SubmitCommand => "submit_command",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Timeout and retry settings applied to one call.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl CallPolicy {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    /// Defaults for an endpoint.
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        let retries = endpoint.default_max_retries();
        let retry = if retries == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::new(retries)
        };
        Self::new(endpoint.default_timeout(), retry)
    }

    /// Cap the timeout, keeping the retry budget.
    pub fn capped(mut self, limit: Option<Duration>) -> Self {
        if let Some(limit) = limit {
            self.timeout = self.timeout.min(limit);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_never_retry() {
        for endpoint in [Endpoint::SendCode, Endpoint::ConfirmCode, Endpoint::SubmitCommand] {
            assert!(endpoint.is_write());
            assert_eq!(CallPolicy::for_endpoint(endpoint).retry.max_attempts, 0);
        }
    }

    #[test]
    fn test_catalog_reads_retry() {
        let policy = CallPolicy::for_endpoint(Endpoint::Food);
        assert_eq!(policy.retry.max_attempts, 2);
        assert_eq!(policy.timeout, Duration::from_millis(2_000));
        assert!(!Endpoint::Food.is_write());
    }

    #[test]
    fn test_capped_timeout() {
        let policy = CallPolicy::for_endpoint(Endpoint::SubmitCommand)
            .capped(Some(Duration::from_millis(800)));
        assert_eq!(policy.timeout, Duration::from_millis(800));

        let policy = CallPolicy::for_endpoint(Endpoint::Search).capped(Some(Duration::from_secs(30)));
        assert_eq!(policy.timeout, Duration::from_millis(1_500));
    }

    #[test]
    fn test_display() {
        assert_eq!(Endpoint::FoodAttributes.to_string(), "food_attributes");
    }
}
