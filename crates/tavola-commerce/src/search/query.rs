//! Search query builder.

use crate::catalog::Food;
use crate::ids::{FoodAttributeId, RestaurantId};
use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PER_PAGE: i64 = 24;
/// Largest page size the API serves.
pub const MAX_PER_PAGE: i64 = 100;

/// A catalog search, as sent to `GET /search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free text matched against names and descriptions.
    pub text: Option<String>,
    /// Restrict to one restaurant.
    pub restaurant: Option<RestaurantId>,
    /// Foods must carry every listed attribute.
    pub attributes: Vec<FoodAttributeId>,
    /// Current page (1-indexed).
    pub page: i64,
    pub per_page: i64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self {
            text: None,
            restaurant: None,
            attributes: Vec::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Set the text query; blank text clears it.
    pub fn with_text(mut self, q: impl Into<String>) -> Self {
        let q = q.into();
        let q = q.trim();
        self.text = (!q.is_empty()).then(|| q.to_string());
        self
    }

    pub fn in_restaurant(mut self, restaurant: impl Into<RestaurantId>) -> Self {
        self.restaurant = Some(restaurant.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<FoodAttributeId>) -> Self {
        let attribute = attribute.into();
        if !self.attributes.contains(&attribute) {
            self.attributes.push(attribute);
        }
        self
    }

    /// Set pagination.
    pub fn with_pagination(mut self, page: i64, per_page: i64) -> Self {
        self.page = page.max(1);
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Number of items skipped before the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.restaurant.is_none() && self.attributes.is_empty()
    }

    /// Query string pairs for `GET /search`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref text) = self.text {
            pairs.push(("q", text.clone()));
        }
        if let Some(ref restaurant) = self.restaurant {
            pairs.push(("restaurant", restaurant.to_string()));
        }
        if !self.attributes.is_empty() {
            let joined: Vec<&str> = self.attributes.iter().map(|a| a.as_str()).collect();
            pairs.push(("attributes", joined.join(",")));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("perPage", self.per_page.to_string()));
        pairs
    }

    /// Whether a food satisfies the query's filters.
    pub fn matches(&self, food: &Food) -> bool {
        if let Some(ref restaurant) = self.restaurant {
            if &food.restaurant != restaurant {
                return false;
            }
        }
        if !self.attributes.iter().all(|a| food.attributes.contains(a)) {
            return false;
        }
        match self.text {
            Some(ref text) => {
                let needle = text.to_lowercase();
                food.name.to_lowercase().contains(&needle)
                    || food
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                    || food
                        .category
                        .as_deref()
                        .map(|c| c.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new()
            .with_text("  pizza ")
            .in_restaurant("r1")
            .with_pagination(2, 10);

        assert_eq!(query.text.as_deref(), Some("pizza"));
        assert_eq!(query.page, 2);
        assert_eq!(query.offset(), 10);
        assert_eq!(SearchQuery::new().with_pagination(0, 1000).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_query_pairs() {
        let query = SearchQuery::new()
            .with_text("soup")
            .with_attribute("vegan")
            .with_attribute("spicy")
            .with_attribute("vegan");
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("q", "soup".to_string())));
        assert!(pairs.contains(&("attributes", "vegan,spicy".to_string())));
        assert!(pairs.contains(&("perPage", "24".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "restaurant"));
    }

    #[test]
    fn test_matches_food() {
        let mut food = Food::new("f1", "r1", "Margherita", Money::new(900, Currency::EUR));
        food.category = Some("Pizzas".to_string());
        food.attributes = vec![FoodAttributeId::new("vegetarian")];

        assert!(SearchQuery::new().with_text("pizza").matches(&food));
        assert!(SearchQuery::new().with_attribute("vegetarian").matches(&food));
        assert!(!SearchQuery::new().with_attribute("vegan").matches(&food));
        assert!(!SearchQuery::new().in_restaurant("r2").matches(&food));
        assert!(SearchQuery::new().matches(&food));
    }
}
