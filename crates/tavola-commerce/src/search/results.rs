//! Search results and pagination.

use crate::catalog::{Food, Restaurant};
use crate::search::SearchQuery;
use serde::{Deserialize, Serialize};

/// Pagination info.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page (1-indexed).
    pub page: i64,
    pub per_page: i64,
    /// Total number of items.
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// Get page numbers for display (e.g., [3, 4, 5, 6, 7]).
    pub fn page_numbers(&self, max_visible: usize) -> Vec<i64> {
        if self.total_pages as usize <= max_visible {
            return (1..=self.total_pages).collect();
        }

        let half = max_visible / 2;
        let start = (self.page - half as i64).max(1);
        let end = (start + max_visible as i64 - 1).min(self.total_pages);
        let start = (end - max_visible as i64 + 1).max(1);

        (start..=end).collect()
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }

    /// Get start item number (1-indexed).
    pub fn start_item(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    pub fn end_item(&self) -> i64 {
        (self.page * self.per_page).min(self.total)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, crate::search::DEFAULT_PER_PAGE, 0)
    }
}

/// Response of `GET /search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl SearchResults {
    pub fn new(restaurants: Vec<Restaurant>, foods: Vec<Food>, pagination: Pagination) -> Self {
        Self {
            restaurants,
            foods,
            pagination,
        }
    }

    /// Filter and page an already fetched food list.
    pub fn from_foods(query: &SearchQuery, foods: &[Food]) -> Self {
        let matching: Vec<&Food> = foods.iter().filter(|f| query.matches(f)).collect();
        let pagination = Pagination::new(query.page, query.per_page, matching.len() as i64);
        let page = matching
            .into_iter()
            .skip(query.offset().max(0) as usize)
            .take(query.per_page.max(0) as usize)
            .cloned()
            .collect();
        Self::new(Vec::new(), page, pagination)
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty() && self.foods.is_empty()
    }

    /// Get number of items in this page.
    pub fn len(&self) -> usize {
        self.restaurants.len() + self.foods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    #[test]
    fn test_pagination_basics() {
        let p = Pagination::new(2, 10, 45);
        assert_eq!(p.total_pages, 5);
        assert!(p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.offset(), 10);
    }

    #[test]
    fn test_pagination_edges() {
        let first = Pagination::new(1, 10, 45);
        assert!(first.is_first() && !first.is_last() && !first.has_prev);

        let last = Pagination::new(5, 10, 45);
        assert!(last.is_last() && !last.has_next);

        let single = Pagination::new(1, 10, 0);
        assert_eq!(single.total_pages, 1);
        assert_eq!(single.start_item(), 0);
    }

    #[test]
    fn test_pagination_page_numbers() {
        let p = Pagination::new(5, 10, 100);
        assert_eq!(p.page_numbers(5), vec![3, 4, 5, 6, 7]);
        assert_eq!(Pagination::new(2, 10, 45).end_item(), 20);
    }

    #[test]
    fn test_from_foods_filters_and_pages() {
        let foods: Vec<Food> = (0..30)
            .map(|i| {
                let name = if i % 2 == 0 { format!("Pizza {i}") } else { format!("Salad {i}") };
                Food::new(format!("f{i}"), "r1", name, Money::new(900, Currency::EUR))
            })
            .collect();

        let query = SearchQuery::new().with_text("pizza").with_pagination(2, 10);
        let results = SearchResults::from_foods(&query, &foods);
        assert_eq!(results.pagination.total, 15);
        assert_eq!(results.foods.len(), 5);
        assert_eq!(results.foods[0].name, "Pizza 20");
        assert!(!results.pagination.has_next);
    }

    #[test]
    fn test_deserialize_partial_response() {
        let results: SearchResults = serde_json::from_str(r#"{ "foods": [] }"#).unwrap();
        assert!(results.is_empty());
        assert_eq!(results.pagination.page, 1);
    }
}
