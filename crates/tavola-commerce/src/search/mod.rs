//! Search module.
//!
//! Catalog search queries, results and pagination.

mod query;
mod results;

pub use query::{SearchQuery, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use results::{Pagination, SearchResults};
