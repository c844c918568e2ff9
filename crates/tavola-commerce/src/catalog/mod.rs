//! Catalog module.
//!
//! Read-only reference data fetched from the catalog API: restaurants,
//! foods with their option groups, accompaniments, attributes and menus.

mod food;
mod menu;
mod restaurant;

pub use food::{Accompaniment, Food, FoodAttribute, FoodOption};
pub use menu::{Menu, MenuFood, MenuType};
pub use restaurant::Restaurant;
