//! Cart module.
//!
//! Option groups, composition builders, cart entries, the pricing engine
//! and the persisted cart store.

mod compose;
mod entry;
mod option;
pub mod pricing;
mod store;

pub use compose::{FoodAction, FoodBuilder, MenuAction, MenuBuilder, MAX_QUANTITY_PER_ENTRY};
pub use entry::{FoodInCart, MenuFoodSelection, MenuInCart};
pub use option::{OptionGroup, OptionItem};
pub use pricing::{
    estimate_food_price, estimate_menu_price, estimate_option_price, estimate_total_price,
    CartPricing, EntryKind, EntryPricing, PricingMode,
};
pub use store::{CartPersistence, CartState, CartStore, MemoryCartStorage};
