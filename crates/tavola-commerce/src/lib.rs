//! Food-ordering domain types and logic for Tavola.
//!
//! - **Catalog**: restaurants, foods, option templates, accompaniments, menus
//! - **Cart**: option groups, food/menu builders, pricing engine, cart store
//! - **Checkout**: order documents, phone confirmation, submission, order desk
//! - **Search**: catalog queries and pagination
//!
//! # Example
//!
//! ```rust
//! use tavola_commerce::prelude::*;
//!
//! let burger = Food::new("burger", "r1", "Burger", Money::new(1000, Currency::EUR))
//!     .with_option(FoodOption::new(
//!         "Extras",
//!         3,
//!         vec![Accompaniment::new("cheese", "Cheese", Money::new(200, Currency::EUR))],
//!     ));
//!
//! let mut builder = FoodBuilder::new(burger, PricingMode::Standard);
//! builder.increment_option_item("Extras", &AccompanimentId::new("cheese")).unwrap();
//! builder.increment_quantity().unwrap();
//!
//! let mut cart = CartStore::open(MemoryCartStorage::new()).unwrap();
//! let state = cart.add_food(builder.save().unwrap()).unwrap();
//! assert_eq!(state.total_price.display(), "\u{20ac}24.00");
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod search;
#[cfg(feature = "storage")]
pub mod storage;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{
        Accompaniment, Food, FoodAttribute, FoodOption, Menu, MenuFood, MenuType, Restaurant,
    };

    // Cart
    pub use crate::cart::{
        CartPersistence, CartPricing, CartState, CartStore, EntryPricing, FoodAction,
        FoodBuilder, FoodInCart, MemoryCartStorage, MenuAction, MenuBuilder, MenuFoodSelection,
        MenuInCart, OptionGroup, OptionItem, PricingMode,
    };

    // Checkout
    pub use crate::checkout::{
        CheckoutForm, CheckoutPhase, CheckoutSession, CodeVerdict, Command, CommandReceipt,
        CommandType, Customer, DeliveryDetails, DeliveryTiming, DoorOption, OrderConfirmation,
        OrderGateway, PaymentMethod,
    };
    #[cfg(feature = "storage")]
    pub use crate::checkout::{CodeNotifier, LogNotifier, MemoryNotifier, OrderDesk};
    #[cfg(feature = "storage")]
    pub use crate::storage::SessionCartStorage;

    // Search
    pub use crate::search::{Pagination, SearchQuery, SearchResults};
}
