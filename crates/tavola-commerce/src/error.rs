//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in cart, checkout and order operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Food not found.
    #[error("Food not found: {0}")]
    FoodNotFound(String),

    /// Menu not found.
    #[error("Menu not found: {0}")]
    MenuNotFound(String),

    /// Restaurant not found.
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    CommandNotFound(String),

    /// Entry not in cart.
    #[error("Entry not in cart: {0}")]
    EntryNotInCart(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Option group title not offered by the food.
    #[error("Unknown option \"{option}\" on {food}")]
    UnknownOption { food: String, option: String },

    /// Accompaniment not offered in the option group.
    #[error("Accompaniment {accompaniment} is not offered in option \"{option}\"")]
    UnknownAccompaniment { option: String, accompaniment: String },

    /// Selecting one more unit would exceed the group's capacity.
    #[error("Option \"{option}\" allows at most {capacity} selection(s)")]
    OptionCapacityExceeded { option: String, capacity: u32 },

    /// Food is not one of the menu's allowed foods.
    #[error("Food {food} is not part of menu {menu}")]
    FoodNotInMenu { menu: String, food: String },

    /// Menu saved without any chosen food.
    #[error("Menu {0} has no food selected")]
    EmptyMenu(String),

    /// Item belongs to a different restaurant than the cart.
    #[error("Cart holds items from restaurant {current}, cannot add from {attempted}")]
    RestaurantMismatch { current: String, attempted: String },

    /// Checkout attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout incomplete.
    #[error("Checkout incomplete: missing {0}")]
    CheckoutIncomplete(String),

    /// Restaurant does not accept this kind of order.
    #[error("Restaurant does not accept {0} orders")]
    CommandTypeUnavailable(String),

    /// Invalid checkout phase transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Phone confirmation required before submitting.
    #[error("Phone confirmation required for {0}")]
    ConfirmationRequired(String),

    /// Confirmation code rejected by the backend.
    #[error("Confirmation code rejected")]
    ConfirmationRejected,

    /// Order or confirmation backend failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Cache error.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(feature = "storage")]
impl From<tavola_db::DbError> for CommerceError {
    fn from(e: tavola_db::DbError) -> Self {
        CommerceError::DatabaseError(e.to_string())
    }
}

#[cfg(feature = "storage")]
impl From<tavola_cache::CacheError> for CommerceError {
    fn from(e: tavola_cache::CacheError) -> Self {
        CommerceError::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
