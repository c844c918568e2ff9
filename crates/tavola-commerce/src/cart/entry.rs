//! Cart entries: configured foods and menus.

use crate::cart::option::OptionGroup;
use crate::cart::pricing::{self, PricingMode};
use crate::catalog::{Food, Menu};
use crate::ids::{CartEntryId, FoodId, MenuId, RestaurantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A configured food sitting in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodInCart {
    /// Cart-local id, distinct per configuration.
    pub id: CartEntryId,
    pub food: Food,
    pub quantity: u32,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub pricing_mode: PricingMode,
}

impl FoodInCart {
    pub fn catalog_id(&self) -> &FoodId {
        &self.food.id
    }

    pub fn restaurant(&self) -> &RestaurantId {
        &self.food.restaurant
    }

    pub fn option(&self, title: &str) -> Option<&OptionGroup> {
        self.options.iter().find(|o| o.title() == title)
    }

    /// Line total under the entry's own pricing mode.
    pub fn price(&self) -> Money {
        pricing::estimate_food_price(self, self.pricing_mode)
    }

    /// Whether this entry makes the cart priceless.
    pub fn is_priceless(&self) -> bool {
        self.pricing_mode == PricingMode::Priceless || self.food.price.is_zero()
    }
}

/// A food chosen inside a menu, with its own options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuFoodSelection {
    pub food: Food,
    /// Additional price for fixed-price menus, the food's price otherwise.
    pub price: Money,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
}

impl MenuFoodSelection {
    pub fn option(&self, title: &str) -> Option<&OptionGroup> {
        self.options.iter().find(|o| o.title() == title)
    }
}

/// A configured menu sitting in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuInCart {
    pub id: CartEntryId,
    pub menu: Menu,
    pub quantity: u32,
    #[serde(default)]
    pub foods: Vec<MenuFoodSelection>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub pricing_mode: PricingMode,
}

impl MenuInCart {
    pub fn catalog_id(&self) -> &MenuId {
        &self.menu.id
    }

    pub fn restaurant(&self) -> &RestaurantId {
        &self.menu.restaurant
    }

    pub fn selection(&self, food: &FoodId) -> Option<&MenuFoodSelection> {
        self.foods.iter().find(|s| &s.food.id == food)
    }

    pub fn price(&self) -> Money {
        pricing::estimate_menu_price(self, self.pricing_mode)
    }

    /// Per-food menus routinely carry a zero base price, so only the mode
    /// counts here.
    pub fn is_priceless(&self) -> bool {
        self.pricing_mode == PricingMode::Priceless
    }
}
