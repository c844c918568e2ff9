//! Cart pricing calculations.
//!
//! Pure functions over cart entries. All arithmetic is in minor units and
//! saturating; missing nested data contributes zero and nothing here fails.

use crate::cart::entry::{FoodInCart, MenuFoodSelection, MenuInCart};
use crate::cart::option::OptionGroup;
use crate::catalog::{Menu, MenuType, Restaurant};
use crate::ids::CartEntryId;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// How an entry is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Prices as given by the catalog.
    #[default]
    Standard,
    /// Everything is charged zero.
    Priceless,
    /// Menu base price plus per-food supplements.
    FixedPrice,
}

impl PricingMode {
    /// Mode for a food ordered from `restaurant`.
    pub fn for_food(restaurant: &Restaurant) -> Self {
        if restaurant.is_priceless() {
            PricingMode::Priceless
        } else {
            PricingMode::Standard
        }
    }

    /// Mode for a menu ordered from `restaurant`.
    pub fn for_menu(restaurant: &Restaurant, menu: &Menu) -> Self {
        if restaurant.is_priceless() {
            return PricingMode::Priceless;
        }
        match menu.menu_type {
            MenuType::FixedPrice => PricingMode::FixedPrice,
            MenuType::PerFood => PricingMode::Standard,
            MenuType::Priceless => PricingMode::Priceless,
        }
    }

    pub fn is_priceless(&self) -> bool {
        matches!(self, PricingMode::Priceless)
    }
}

/// Σ groups Σ items `quantity × price`.
pub fn estimate_option_price(options: &[OptionGroup]) -> Money {
    let currency = options
        .iter()
        .flat_map(|g| g.items())
        .map(|i| i.accompaniment.price.currency)
        .next()
        .unwrap_or_default();
    Money::new(option_cents(options), currency)
}

fn option_cents(options: &[OptionGroup]) -> i64 {
    options
        .iter()
        .flat_map(|g| g.items())
        .fold(0i64, |acc, item| {
            acc.saturating_add(
                item.accompaniment
                    .price
                    .amount_cents
                    .saturating_mul(i64::from(item.quantity)),
            )
        })
}

/// `(food.price + options) × quantity`, zero when priceless.
pub fn estimate_food_price(food: &FoodInCart, mode: PricingMode) -> Money {
    let currency = food.food.price.currency;
    if mode.is_priceless() {
        return Money::zero(currency);
    }
    let unit = food
        .food
        .price
        .amount_cents
        .saturating_add(option_cents(&food.options));
    Money::new(unit.saturating_mul(i64::from(food.quantity)), currency)
}

fn selections_cents(foods: &[MenuFoodSelection]) -> i64 {
    foods.iter().fold(0i64, |acc, s| {
        acc.saturating_add(s.price.amount_cents.saturating_add(option_cents(&s.options)))
    })
}

/// Menu price under `mode`.
///
/// Fixed-price adds the base price once on top of the quantity-weighted
/// selections; standard mode ignores the base price.
pub fn estimate_menu_price(menu: &MenuInCart, mode: PricingMode) -> Money {
    let currency = menu.menu.price.currency;
    let selections = selections_cents(&menu.foods).saturating_mul(i64::from(menu.quantity));
    match mode {
        PricingMode::Priceless => Money::zero(currency),
        PricingMode::Standard => Money::new(selections, currency),
        PricingMode::FixedPrice => Money::new(
            menu.menu.price.amount_cents.saturating_add(selections),
            currency,
        ),
    }
}

/// Σ food prices + Σ menu prices, each under the entry's own mode.
pub fn estimate_total_price(foods: &[FoodInCart], menus: &[MenuInCart]) -> Money {
    let currency = cart_currency(foods, menus);
    let foods_total = foods
        .iter()
        .fold(0i64, |acc, f| acc.saturating_add(f.price().amount_cents));
    let total = menus
        .iter()
        .fold(foods_total, |acc, m| acc.saturating_add(m.price().amount_cents));
    Money::new(total, currency)
}

fn cart_currency(foods: &[FoodInCart], menus: &[MenuInCart]) -> Currency {
    foods
        .first()
        .map(|f| f.food.price.currency)
        .or_else(|| menus.first().map(|m| m.menu.price.currency))
        .unwrap_or_default()
}

/// Kind of cart entry a pricing line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Food,
    Menu,
}

/// Pricing breakdown for a single cart entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryPricing {
    pub entry_id: CartEntryId,
    pub kind: EntryKind,
    pub name: String,
    pub quantity: u32,
    pub mode: PricingMode,
    /// Options across the entry for one unit.
    pub options_total: Money,
    pub total: Money,
}

impl EntryPricing {
    /// Total divided by quantity.
    pub fn effective_unit_price(&self) -> Money {
        if self.quantity == 0 {
            return self.total;
        }
        Money::new(
            self.total.amount_cents / i64::from(self.quantity),
            self.total.currency,
        )
    }
}

/// Complete pricing breakdown for a cart, for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartPricing {
    pub lines: Vec<EntryPricing>,
    pub total: Money,
    pub priceless: bool,
}

impl CartPricing {
    pub fn compute(foods: &[FoodInCart], menus: &[MenuInCart]) -> Self {
        let food_lines = foods.iter().map(|f| EntryPricing {
            entry_id: f.id.clone(),
            kind: EntryKind::Food,
            name: f.food.name.clone(),
            quantity: f.quantity,
            mode: f.pricing_mode,
            options_total: estimate_option_price(&f.options),
            total: f.price(),
        });
        let menu_lines = menus.iter().map(|m| {
            let groups: Vec<OptionGroup> =
                m.foods.iter().flat_map(|s| s.options.iter().cloned()).collect();
            EntryPricing {
                entry_id: m.id.clone(),
                kind: EntryKind::Menu,
                name: m.menu.name.clone(),
                quantity: m.quantity,
                mode: m.pricing_mode,
                options_total: estimate_option_price(&groups),
                total: m.price(),
            }
        });

        Self {
            lines: food_lines.chain(menu_lines).collect(),
            total: estimate_total_price(foods, menus),
            priceless: foods.iter().any(FoodInCart::is_priceless)
                || menus.iter().any(MenuInCart::is_priceless),
        }
    }

    pub fn line(&self, entry_id: &CartEntryId) -> Option<&EntryPricing> {
        self.lines.iter().find(|l| &l.entry_id == entry_id)
    }
}
