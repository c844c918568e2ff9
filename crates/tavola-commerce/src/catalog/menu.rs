//! Menus: bundles of foods priced per food, at a fixed price, or not at all.

use crate::catalog::Food;
use crate::ids::{FoodId, MenuId, RestaurantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// How a menu is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MenuType {
    /// Sum of the chosen foods and their options.
    #[default]
    PerFood,
    /// Base price plus per-food additional prices.
    FixedPrice,
    /// Never charged.
    Priceless,
}

impl MenuType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuType::PerFood => "per_food",
            MenuType::FixedPrice => "fixed_price",
            MenuType::Priceless => "priceless",
        }
    }
}

/// A food a menu lets the customer pick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuFood {
    pub food: Food,
    /// Supplement charged for this food inside a fixed-price menu.
    #[serde(default)]
    pub additional_price: Money,
}

/// A menu from `GET /menus/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: MenuId,
    pub restaurant: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub menu_type: MenuType,
    /// Base price, only charged for fixed-price menus.
    pub price: Money,
    #[serde(default)]
    pub foods: Vec<MenuFood>,
}

impl Menu {
    pub fn new(
        id: impl Into<MenuId>,
        restaurant: impl Into<RestaurantId>,
        name: impl Into<String>,
        menu_type: MenuType,
        price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            restaurant: restaurant.into(),
            name: name.into(),
            description: None,
            menu_type,
            price,
            foods: Vec::new(),
        }
    }

    /// Offer a food in this menu.
    pub fn with_food(mut self, food: Food, additional_price: Money) -> Self {
        self.foods.push(MenuFood {
            food,
            additional_price,
        });
        self
    }

    /// Find an allowed food.
    pub fn food(&self, id: &FoodId) -> Option<&MenuFood> {
        self.foods.iter().find(|f| &f.food.id == id)
    }

    /// Price a chosen food carries inside this menu.
    ///
    /// Fixed-price menus charge the supplement; other menus charge the food's
    /// own price.
    pub fn price_of(&self, menu_food: &MenuFood) -> Money {
        match self.menu_type {
            MenuType::FixedPrice => menu_food.additional_price,
            MenuType::PerFood | MenuType::Priceless => menu_food.food.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn eur(cents: i64) -> Money {
        Money::new(cents, Currency::EUR)
    }

    #[test]
    fn test_menu_type_wire_names() {
        let menu: Menu = serde_json::from_str(
            r#"{ "id": "m1", "restaurant": "r1", "name": "Lunch",
                 "type": "fixed_price", "price": { "amount": 1500 } }"#,
        )
        .unwrap();
        assert_eq!(menu.menu_type, MenuType::FixedPrice);
        assert_eq!(MenuType::Priceless.as_str(), "priceless");
    }

    #[test]
    fn test_price_of_depends_on_menu_type() {
        let burger = Food::new("f1", "r1", "Burger", eur(1200));
        let fixed = Menu::new("m1", "r1", "Lunch", MenuType::FixedPrice, eur(1500))
            .with_food(burger.clone(), eur(200));
        let per_food = Menu::new("m2", "r1", "Carte", MenuType::PerFood, eur(0))
            .with_food(burger, eur(200));

        let id = FoodId::new("f1");
        assert_eq!(fixed.price_of(fixed.food(&id).unwrap()), eur(200));
        assert_eq!(per_food.price_of(per_food.food(&id).unwrap()), eur(1200));
        assert!(fixed.food(&FoodId::new("nope")).is_none());
    }
}
