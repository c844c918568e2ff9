//! Foods and the accompaniments they can be configured with.

use crate::ids::{AccompanimentId, FoodAttributeId, FoodId, RestaurantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A selectable extra (sauce, side, drink size...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Accompaniment {
    pub id: AccompanimentId,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub obligatory: bool,
}

impl Accompaniment {
    pub fn new(id: impl Into<AccompanimentId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
            obligatory: false,
        }
    }
}

/// A descriptive tag on a food (allergen, diet, spiciness).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodAttribute {
    pub id: FoodAttributeId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// An option group offered by a food, e.g. "Sauce" with up to two picks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodOption {
    pub title: String,
    /// 0 or 1 means single-select; above 1 caps the total picked units.
    #[serde(default)]
    pub max_options: u32,
    #[serde(default)]
    pub items: Vec<Accompaniment>,
}

impl FoodOption {
    pub fn new(title: impl Into<String>, max_options: u32, items: Vec<Accompaniment>) -> Self {
        Self {
            title: title.into(),
            max_options,
            items,
        }
    }

    /// Find an offered accompaniment.
    pub fn item(&self, id: &AccompanimentId) -> Option<&Accompaniment> {
        self.items.iter().find(|a| &a.id == id)
    }
}

/// A food from `GET /foods`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: FoodId,
    pub restaurant: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    /// Free-form category label ("Starters", "Pizzas").
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub attributes: Vec<FoodAttributeId>,
    #[serde(default)]
    pub options: Vec<FoodOption>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Food {
    pub fn new(
        id: impl Into<FoodId>,
        restaurant: impl Into<RestaurantId>,
        name: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            restaurant: restaurant.into(),
            name: name.into(),
            description: None,
            price,
            image: None,
            category: None,
            attributes: Vec::new(),
            options: Vec::new(),
            available: true,
        }
    }

    /// Attach an option group.
    pub fn with_option(mut self, option: FoodOption) -> Self {
        self.options.push(option);
        self
    }

    /// Find an option group by title.
    pub fn option(&self, title: &str) -> Option<&FoodOption> {
        self.options.iter().find(|o| o.title == title)
    }

    /// Option groups that contain an obligatory accompaniment.
    pub fn required_options(&self) -> impl Iterator<Item = &FoodOption> {
        self.options
            .iter()
            .filter(|o| o.items.iter().any(|a| a.obligatory))
    }
}
