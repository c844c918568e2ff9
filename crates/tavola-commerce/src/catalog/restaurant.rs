//! Restaurant catalog entity.

use crate::checkout::CommandType;
use crate::ids::RestaurantId;
use serde::{Deserialize, Serialize};

/// A restaurant as served by `GET /restaurants/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// False when the restaurant hides its prices (priceless mode).
    #[serde(default = "default_true")]
    pub show_price: bool,
    #[serde(default = "default_true")]
    pub delivery: bool,
    #[serde(default = "default_true")]
    pub on_site: bool,
    #[serde(default = "default_true")]
    pub takeaway: bool,
    #[serde(default)]
    pub opening_hours: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Restaurant {
    /// Create a restaurant that shows prices and accepts every order type.
    pub fn new(id: impl Into<RestaurantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            address: String::new(),
            city: String::new(),
            phone: None,
            image: None,
            show_price: true,
            delivery: true,
            on_site: true,
            takeaway: true,
            opening_hours: None,
        }
    }

    /// Whether the restaurant runs in priceless mode.
    pub fn is_priceless(&self) -> bool {
        !self.show_price
    }

    /// Whether orders of this kind are accepted.
    pub fn accepts(&self, command_type: CommandType) -> bool {
        match command_type {
            CommandType::Delivery => self.delivery,
            CommandType::OnSite => self.on_site,
            CommandType::Takeaway => self.takeaway,
        }
    }

    /// The order types this restaurant accepts, in display order.
    pub fn command_types(&self) -> Vec<CommandType> {
        [CommandType::Delivery, CommandType::OnSite, CommandType::Takeaway]
            .into_iter()
            .filter(|t| self.accepts(*t))
            .collect()
    }
}
