//! The order document posted to `POST /commands`.

use crate::cart::{CartState, FoodInCart, MenuInCart, OptionGroup};
use crate::checkout::CheckoutForm;
use crate::error::CommerceError;
use crate::ids::{AccompanimentId, CommandId, FoodId, MenuId, RestaurantId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Delivery,
    #[default]
    OnSite,
    Takeaway,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Delivery => "delivery",
            CommandType::OnSite => "on_site",
            CommandType::Takeaway => "takeaway",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CommandType::Delivery => "Delivery",
            CommandType::OnSite => "On site",
            CommandType::Takeaway => "Takeaway",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "delivery" => Some(CommandType::Delivery),
            "on_site" | "onsite" => Some(CommandType::OnSite),
            "takeaway" => Some(CommandType::Takeaway),
            _ => None,
        }
    }
}

/// Who placed the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Customer {
    User {
        id: UserId,
        #[serde(default)]
        phone: Option<String>,
    },
    Guest {
        name: String,
        phone: String,
        #[serde(default)]
        email: Option<String>,
    },
}

impl Customer {
    pub fn guest(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Customer::Guest {
            name: name.into(),
            phone: phone.into(),
            email: None,
        }
    }

    pub fn user(id: impl Into<UserId>) -> Self {
        Customer::User {
            id: id.into(),
            phone: None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Customer::Guest { .. })
    }

    /// Phone number to confirm, if one is known.
    pub fn phone(&self) -> Option<&str> {
        let phone = match self {
            Customer::User { phone, .. } => phone.as_deref(),
            Customer::Guest { phone, .. } => Some(phone.as_str()),
        };
        phone.map(str::trim).filter(|p| !p.is_empty())
    }
}

/// How the courier gets in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DoorOption {
    #[default]
    Ring,
    Knock,
    LeaveAtDoor,
    MeetOutside,
}

/// When a delivery should arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryTiming {
    #[default]
    Asap,
    Scheduled { at: DateTime<Utc> },
}

/// Address sub-document, required for deliveries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub apartment: Option<String>,
    #[serde(default)]
    pub door: DoorOption,
    #[serde(default)]
    pub timing: DeliveryTiming,
}

impl DeliveryDetails {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.address.trim().is_empty()
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address.clone()];
        if let Some(ref floor) = self.floor {
            parts.push(format!("floor {}", floor));
        }
        if let Some(ref apartment) = self.apartment {
            parts.push(format!("apt {}", apartment));
        }
        if let Some(ref city) = self.city {
            parts.push(city.clone());
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Online => "online",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "online" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

/// Payment sub-state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

/// A food line reduced to catalog ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandFood {
    pub food: FoodId,
    pub quantity: u32,
    /// One id per picked unit.
    #[serde(default)]
    pub accompaniments: Vec<AccompanimentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A food chosen inside a menu line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandMenuFood {
    pub food: FoodId,
    #[serde(default)]
    pub accompaniments: Vec<AccompanimentId>,
}

/// A menu line reduced to catalog ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandMenu {
    pub menu: MenuId,
    pub quantity: u32,
    pub foods: Vec<CommandMenuFood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn picked(options: &[OptionGroup]) -> Vec<AccompanimentId> {
    options.iter().flat_map(|g| g.accompaniment_ids()).collect()
}

impl From<&FoodInCart> for CommandFood {
    fn from(entry: &FoodInCart) -> Self {
        Self {
            food: entry.food.id.clone(),
            quantity: entry.quantity,
            accompaniments: picked(&entry.options),
            comment: entry.comment.clone(),
        }
    }
}

impl From<&MenuInCart> for CommandMenu {
    fn from(entry: &MenuInCart) -> Self {
        Self {
            menu: entry.menu.id.clone(),
            quantity: entry.quantity,
            foods: entry
                .foods
                .iter()
                .map(|s| CommandMenuFood {
                    food: s.food.id.clone(),
                    accompaniments: picked(&s.options),
                })
                .collect(),
            comment: entry.comment.clone(),
        }
    }
}

/// An order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Assigned by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommandId>,
    /// Tracking code, assigned by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    pub restaurant: RestaurantId,
    pub customer: Customer,
    pub foods: Vec<CommandFood>,
    pub menus: Vec<CommandMenu>,
    pub command_type: CommandType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryDetails>,
    pub total_price: Money,
    #[serde(default)]
    pub priceless: bool,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Command {
    /// Map the cart and the checkout answers into an order.
    pub fn from_cart(cart: &CartState, form: &CheckoutForm) -> Result<Self, CommerceError> {
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        let restaurant = cart
            .restaurant
            .clone()
            .ok_or_else(|| CommerceError::ValidationError("cart has no restaurant".to_string()))?;

        if !form.available.contains(&form.command_type) {
            return Err(CommerceError::CommandTypeUnavailable(
                form.command_type.as_str().to_string(),
            ));
        }
        let missing = form.missing();
        if !missing.is_empty() {
            return Err(CommerceError::CheckoutIncomplete(missing.join(", ")));
        }

        let delivery = match form.command_type {
            CommandType::Delivery => form.delivery.clone(),
            CommandType::OnSite | CommandType::Takeaway => None,
        };

        Ok(Self {
            id: None,
            code: None,
            restaurant,
            customer: form.customer.clone(),
            foods: cart.foods.iter().map(CommandFood::from).collect(),
            menus: cart.menus.iter().map(CommandMenu::from).collect(),
            command_type: form.command_type,
            delivery,
            total_price: cart.total_price,
            priceless: cart.priceless,
            payment: PaymentInfo {
                method: form.payment_method,
                status: PaymentStatus::Pending,
            },
            confirmed: false,
            validated: false,
            revoked: false,
            comment: form.comment.clone(),
            created_at: Utc::now(),
        })
    }

    /// Guests and delivery/takeaway orders need phone confirmation.
    pub fn requires_confirmation(&self) -> bool {
        needs_confirmation(&self.customer, self.command_type)
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty() && self.menus.is_empty()
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> u64 {
        self.foods
            .iter()
            .map(|f| u64::from(f.quantity))
            .chain(self.menus.iter().map(|m| u64::from(m.quantity)))
            .sum()
    }
}

pub(crate) fn needs_confirmation(customer: &Customer, command_type: CommandType) -> bool {
    customer.is_guest() || matches!(command_type, CommandType::Delivery | CommandType::Takeaway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartStore, FoodBuilder, MemoryCartStorage, MenuBuilder, PricingMode};
    use crate::catalog::{Accompaniment, Food, FoodOption, Menu, MenuType};
    use crate::money::Currency;

    fn eur(cents: i64) -> Money {
        Money::new(cents, Currency::EUR)
    }

    fn cart() -> CartState {
        let burger = Food::new("burger", "r1", "Burger", eur(1000)).with_option(FoodOption::new(
            "Extras",
            3,
            vec![Accompaniment::new("cheese", "Cheese", eur(200))],
        ));
        let mut food = FoodBuilder::new(burger.clone(), PricingMode::Standard);
        food.increment_option_item("Extras", &AccompanimentId::new("cheese")).unwrap();
        food.increment_option_item("Extras", &AccompanimentId::new("cheese")).unwrap();

        let menu = Menu::new("lunch", "r1", "Lunch", MenuType::FixedPrice, eur(1500))
            .with_food(burger, eur(300));
        let mut menu = MenuBuilder::new(menu, PricingMode::FixedPrice);
        menu.select_food(&FoodId::new("burger")).unwrap();

        let mut store = CartStore::open(MemoryCartStorage::new()).unwrap();
        store.add_food(food.save().unwrap()).unwrap();
        store.add_menu(menu.save().unwrap()).unwrap();
        store.state().clone()
    }

    #[test]
    fn test_from_cart_reduces_to_ids() {
        let form = CheckoutForm::new(Customer::user("u1"), CommandType::OnSite);
        let command = Command::from_cart(&cart(), &form).unwrap();

        assert_eq!(command.restaurant, RestaurantId::new("r1"));
        assert_eq!(command.foods[0].food, FoodId::new("burger"));
        assert_eq!(command.foods[0].accompaniments.len(), 2);
        assert_eq!(command.menus[0].foods[0].food, FoodId::new("burger"));
        assert_eq!(command.total_price, eur(1400 + 1800));
        assert!(command.delivery.is_none());
        assert!(!command.requires_confirmation());
    }

    #[test]
    fn test_from_cart_rejects_empty_cart() {
        let form = CheckoutForm::new(Customer::user("u1"), CommandType::OnSite);
        assert!(matches!(
            Command::from_cart(&CartState::default(), &form),
            Err(CommerceError::EmptyCart)
        ));
    }

    #[test]
    fn test_delivery_needs_address() {
        let form = CheckoutForm::new(Customer::guest("Ana", "0612345678"), CommandType::Delivery);
        assert!(matches!(
            Command::from_cart(&cart(), &form),
            Err(CommerceError::CheckoutIncomplete(_))
        ));

        let form = form.with_delivery(DeliveryDetails::new("12 rue de la Paix"));
        let command = Command::from_cart(&cart(), &form).unwrap();
        assert!(command.requires_confirmation());
        assert_eq!(command.delivery.unwrap().timing, DeliveryTiming::Asap);
    }

    #[test]
    fn test_guest_needs_phone() {
        let form = CheckoutForm::new(Customer::guest("Ana", "  "), CommandType::OnSite);
        let err = Command::from_cart(&cart(), &form).unwrap_err();
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn test_command_type_must_be_accepted() {
        let mut restaurant = crate::catalog::Restaurant::new("r1", "Chez Nous");
        restaurant.takeaway = false;
        let form = CheckoutForm::new(Customer::user("u1"), CommandType::Takeaway)
            .for_restaurant(&restaurant);
        assert!(matches!(
            Command::from_cart(&cart(), &form),
            Err(CommerceError::CommandTypeUnavailable(_))
        ));
    }

    #[test]
    fn test_wire_shape() {
        let form = CheckoutForm::new(Customer::guest("Ana", "0612345678"), CommandType::Takeaway);
        let command = Command::from_cart(&cart(), &form).unwrap();
        let json = serde_json::to_value(&command).unwrap();

        assert_eq!(json["commandType"], "takeaway");
        assert_eq!(json["customer"]["kind"], "guest");
        assert_eq!(json["totalPrice"]["amount"], 3200);
        assert_eq!(json["payment"]["method"], "cash");
        assert!(json.get("code").is_none());

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_command_type_names() {
        assert_eq!(CommandType::from_name("on-site"), Some(CommandType::OnSite));
        assert_eq!(CommandType::from_name("Delivery"), Some(CommandType::Delivery));
        assert_eq!(CommandType::from_name("drive"), None);
    }
}
