//! Checkout form answers.

use crate::catalog::Restaurant;
use crate::checkout::command::{needs_confirmation, CommandType, Customer, DeliveryDetails, PaymentMethod};
use serde::{Deserialize, Serialize};

/// What the customer filled in at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub customer: Customer,
    pub command_type: CommandType,
    #[serde(default)]
    pub delivery: Option<DeliveryDetails>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub comment: Option<String>,
    /// Order types the restaurant accepts.
    #[serde(default = "all_command_types")]
    pub available: Vec<CommandType>,
}

fn all_command_types() -> Vec<CommandType> {
    vec![CommandType::Delivery, CommandType::OnSite, CommandType::Takeaway]
}

impl CheckoutForm {
    pub fn new(customer: Customer, command_type: CommandType) -> Self {
        Self {
            customer,
            command_type,
            delivery: None,
            payment_method: PaymentMethod::default(),
            comment: None,
            available: all_command_types(),
        }
    }

    /// Restrict order types to what `restaurant` accepts.
    pub fn for_restaurant(mut self, restaurant: &Restaurant) -> Self {
        self.available = restaurant.command_types();
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryDetails) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_payment(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = (!comment.trim().is_empty()).then_some(comment);
        self
    }

    pub fn phone(&self) -> Option<&str> {
        self.customer.phone()
    }

    /// Guests and delivery/takeaway orders need phone confirmation.
    pub fn requires_confirmation(&self) -> bool {
        needs_confirmation(&self.customer, self.command_type)
    }

    /// Fields still missing before an order can be built.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if let Customer::Guest { name, .. } = &self.customer {
            if name.trim().is_empty() {
                missing.push("name");
            }
        }
        if self.requires_confirmation() && self.phone().is_none() {
            missing.push("phone number");
        }
        if self.command_type == CommandType::Delivery
            && !self.delivery.as_ref().map(|d| d.is_complete()).unwrap_or(false)
        {
            missing.push("delivery address");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}
