//! Checkout state machine: phone confirmation gate and order submission.

use crate::cart::{CartPersistence, CartState, CartStore, OptionGroup};
use crate::checkout::{
    CheckoutForm, Command, CommandReceipt, CommandType, ConfirmCodeRequest, OrderGateway,
    SendCodeRequest,
};
use crate::error::CommerceError;
use crate::ids::{CommandId, RestaurantId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Phases of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// Nothing sent yet, or a previous attempt failed.
    #[default]
    Idle,
    /// A code was sent and the customer has to type it.
    AwaitingCode,
    /// The order request is on the wire.
    InFlight,
    /// The order was accepted.
    Settled,
}

impl CheckoutPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutPhase::Idle => "idle",
            CheckoutPhase::AwaitingCode => "awaiting_code",
            CheckoutPhase::InFlight => "in_flight",
            CheckoutPhase::Settled => "settled",
        }
    }

    pub fn can_transition_to(&self, next: CheckoutPhase) -> bool {
        use CheckoutPhase::*;
        matches!(
            (self, next),
            (Idle, AwaitingCode)
                | (Idle, InFlight)
                | (AwaitingCode, AwaitingCode)
                | (AwaitingCode, InFlight)
                | (AwaitingCode, Idle)
                | (InFlight, Settled)
                | (InFlight, Idle)
                | (Settled, Idle)
        )
    }
}

/// One line of the confirmation view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationLine {
    pub name: String,
    pub quantity: u32,
    pub total: Money,
    /// Picked accompaniments, or chosen foods for a menu.
    pub details: Vec<String>,
}

/// Display snapshot handed back once an order is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderConfirmation {
    pub command_id: CommandId,
    pub code: u32,
    pub restaurant: RestaurantId,
    pub command_type: CommandType,
    pub total_price: Money,
    pub priceless: bool,
    pub lines: Vec<ConfirmationLine>,
    pub delivery_address: Option<String>,
    pub placed_at: DateTime<Utc>,
}

fn option_names(options: &[OptionGroup]) -> Vec<String> {
    options
        .iter()
        .flat_map(|g| g.items())
        .map(|i| match i.quantity {
            1 => i.accompaniment.name.clone(),
            n => format!("{} x{}", i.accompaniment.name, n),
        })
        .collect()
}

impl OrderConfirmation {
    fn build(cart: &CartState, command: &Command, receipt: &CommandReceipt) -> Self {
        let foods = cart.foods.iter().map(|f| ConfirmationLine {
            name: f.food.name.clone(),
            quantity: f.quantity,
            total: f.price(),
            details: option_names(&f.options),
        });
        let menus = cart.menus.iter().map(|m| ConfirmationLine {
            name: m.menu.name.clone(),
            quantity: m.quantity,
            total: m.price(),
            details: m.foods.iter().map(|s| s.food.name.clone()).collect(),
        });

        Self {
            command_id: receipt.id.clone(),
            code: receipt.code,
            restaurant: command.restaurant.clone(),
            command_type: command.command_type,
            total_price: command.total_price,
            priceless: command.priceless,
            lines: foods.chain(menus).collect(),
            delivery_address: command.delivery.as_ref().map(|d| d.one_line()),
            placed_at: command.created_at,
        }
    }

    /// Tracking code as shown to the customer.
    pub fn display_code(&self) -> String {
        format!("{:06}", self.code)
    }
}

/// Drives one customer through confirmation and submission.
pub struct CheckoutSession<G: OrderGateway> {
    gateway: G,
    phase: CheckoutPhase,
    /// Phone the current code was sent to.
    code_phone: Option<String>,
}

impl<G: OrderGateway> CheckoutSession<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            phase: CheckoutPhase::Idle,
            code_phone: None,
        }
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Whether `form` has to go through the code step.
    pub fn requires_confirmation(form: &CheckoutForm) -> bool {
        form.requires_confirmation()
    }

    fn transition(&mut self, next: CheckoutPhase) -> Result<(), CommerceError> {
        if !self.phase.can_transition_to(next) {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.phase.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    fn fail(&mut self) {
        self.phase = CheckoutPhase::Idle;
        self.code_phone = None;
    }

    /// Start over after a settled order.
    pub fn restart(&mut self) -> Result<(), CommerceError> {
        self.transition(CheckoutPhase::Idle)?;
        self.code_phone = None;
        Ok(())
    }

    /// Send a one-time code to the form's phone. Calling again resends.
    pub async fn request_code(&mut self, form: &CheckoutForm) -> Result<(), CommerceError> {
        let phone = form
            .phone()
            .ok_or_else(|| CommerceError::CheckoutIncomplete("phone number".to_string()))?
            .to_string();
        if !self.phase.can_transition_to(CheckoutPhase::AwaitingCode) {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.phase.as_str().to_string(),
                to: CheckoutPhase::AwaitingCode.as_str().to_string(),
            });
        }

        let request = SendCodeRequest {
            phone: phone.clone(),
        };
        if let Err(e) = self.gateway.send_code(&request).await {
            warn!(error = %e, "sending confirmation code failed");
            self.fail();
            return Err(e);
        }

        self.transition(CheckoutPhase::AwaitingCode)?;
        self.code_phone = Some(phone);
        info!("confirmation code sent");
        Ok(())
    }

    /// Verify `code`, then post the order if the backend says it is valid.
    ///
    /// An invalid code returns `ConfirmationRejected` and the session goes
    /// back to `Idle`; a new code has to be requested.
    pub async fn confirm_and_submit<P: CartPersistence>(
        &mut self,
        store: &mut CartStore<P>,
        form: &CheckoutForm,
        code: &str,
    ) -> Result<OrderConfirmation, CommerceError> {
        if self.phase != CheckoutPhase::AwaitingCode {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.phase.as_str().to_string(),
                to: CheckoutPhase::InFlight.as_str().to_string(),
            });
        }
        let command = Command::from_cart(store.state(), form)?;

        let phone = self.code_phone.clone().unwrap_or_default();
        if form.phone() != Some(phone.as_str()) {
            self.fail();
            return Err(CommerceError::ValidationError(
                "phone number changed since the code was sent".to_string(),
            ));
        }

        let request = ConfirmCodeRequest {
            phone,
            code: code.trim().to_string(),
        };
        let verdict = match self.gateway.confirm_code(&request).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(error = %e, "confirming code failed");
                self.fail();
                return Err(e);
            }
        };
        if !verdict.is_valid() {
            info!("confirmation code rejected");
            self.fail();
            return Err(CommerceError::ConfirmationRejected);
        }

        self.post(store, command).await
    }

    /// Post an order that needs no confirmation.
    pub async fn submit<P: CartPersistence>(
        &mut self,
        store: &mut CartStore<P>,
        form: &CheckoutForm,
    ) -> Result<OrderConfirmation, CommerceError> {
        if form.requires_confirmation() {
            return Err(CommerceError::ConfirmationRequired(
                form.command_type.as_str().to_string(),
            ));
        }
        if self.phase != CheckoutPhase::Idle {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.phase.as_str().to_string(),
                to: CheckoutPhase::InFlight.as_str().to_string(),
            });
        }
        let command = Command::from_cart(store.state(), form)?;
        self.post(store, command).await
    }

    async fn post<P: CartPersistence>(
        &mut self,
        store: &mut CartStore<P>,
        command: Command,
    ) -> Result<OrderConfirmation, CommerceError> {
        self.transition(CheckoutPhase::InFlight)?;
        info!(
            restaurant = %command.restaurant,
            command_type = command.command_type.as_str(),
            total = command.total_price.amount_cents,
            "submitting order"
        );

        let receipt = match self.gateway.submit(&command).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, "order submission failed");
                self.fail();
                return Err(e);
            }
        };

        let confirmation = OrderConfirmation::build(store.state(), &command, &receipt);
        self.transition(CheckoutPhase::Settled)?;
        self.code_phone = None;
        if let Err(e) = store.reset() {
            warn!(error = %e, "order accepted but the cart could not be cleared");
        }
        info!(command = %receipt.id, code = receipt.code, "order accepted");
        Ok(confirmation)
    }
}
