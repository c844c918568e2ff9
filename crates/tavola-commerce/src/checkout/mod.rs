//! Checkout module.
//!
//! Order documents, checkout form answers, the gateway seam to the order
//! backend, the confirmation/submission session and, with the `storage`
//! feature, the in-process order desk.

mod command;
#[cfg(feature = "storage")]
mod desk;
mod form;
mod gateway;
mod session;

pub use command::{
    Command, CommandFood, CommandMenu, CommandMenuFood, CommandType, Customer, DeliveryDetails,
    DeliveryTiming, DoorOption, PaymentInfo, PaymentMethod, PaymentStatus,
};
#[cfg(feature = "storage")]
pub use desk::{CodeNotifier, LogNotifier, MemoryNotifier, OrderDesk, COMMANDS, CONFIRMATION_CODES};
pub use form::CheckoutForm;
pub use gateway::{CodeVerdict, CommandReceipt, ConfirmCodeRequest, OrderGateway, SendCodeRequest};
pub use session::{CheckoutPhase, CheckoutSession, ConfirmationLine, OrderConfirmation};
