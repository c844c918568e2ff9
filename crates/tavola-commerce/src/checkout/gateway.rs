//! Order and confirmation backend seam.

use crate::checkout::Command;
use crate::error::CommerceError;
use crate::ids::CommandId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /commands/sendCode`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendCodeRequest {
    pub phone: String,
}

/// Body of `POST /commands/confirmCode`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmCodeRequest {
    pub phone: String,
    pub code: String,
}

/// Response of `POST /commands/confirmCode`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeVerdict {
    pub valid: bool,
}

impl CodeVerdict {
    pub fn valid() -> Self {
        Self { valid: true }
    }

    pub fn invalid() -> Self {
        Self { valid: false }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Response of `POST /commands`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandReceipt {
    pub id: CommandId,
    pub code: u32,
}

/// Backend that confirms phones and accepts orders.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Ask the backend to send a one-time code to a phone.
    async fn send_code(&self, request: &SendCodeRequest) -> Result<(), CommerceError>;

    /// Check a code the customer typed.
    async fn confirm_code(&self, request: &ConfirmCodeRequest) -> Result<CodeVerdict, CommerceError>;

    /// Post an order; the backend assigns its id and tracking code.
    async fn submit(&self, command: &Command) -> Result<CommandReceipt, CommerceError>;
}

#[async_trait]
impl<T: OrderGateway + ?Sized> OrderGateway for Arc<T> {
    async fn send_code(&self, request: &SendCodeRequest) -> Result<(), CommerceError> {
        (**self).send_code(request).await
    }

    async fn confirm_code(&self, request: &ConfirmCodeRequest) -> Result<CodeVerdict, CommerceError> {
        (**self).confirm_code(request).await
    }

    async fn submit(&self, command: &Command) -> Result<CommandReceipt, CommerceError> {
        (**self).submit(command).await
    }
}
