//! In-process order backend.
//!
//! [`OrderDesk`] plays the server side of the confirmation and order APIs on
//! top of the document store: it issues one-time phone codes, accepts
//! orders and assigns tracking codes.

use crate::checkout::{
    CodeVerdict, Command, CommandReceipt, ConfirmCodeRequest, OrderGateway, SendCodeRequest,
};
use crate::error::CommerceError;
use crate::ids::{CommandId, RestaurantId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tavola_db::{Db, DbError, Filter};
use tracing::{debug, info, warn};

/// Collection holding accepted orders.
pub const COMMANDS: &str = "commands";
/// Collection holding pending phone codes.
pub const CONFIRMATION_CODES: &str = "confirmation_codes";

const CODE_TTL_MINUTES: i64 = 10;
const MAX_ATTEMPTS: u32 = 5;
const TRACKING_CODE_TRIES: usize = 32;

/// Delivers a one-time code to a phone.
pub trait CodeNotifier: Send + Sync {
    fn deliver(&self, phone: &str, code: &str) -> Result<(), CommerceError>;
}

impl<T: CodeNotifier + ?Sized> CodeNotifier for Arc<T> {
    fn deliver(&self, phone: &str, code: &str) -> Result<(), CommerceError> {
        (**self).deliver(phone, code)
    }
}

/// Writes codes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl CodeNotifier for LogNotifier {
    fn deliver(&self, phone: &str, code: &str) -> Result<(), CommerceError> {
        info!(phone, code, "confirmation code issued");
        Ok(())
    }
}

/// Keeps delivered codes in memory so they can be read back.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code sent to `phone`.
    pub fn last_code_for(&self, phone: &str) -> Option<String> {
        let phone = normalize_phone(phone);
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(p, _)| *p == phone)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl CodeNotifier for MemoryNotifier {
    fn deliver(&self, phone: &str, code: &str) -> Result<(), CommerceError> {
        self.sent
            .lock()
            .map_err(|_| CommerceError::Gateway("notifier lock poisoned".to_string()))?
            .push((normalize_phone(phone), code.to_string()));
        Ok(())
    }
}

/// A pending or verified phone code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct CodeRecord {
    phone: String,
    code: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
    verified: bool,
}

fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Order backend over [`Db`].
pub struct OrderDesk<N: CodeNotifier = LogNotifier> {
    db: Db,
    notifier: N,
    code_ttl: Duration,
    assign: Mutex<()>,
}

impl<N: CodeNotifier> OrderDesk<N> {
    pub fn new(db: Db, notifier: N) -> Self {
        Self {
            db,
            notifier,
            code_ttl: Duration::minutes(CODE_TTL_MINUTES),
            assign: Mutex::new(()),
        }
    }

    /// Override how long a code stays valid.
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Issue a fresh 4-digit code, replacing any pending one.
    pub fn issue_code(&self, phone: &str) -> Result<(), CommerceError> {
        let phone = normalize_phone(phone);
        if phone.is_empty() {
            return Err(CommerceError::ValidationError("phone number is empty".to_string()));
        }
        let code = format!("{:04}", rand::thread_rng().gen_range(0..10_000));
        let record = CodeRecord {
            phone: phone.clone(),
            code: code.clone(),
            expires_at: Utc::now() + self.code_ttl,
            attempts: 0,
            verified: false,
        };
        self.db.upsert(CONFIRMATION_CODES, &phone, &record)?;
        self.notifier.deliver(&phone, &code)?;
        debug!(phone = %phone, "code stored");
        Ok(())
    }

    /// Check a code. A code verifies at most once.
    pub fn verify_code(&self, phone: &str, code: &str) -> Result<CodeVerdict, CommerceError> {
        let phone = normalize_phone(phone);
        let Some(record) = self.db.get::<CodeRecord>(CONFIRMATION_CODES, &phone)? else {
            return Ok(CodeVerdict::invalid());
        };

        if record.verified {
            return Ok(CodeVerdict::invalid());
        }
        if Utc::now() > record.expires_at {
            self.db.delete(CONFIRMATION_CODES, &phone)?;
            debug!(phone = %phone, "code expired");
            return Ok(CodeVerdict::invalid());
        }
        if record.code != code.trim() {
            let record: CodeRecord = self.db.update(CONFIRMATION_CODES, &phone, |r: &mut CodeRecord| {
                r.attempts += 1;
            })?;
            if record.attempts >= MAX_ATTEMPTS {
                warn!(phone = %phone, "too many wrong codes, dropping");
                self.db.delete(CONFIRMATION_CODES, &phone)?;
            }
            return Ok(CodeVerdict::invalid());
        }

        let _: CodeRecord =
            self.db
                .update(CONFIRMATION_CODES, &phone, |r: &mut CodeRecord| r.verified = true)?;
        Ok(CodeVerdict::valid())
    }

    /// Whether `phone` holds a verified confirmation.
    fn is_confirmed(&self, phone: &str) -> Result<bool, CommerceError> {
        let phone = normalize_phone(phone);
        Ok(self
            .db
            .get::<CodeRecord>(CONFIRMATION_CODES, &phone)?
            .map(|record| record.verified)
            .unwrap_or(false))
    }

    fn consume_confirmation(&self, phone: &str) -> Result<(), CommerceError> {
        self.db.delete(CONFIRMATION_CODES, &normalize_phone(phone))?;
        Ok(())
    }

    /// Store an order and hand back its id and tracking code.
    pub fn accept(&self, command: &Command) -> Result<CommandReceipt, CommerceError> {
        let _guard = self
            .assign
            .lock()
            .map_err(|_| CommerceError::Gateway("order desk lock poisoned".to_string()))?;
        let code = self.unused_tracking_code()?;
        self.store_command(command, code)
    }

    /// Store `command` under `code`. The caller holds `assign`.
    ///
    /// A gated command's confirmation is consumed only once the order is
    /// stored.
    fn store_command(&self, command: &Command, code: u32) -> Result<CommandReceipt, CommerceError> {
        if command.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let mut command = command.clone();
        let confirmed_phone = if command.requires_confirmation() {
            let phone = command
                .customer
                .phone()
                .map(str::to_string)
                .ok_or_else(|| {
                    CommerceError::ConfirmationRequired(command.command_type.as_str().to_string())
                })?;
            if !self.is_confirmed(&phone)? {
                return Err(CommerceError::ConfirmationRequired(
                    command.command_type.as_str().to_string(),
                ));
            }
            command.confirmed = true;
            Some(phone)
        } else {
            None
        };

        if self.db.count(COMMANDS, Some(&Filter::eq("code", code)))? > 0 {
            return Err(CommerceError::Gateway(format!(
                "tracking code {code} already in use"
            )));
        }
        let id = CommandId::generate();
        command.id = Some(id.clone());
        command.code = Some(code);
        self.db.insert(COMMANDS, id.as_str(), &command)?;
        if let Some(phone) = confirmed_phone {
            self.consume_confirmation(&phone)?;
        }

        info!(command = %id, code, restaurant = %command.restaurant, "order stored");
        Ok(CommandReceipt { id, code })
    }

    fn unused_tracking_code(&self) -> Result<u32, CommerceError> {
        let mut rng = rand::thread_rng();
        for _ in 0..TRACKING_CODE_TRIES {
            let code: u32 = rng.gen_range(100_000..1_000_000);
            if self.db.count(COMMANDS, Some(&Filter::eq("code", code)))? == 0 {
                return Ok(code);
            }
        }
        Err(CommerceError::Gateway("no free tracking code".to_string()))
    }

    /// Look an order up by its tracking code.
    pub fn find_by_code(&self, code: u32) -> Result<Command, CommerceError> {
        self.db
            .find_one(COMMANDS, &Filter::eq("code", code))
            .map_err(|e| match e {
                DbError::NotFound => CommerceError::CommandNotFound(code.to_string()),
                other => other.into(),
            })
    }

    pub fn get(&self, id: &CommandId) -> Result<Command, CommerceError> {
        self.db
            .get(COMMANDS, id.as_str())?
            .ok_or_else(|| CommerceError::CommandNotFound(id.to_string()))
    }

    /// Orders placed at a restaurant, oldest first.
    pub fn commands_for(&self, restaurant: &RestaurantId) -> Result<Vec<Command>, CommerceError> {
        let filter = Filter::eq("restaurant", restaurant.as_str());
        let mut commands: Vec<Command> = self.db.find_as(COMMANDS, Some(&filter))?;
        commands.sort_by_key(|c| c.created_at);
        Ok(commands)
    }
}

#[async_trait]
impl<N: CodeNotifier> OrderGateway for OrderDesk<N> {
    async fn send_code(&self, request: &SendCodeRequest) -> Result<(), CommerceError> {
        self.issue_code(&request.phone)
    }

    async fn confirm_code(&self, request: &ConfirmCodeRequest) -> Result<CodeVerdict, CommerceError> {
        self.verify_code(&request.phone, &request.code)
    }

    async fn submit(&self, command: &Command) -> Result<CommandReceipt, CommerceError> {
        self.accept(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{CommandFood, CommandType, Customer, PaymentInfo};
    use crate::ids::FoodId;
    use crate::money::Money;

    fn desk() -> OrderDesk<Arc<MemoryNotifier>> {
        OrderDesk::new(Db::open_default().unwrap(), Arc::new(MemoryNotifier::new()))
    }

    fn command(customer: Customer, command_type: CommandType) -> Command {
        Command {
            id: None,
            code: None,
            restaurant: RestaurantId::new("r1"),
            customer,
            foods: vec![CommandFood {
                food: FoodId::new("f1"),
                quantity: 1,
                accompaniments: vec![],
                comment: None,
            }],
            menus: vec![],
            command_type,
            delivery: None,
            total_price: Money::default(),
            priceless: false,
            payment: PaymentInfo::default(),
            confirmed: false,
            validated: false,
            revoked: false,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_code_verifies_once() {
        let desk = desk();
        desk.issue_code("06 12 34 56 78").unwrap();
        let code = desk.notifier().last_code_for("0612345678").unwrap();
        assert_eq!(code.len(), 4);

        assert!(desk.verify_code("0612345678", &code).unwrap().is_valid());
        assert!(!desk.verify_code("0612345678", &code).unwrap().is_valid());
    }

    #[test]
    fn test_wrong_code_and_attempt_limit() {
        let desk = desk();
        desk.issue_code("0611111111").unwrap();
        let code = desk.notifier().last_code_for("0611111111").unwrap();
        let wrong = if code == "0000" { "1111" } else { "0000" };

        for _ in 0..MAX_ATTEMPTS {
            assert!(!desk.verify_code("0611111111", wrong).unwrap().is_valid());
        }
        // Record dropped: even the right code fails now.
        assert!(!desk.verify_code("0611111111", &code).unwrap().is_valid());
    }

    #[test]
    fn test_expired_code_rejected() {
        let desk = desk().with_code_ttl(Duration::seconds(-1));
        desk.issue_code("0622222222").unwrap();
        let code = desk.notifier().last_code_for("0622222222").unwrap();
        assert!(!desk.verify_code("0622222222", &code).unwrap().is_valid());
    }

    #[test]
    fn test_gated_order_needs_confirmation() {
        let desk = desk();
        let order = command(Customer::guest("Ana", "0633333333"), CommandType::OnSite);
        assert!(matches!(
            desk.accept(&order),
            Err(CommerceError::ConfirmationRequired(_))
        ));

        desk.issue_code("0633333333").unwrap();
        let code = desk.notifier().last_code_for("0633333333").unwrap();
        desk.verify_code("0633333333", &code).unwrap();

        let receipt = desk.accept(&order).unwrap();
        assert!((100_000..1_000_000).contains(&receipt.code));
        let stored = desk.find_by_code(receipt.code).unwrap();
        assert!(stored.confirmed);
        assert_eq!(stored.id, Some(receipt.id));

        // The confirmation was consumed.
        assert!(desk.accept(&order).is_err());
    }

    #[test]
    fn test_failed_store_keeps_confirmation() {
        let desk = desk();
        let taken = desk
            .accept(&command(Customer::user("u1"), CommandType::OnSite))
            .unwrap()
            .code;

        let order = command(Customer::guest("Ana", "0644444444"), CommandType::Takeaway);
        desk.issue_code("0644444444").unwrap();
        let code = desk.notifier().last_code_for("0644444444").unwrap();
        assert!(desk.verify_code("0644444444", &code).unwrap().is_valid());

        assert!(matches!(
            desk.store_command(&order, taken),
            Err(CommerceError::Gateway(_))
        ));
        assert_eq!(desk.db().count(COMMANDS, None).unwrap(), 1);

        let receipt = desk.accept(&order).unwrap();
        assert!(desk.find_by_code(receipt.code).unwrap().confirmed);
        assert!(matches!(
            desk.accept(&order),
            Err(CommerceError::ConfirmationRequired(_))
        ));
    }

    #[test]
    fn test_orders_survive_reopening_the_store() {
        let path = std::env::temp_dir().join(format!(
            "tavola-desk-{}-{}.redb",
            std::process::id(),
            rand::random::<u32>()
        ));
        let receipt = {
            let desk = OrderDesk::new(Db::open(&path).unwrap(), Arc::new(MemoryNotifier::new()));
            desk.accept(&command(Customer::user("u1"), CommandType::OnSite))
                .unwrap()
        };

        let desk = OrderDesk::new(Db::open(&path).unwrap(), Arc::new(MemoryNotifier::new()));
        let stored = desk.find_by_code(receipt.code).unwrap();
        assert_eq!(stored.id, Some(receipt.id));
        drop(desk);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_ungated_order_and_lookup() {
        let desk = desk();
        let order = command(Customer::user("u1"), CommandType::OnSite);
        let first = desk.accept(&order).unwrap();
        let second = desk.accept(&order).unwrap();
        assert_ne!(first.code, second.code);
        assert_ne!(first.id, second.id);

        assert_eq!(desk.commands_for(&RestaurantId::new("r1")).unwrap().len(), 2);
        assert!(desk.get(&first.id).is_ok());
        assert!(matches!(
            desk.find_by_code(1),
            Err(CommerceError::CommandNotFound(_))
        ));
    }

    #[test]
    fn test_empty_order_rejected() {
        let desk = desk();
        let mut order = command(Customer::user("u1"), CommandType::OnSite);
        order.foods.clear();
        assert!(matches!(desk.accept(&order), Err(CommerceError::EmptyCart)));
    }
}
