//! Cart persistence on top of session storage.

use crate::cart::{CartPersistence, CartState};
use crate::error::CommerceError;
use tavola_cache::{Cache, CacheError, Session, SessionId};
use tracing::{debug, warn};

/// Session namespace the cart lives under (`cart:<session id>`).
pub const CART_NAMESPACE: &str = "cart";

/// Stores the cart of one session in a [`Session<CartState>`].
#[derive(Clone)]
pub struct SessionCartStorage {
    session: Session<CartState>,
    id: SessionId,
}

impl SessionCartStorage {
    pub fn new(cache: Cache, id: SessionId) -> Self {
        Self {
            session: Session::with_namespace(cache, CART_NAMESPACE),
            id,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.id
    }

    /// Number of writes the stored cart has seen.
    pub fn version(&self) -> Result<u64, CommerceError> {
        Ok(self
            .session
            .get_versioned(&self.id)?
            .map(|data| data.version)
            .unwrap_or(0))
    }

    /// Drop the stored cart, e.g. on logout.
    pub fn clear(&self) -> Result<(), CommerceError> {
        self.session.delete(&self.id)?;
        Ok(())
    }
}

impl CartPersistence for SessionCartStorage {
    /// A stored cart that no longer decodes is treated as absent; the next
    /// save replaces it.
    fn load(&self) -> Result<Option<CartState>, CommerceError> {
        match self.session.get(&self.id) {
            Ok(state) => Ok(state),
            Err(CacheError::SerializeError(e)) => {
                warn!(session = %self.id, error = %e, "discarding undecodable cart");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &CartState) -> Result<(), CommerceError> {
        let version = self.session.set(&self.id, state)?;
        debug!(session = %self.id, version, entries = state.total_count, "cart saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartStore, FoodBuilder, PricingMode};
    use crate::catalog::Food;
    use crate::money::{Currency, Money};

    #[test]
    fn test_cart_survives_reopen() {
        let cache = Cache::open_default().unwrap();
        let id = SessionId::new("sess-1");

        let mut store = CartStore::open(SessionCartStorage::new(cache.clone(), id.clone())).unwrap();
        let food = Food::new("f1", "r1", "Burger", Money::new(1000, Currency::EUR));
        store
            .add_food(FoodBuilder::new(food, PricingMode::Standard).save().unwrap())
            .unwrap();
        assert_eq!(store.persistence().version().unwrap(), 1);

        let reopened = CartStore::open(SessionCartStorage::new(cache.clone(), id)).unwrap();
        assert_eq!(reopened.state(), store.state());
        assert!(cache.exists("cart:sess-1").unwrap());
    }

    #[test]
    fn test_undecodable_cart_starts_empty_and_is_replaced() {
        let cache = Cache::open_default().unwrap();
        cache.set("cart:s1", &serde_json::json!({ "legacy": true })).unwrap();

        let storage = SessionCartStorage::new(cache.clone(), SessionId::new("s1"));
        let mut store = CartStore::open(storage).unwrap();
        assert!(store.state().is_empty());

        store.reset().unwrap();
        assert_eq!(store.persistence().version().unwrap(), 1);
        let reopened = CartStore::open(SessionCartStorage::new(cache, SessionId::new("s1"))).unwrap();
        assert_eq!(reopened.state(), store.state());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let cache = Cache::open_default().unwrap();
        let a = SessionCartStorage::new(cache.clone(), SessionId::new("a"));
        let b = SessionCartStorage::new(cache, SessionId::new("b"));

        a.save(&CartState::default()).unwrap();
        assert!(a.load().unwrap().is_some());
        assert!(b.load().unwrap().is_none());

        a.clear().unwrap();
        assert!(a.load().unwrap().is_none());
    }
}
