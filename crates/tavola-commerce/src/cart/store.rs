//! Cart state and the store that mutates it.
//!
//! [`CartStore`] is the only way to change a [`CartState`]. Each transition
//! recomputes the derived fields and writes the state through the injected
//! [`CartPersistence`] before returning.

use crate::cart::compose::MAX_QUANTITY_PER_ENTRY;
use crate::cart::entry::{FoodInCart, MenuInCart};
use crate::cart::pricing::{self, CartPricing};
use crate::error::CommerceError;
use crate::ids::{CartEntryId, RestaurantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// The current cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Set by the first entry, cleared when the cart empties.
    pub restaurant: Option<RestaurantId>,
    pub foods: Vec<FoodInCart>,
    pub menus: Vec<MenuInCart>,
    /// Distinct entries, not quantity-weighted.
    pub total_count: usize,
    pub total_price: Money,
    pub priceless: bool,
}

impl CartState {
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty() && self.menus.is_empty()
    }

    pub fn food(&self, id: &CartEntryId) -> Option<&FoodInCart> {
        self.foods.iter().find(|f| &f.id == id)
    }

    pub fn menu(&self, id: &CartEntryId) -> Option<&MenuInCart> {
        self.menus.iter().find(|m| &m.id == id)
    }

    /// Per-entry breakdown.
    pub fn pricing(&self) -> CartPricing {
        CartPricing::compute(&self.foods, &self.menus)
    }

    /// Sum of entry quantities.
    pub fn item_count(&self) -> u64 {
        self.foods
            .iter()
            .map(|f| u64::from(f.quantity))
            .chain(self.menus.iter().map(|m| u64::from(m.quantity)))
            .sum()
    }

    fn recompute(&mut self) {
        self.total_count = self.foods.len() + self.menus.len();
        self.total_price = pricing::estimate_total_price(&self.foods, &self.menus);
        if self.total_count == 0 {
            self.restaurant = None;
            self.priceless = false;
        } else {
            self.priceless = self.priceless
                || self.foods.iter().any(FoodInCart::is_priceless)
                || self.menus.iter().any(MenuInCart::is_priceless);
        }
    }

    fn check_restaurant(&self, attempted: &RestaurantId) -> Result<(), CommerceError> {
        match &self.restaurant {
            Some(current) if current != attempted && !self.is_empty() => {
                Err(CommerceError::RestaurantMismatch {
                    current: current.to_string(),
                    attempted: attempted.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Where the cart is kept between runs.
pub trait CartPersistence {
    /// The last saved state, if any.
    fn load(&self) -> Result<Option<CartState>, CommerceError>;

    fn save(&self, state: &CartState) -> Result<(), CommerceError>;
}

impl<T: CartPersistence + ?Sized> CartPersistence for Arc<T> {
    fn load(&self) -> Result<Option<CartState>, CommerceError> {
        (**self).load()
    }

    fn save(&self, state: &CartState) -> Result<(), CommerceError> {
        (**self).save(state)
    }
}

/// In-process persistence.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    state: Mutex<Option<CartState>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with a state, as if a previous run had saved it.
    pub fn with_state(state: CartState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl CartPersistence for MemoryCartStorage {
    fn load(&self) -> Result<Option<CartState>, CommerceError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| CommerceError::CacheError("cart storage lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &CartState) -> Result<(), CommerceError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| CommerceError::CacheError("cart storage lock poisoned".to_string()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}

/// The cart store.
#[derive(Debug)]
pub struct CartStore<P: CartPersistence> {
    state: CartState,
    persistence: P,
}

impl<P: CartPersistence> CartStore<P> {
    /// Open the store, rehydrating the last saved state.
    pub fn open(persistence: P) -> Result<Self, CommerceError> {
        let mut state = persistence.load()?.unwrap_or_default();
        // Stored totals are derived data; recompute from the entries.
        state.recompute();
        debug!(
            entries = state.total_count,
            total = state.total_price.amount_cents,
            "cart rehydrated"
        );
        Ok(Self { state, persistence })
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    fn commit(&mut self, next: CartState) -> Result<&CartState, CommerceError> {
        self.persistence.save(&next)?;
        self.state = next;
        Ok(&self.state)
    }

    /// Append a food. The first entry decides the cart's restaurant.
    pub fn add_food(&mut self, food: FoodInCart) -> Result<&CartState, CommerceError> {
        validate_quantity(food.quantity)?;
        self.state.check_restaurant(food.restaurant())?;

        let mut next = self.state.clone();
        next.restaurant = Some(food.restaurant().clone());
        debug!(entry = %food.id, food = %food.food.id, quantity = food.quantity, "adding food");
        next.foods.push(food);
        next.recompute();
        self.commit(next)
    }

    pub fn add_menu(&mut self, menu: MenuInCart) -> Result<&CartState, CommerceError> {
        validate_quantity(menu.quantity)?;
        if menu.foods.is_empty() {
            return Err(CommerceError::EmptyMenu(menu.menu.id.to_string()));
        }
        self.state.check_restaurant(menu.restaurant())?;

        let mut next = self.state.clone();
        next.restaurant = Some(menu.restaurant().clone());
        debug!(entry = %menu.id, menu = %menu.menu.id, quantity = menu.quantity, "adding menu");
        next.menus.push(menu);
        next.recompute();
        self.commit(next)
    }

    /// Replace an entry, matched by cart-local id, or else by catalog id.
    pub fn update_food(&mut self, food: FoodInCart) -> Result<&CartState, CommerceError> {
        validate_quantity(food.quantity)?;
        self.state.check_restaurant(food.restaurant())?;
        let pos = self
            .state
            .foods
            .iter()
            .position(|f| f.id == food.id)
            .or_else(|| self.state.foods.iter().position(|f| f.food.id == food.food.id))
            .ok_or_else(|| CommerceError::EntryNotInCart(food.id.to_string()))?;

        let mut next = self.state.clone();
        next.foods[pos] = food;
        next.recompute();
        self.commit(next)
    }

    pub fn update_menu(&mut self, menu: MenuInCart) -> Result<&CartState, CommerceError> {
        validate_quantity(menu.quantity)?;
        if menu.foods.is_empty() {
            return Err(CommerceError::EmptyMenu(menu.menu.id.to_string()));
        }
        self.state.check_restaurant(menu.restaurant())?;
        let pos = self
            .state
            .menus
            .iter()
            .position(|m| m.id == menu.id)
            .or_else(|| self.state.menus.iter().position(|m| m.menu.id == menu.menu.id))
            .ok_or_else(|| CommerceError::EntryNotInCart(menu.id.to_string()))?;

        let mut next = self.state.clone();
        next.menus[pos] = menu;
        next.recompute();
        self.commit(next)
    }

    pub fn remove_food(&mut self, id: &CartEntryId) -> Result<&CartState, CommerceError> {
        if self.state.food(id).is_none() {
            return Err(CommerceError::EntryNotInCart(id.to_string()));
        }
        let mut next = self.state.clone();
        next.foods.retain(|f| &f.id != id);
        next.recompute();
        debug!(entry = %id, remaining = next.total_count, "removed food");
        self.commit(next)
    }

    pub fn remove_menu(&mut self, id: &CartEntryId) -> Result<&CartState, CommerceError> {
        if self.state.menu(id).is_none() {
            return Err(CommerceError::EntryNotInCart(id.to_string()));
        }
        let mut next = self.state.clone();
        next.menus.retain(|m| &m.id != id);
        next.recompute();
        debug!(entry = %id, remaining = next.total_count, "removed menu");
        self.commit(next)
    }

    /// Remove an entry whichever list holds it.
    pub fn remove(&mut self, id: &CartEntryId) -> Result<&CartState, CommerceError> {
        if self.state.food(id).is_some() {
            self.remove_food(id)
        } else {
            self.remove_menu(id)
        }
    }

    /// Empty the cart unconditionally.
    pub fn reset(&mut self) -> Result<&CartState, CommerceError> {
        info!(entries = self.state.total_count, "cart reset");
        self.commit(CartState::default())
    }

    /// Clear the cart and start over with `food`, whatever its restaurant.
    pub fn replace_with_food(&mut self, food: FoodInCart) -> Result<&CartState, CommerceError> {
        validate_quantity(food.quantity)?;
        info!(restaurant = %food.restaurant(), "replacing cart contents");
        let mut next = CartState {
            restaurant: Some(food.restaurant().clone()),
            ..CartState::default()
        };
        next.foods.push(food);
        next.recompute();
        self.commit(next)
    }

    pub fn replace_with_menu(&mut self, menu: MenuInCart) -> Result<&CartState, CommerceError> {
        validate_quantity(menu.quantity)?;
        if menu.foods.is_empty() {
            return Err(CommerceError::EmptyMenu(menu.menu.id.to_string()));
        }
        info!(restaurant = %menu.restaurant(), "replacing cart contents");
        let mut next = CartState {
            restaurant: Some(menu.restaurant().clone()),
            ..CartState::default()
        };
        next.menus.push(menu);
        next.recompute();
        self.commit(next)
    }
}

fn validate_quantity(quantity: u32) -> Result<(), CommerceError> {
    if quantity == 0 || quantity > MAX_QUANTITY_PER_ENTRY {
        return Err(CommerceError::InvalidQuantity(i64::from(quantity)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::compose::{FoodBuilder, MenuBuilder};
    use crate::cart::pricing::PricingMode;
    use crate::catalog::{Food, Menu, MenuType};
    use crate::ids::FoodId;
    use crate::money::Currency;

    fn eur(cents: i64) -> Money {
        Money::new(cents, Currency::EUR)
    }

    fn food(restaurant: &str, price: i64) -> FoodInCart {
        FoodBuilder::new(Food::new("f1", restaurant, "Burger", eur(price)), PricingMode::Standard)
            .save()
            .unwrap()
    }

    fn menu(restaurant: &str) -> MenuInCart {
        let menu = Menu::new("m1", restaurant, "Lunch", MenuType::FixedPrice, eur(1500))
            .with_food(Food::new("soup", restaurant, "Soup", eur(700)), eur(300));
        let mut builder = MenuBuilder::new(menu, PricingMode::FixedPrice);
        builder.select_food(&FoodId::new("soup")).unwrap();
        builder.save().unwrap()
    }

    fn store() -> CartStore<Arc<MemoryCartStorage>> {
        CartStore::open(Arc::new(MemoryCartStorage::new())).unwrap()
    }

    fn assert_invariants(state: &CartState) {
        assert_eq!(state.total_count, state.foods.len() + state.menus.len());
        assert_eq!(state.restaurant.is_none(), state.total_count == 0);
        assert_eq!(
            state.total_price,
            pricing::estimate_total_price(&state.foods, &state.menus)
        );
    }

    #[test]
    fn test_add_sets_restaurant_and_totals() {
        let mut store = store();
        let state = store.add_food(food("r1", 1000)).unwrap();
        assert_eq!(state.restaurant, Some(RestaurantId::new("r1")));
        assert_eq!(state.total_count, 1);
        assert_eq!(state.total_price, eur(1000));

        let state = store.add_menu(menu("r1")).unwrap();
        assert_eq!(state.total_count, 2);
        assert_eq!(state.total_price, eur(2800));
        assert_invariants(state);
    }

    #[test]
    fn test_same_food_twice_gives_two_entries() {
        let mut store = store();
        store.add_food(food("r1", 1000)).unwrap();
        store.add_food(food("r1", 1000)).unwrap();
        assert_eq!(store.state().total_count, 2);
        assert_eq!(store.state().item_count(), 2);
    }

    #[test]
    fn test_rejects_other_restaurant() {
        let mut store = store();
        store.add_food(food("r1", 1000)).unwrap();

        let err = store.add_food(food("r2", 500)).unwrap_err();
        assert!(matches!(err, CommerceError::RestaurantMismatch { .. }));
        assert!(matches!(
            store.add_menu(menu("r2")),
            Err(CommerceError::RestaurantMismatch { .. })
        ));
        assert_eq!(store.state().total_count, 1);

        let state = store.replace_with_food(food("r2", 500)).unwrap();
        assert_eq!(state.restaurant, Some(RestaurantId::new("r2")));
        assert_eq!(state.total_count, 1);
        assert_invariants(state);
    }

    #[test]
    fn test_remove_last_entry_clears_restaurant() {
        let mut store = store();
        let entry = food("r1", 1000);
        let menu_entry = menu("r1");
        store.add_food(entry.clone()).unwrap();
        store.add_menu(menu_entry.clone()).unwrap();

        store.remove_food(&entry.id).unwrap();
        assert_invariants(store.state());
        let state = store.remove(&menu_entry.id).unwrap();
        assert!(state.is_empty());
        assert_invariants(state);

        assert!(matches!(
            store.remove_food(&entry.id),
            Err(CommerceError::EntryNotInCart(_))
        ));
        // Any restaurant is accepted again.
        store.add_food(food("r2", 100)).unwrap();
    }

    #[test]
    fn test_update_matches_cart_id_then_catalog_id() {
        let mut store = store();
        let entry = food("r1", 1000);
        store.add_food(entry.clone()).unwrap();

        let mut builder = FoodBuilder::edit(&entry);
        builder.increment_quantity().unwrap();
        let state = store.update_food(builder.save().unwrap()).unwrap();
        assert_eq!(state.total_price, eur(2000));

        // A fresh configuration of the same catalog food replaces it too.
        let mut other = food("r1", 1000);
        other.quantity = 3;
        let state = store.update_food(other).unwrap();
        assert_eq!(state.total_count, 1);
        assert_eq!(state.total_price, eur(3000));

        let stranger = FoodBuilder::new(Food::new("f9", "r1", "Pie", eur(400)), PricingMode::Standard)
            .save()
            .unwrap();
        assert!(store.update_food(stranger).is_err());
    }

    #[test]
    fn test_update_rejects_other_restaurant() {
        let mut store = store();
        let entry = food("r1", 1000);
        let menu_entry = menu("r1");
        store.add_food(entry.clone()).unwrap();
        store.add_menu(menu_entry.clone()).unwrap();

        let mut moved = food("r2", 500);
        moved.id = entry.id.clone();
        assert!(matches!(
            store.update_food(moved),
            Err(CommerceError::RestaurantMismatch { .. })
        ));

        let mut moved_menu = menu("r2");
        moved_menu.id = menu_entry.id.clone();
        assert!(matches!(
            store.update_menu(moved_menu),
            Err(CommerceError::RestaurantMismatch { .. })
        ));

        assert_eq!(store.state().food(&entry.id), Some(&entry));
        assert_eq!(store.state().restaurant, Some(RestaurantId::new("r1")));
        assert_invariants(store.state());
    }

    #[test]
    fn test_priceless_flag() {
        let mut store = store();
        store.add_food(food("r1", 1000)).unwrap();
        assert!(!store.state().priceless);

        let free = food("r1", 0);
        let free_id = free.id.clone();
        store.add_food(free).unwrap();
        assert!(store.state().priceless);

        store.remove_food(&free_id).unwrap();
        assert!(store.state().priceless, "flag is sticky while the cart is non-empty");

        store.reset().unwrap();
        assert!(!store.state().priceless);
    }

    #[test]
    fn test_every_transition_persists() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone()).unwrap();

        store.add_food(food("r1", 1000)).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().total_count, 1);

        store.reset().unwrap();
        assert_eq!(storage.load().unwrap().unwrap(), CartState::default());
    }

    #[test]
    fn test_reopen_rehydrates_same_total() {
        let storage = Arc::new(MemoryCartStorage::new());
        {
            let mut store = CartStore::open(storage.clone()).unwrap();
            store.add_food(food("r1", 1000)).unwrap();
            store.add_menu(menu("r1")).unwrap();
        }
        let json = serde_json::to_string(&storage.load().unwrap().unwrap()).unwrap();
        let restored: CartState = serde_json::from_str(&json).unwrap();
        assert_eq!(
            pricing::estimate_total_price(&restored.foods, &restored.menus),
            restored.total_price
        );

        let reopened = CartStore::open(MemoryCartStorage::with_state(restored)).unwrap();
        assert_eq!(reopened.state().total_price, eur(2800));
        assert_invariants(reopened.state());
    }

    #[test]
    fn test_rejects_zero_quantity_and_empty_menu() {
        let mut store = store();
        let mut entry = food("r1", 1000);
        entry.quantity = 0;
        assert!(matches!(
            store.add_food(entry),
            Err(CommerceError::InvalidQuantity(0))
        ));

        let mut bulk = food("r1", 1000);
        bulk.quantity = MAX_QUANTITY_PER_ENTRY + 1;
        assert!(matches!(
            store.add_food(bulk),
            Err(CommerceError::InvalidQuantity(100))
        ));

        let mut empty = menu("r1");
        empty.foods.clear();
        assert!(matches!(store.add_menu(empty), Err(CommerceError::EmptyMenu(_))));
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequence() {
        let mut store = store();
        let mut ids = Vec::new();
        for i in 0..6 {
            if i % 2 == 0 {
                let entry = food("r1", 100 * (i + 1));
                ids.push(entry.id.clone());
                store.add_food(entry).unwrap();
            } else {
                let entry = menu("r1");
                ids.push(entry.id.clone());
                store.add_menu(entry).unwrap();
            }
            assert_invariants(store.state());
        }
        for id in ids {
            store.remove(&id).unwrap();
            assert_invariants(store.state());
        }
    }
}
