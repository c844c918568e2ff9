//! Option groups selected on a cart entry.
//!
//! An [`OptionGroup`] can only be built through constructors that check the
//! capacity invariant, so a group holding more units than it allows never
//! exists, including one rehydrated from storage.

use crate::catalog::{Accompaniment, FoodOption};
use crate::error::CommerceError;
use crate::ids::AccompanimentId;
use serde::{Deserialize, Serialize};

/// An accompaniment picked inside a group, with its picked quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionItem {
    pub accompaniment: Accompaniment,
    pub quantity: u32,
}

impl OptionItem {
    pub fn id(&self) -> &AccompanimentId {
        &self.accompaniment.id
    }
}

/// A named group of picked accompaniments capped by `max_options`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "OptionGroupRecord")]
pub struct OptionGroup {
    title: String,
    max_options: u32,
    items: Vec<OptionItem>,
}

/// Unchecked wire shape of an [`OptionGroup`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionGroupRecord {
    title: String,
    #[serde(default)]
    max_options: u32,
    #[serde(default)]
    items: Vec<OptionItem>,
}

impl TryFrom<OptionGroupRecord> for OptionGroup {
    type Error = CommerceError;

    fn try_from(record: OptionGroupRecord) -> Result<Self, Self::Error> {
        OptionGroup::with_items(record.title, record.max_options, record.items)
    }
}

impl OptionGroup {
    /// An empty group.
    pub fn new(title: impl Into<String>, max_options: u32) -> Self {
        Self {
            title: title.into(),
            max_options,
            items: Vec::new(),
        }
    }

    /// An empty group shaped after a catalog template.
    pub fn from_template(template: &FoodOption) -> Self {
        Self::new(template.title.clone(), template.max_options)
    }

    /// Build a group from existing picks.
    ///
    /// Rejects zero quantities, duplicate accompaniments and lists whose
    /// total exceeds the capacity.
    pub fn with_items(
        title: impl Into<String>,
        max_options: u32,
        items: Vec<OptionItem>,
    ) -> Result<Self, CommerceError> {
        let group = Self {
            title: title.into(),
            max_options,
            items,
        };

        for (i, item) in group.items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(CommerceError::ValidationError(format!(
                    "option \"{}\" holds {} with quantity 0",
                    group.title,
                    item.id()
                )));
            }
            if group.items[..i].iter().any(|other| other.id() == item.id()) {
                return Err(CommerceError::ValidationError(format!(
                    "option \"{}\" lists {} twice",
                    group.title,
                    item.id()
                )));
            }
        }

        let capacity = group.capacity();
        if group.selected() > capacity {
            return Err(CommerceError::OptionCapacityExceeded {
                option: group.title,
                capacity,
            });
        }

        Ok(group)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn max_options(&self) -> u32 {
        self.max_options
    }

    pub fn items(&self) -> &[OptionItem] {
        &self.items
    }

    /// Maximum number of units the group accepts.
    pub fn capacity(&self) -> u32 {
        self.max_options.max(1)
    }

    /// Radio-button group (`max_options` of 0 or 1).
    pub fn is_single_select(&self) -> bool {
        self.max_options <= 1
    }

    /// Total picked units.
    pub fn selected(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    pub fn is_full(&self) -> bool {
        self.selected() >= self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Picked quantity of one accompaniment.
    pub fn quantity_of(&self, id: &AccompanimentId) -> u32 {
        self.items
            .iter()
            .find(|i| i.id() == id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Pick one more unit, creating the item on first pick.
    ///
    /// Returns the item's new quantity, or `OptionCapacityExceeded` with the
    /// group left untouched.
    pub fn increment(&mut self, accompaniment: &Accompaniment) -> Result<u32, CommerceError> {
        if self.is_full() {
            return Err(CommerceError::OptionCapacityExceeded {
                option: self.title.clone(),
                capacity: self.capacity(),
            });
        }

        match self.items.iter_mut().find(|i| i.id() == &accompaniment.id) {
            Some(item) => {
                item.quantity += 1;
                Ok(item.quantity)
            }
            None => {
                self.items.push(OptionItem {
                    accompaniment: accompaniment.clone(),
                    quantity: 1,
                });
                Ok(1)
            }
        }
    }

    /// Drop one unit; the item disappears at zero.
    ///
    /// Returns the remaining quantity (0 when the item was not picked).
    pub fn decrement(&mut self, id: &AccompanimentId) -> u32 {
        let Some(pos) = self.items.iter().position(|i| i.id() == id) else {
            return 0;
        };
        let item = &mut self.items[pos];
        item.quantity -= 1;
        let remaining = item.quantity;
        if remaining == 0 {
            self.items.remove(pos);
        }
        remaining
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Accompaniment ids repeated by their picked quantity.
    pub fn accompaniment_ids(&self) -> Vec<AccompanimentId> {
        self.items
            .iter()
            .flat_map(|i| std::iter::repeat(i.id().clone()).take(i.quantity as usize))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    fn sauce(id: &str, cents: i64) -> Accompaniment {
        Accompaniment::new(id, id.to_uppercase(), Money::new(cents, Currency::EUR))
    }

    #[test]
    fn test_capacity_from_max_options() {
        assert_eq!(OptionGroup::new("Sauce", 0).capacity(), 1);
        assert_eq!(OptionGroup::new("Sauce", 1).capacity(), 1);
        assert_eq!(OptionGroup::new("Sauce", 3).capacity(), 3);
        assert!(OptionGroup::new("Sauce", 1).is_single_select());
        assert!(!OptionGroup::new("Sauce", 2).is_single_select());
    }

    #[test]
    fn test_increment_stops_at_capacity() {
        let mut group = OptionGroup::new("Sauce", 2);
        let ketchup = sauce("ketchup", 0);
        let mayo = sauce("mayo", 50);

        assert_eq!(group.increment(&ketchup).unwrap(), 1);
        assert_eq!(group.increment(&mayo).unwrap(), 1);

        let err = group.increment(&ketchup).unwrap_err();
        assert!(matches!(
            err,
            CommerceError::OptionCapacityExceeded { capacity: 2, .. }
        ));
        assert_eq!(group.selected(), 2);
        assert_eq!(group.quantity_of(&ketchup.id), 1);
    }

    #[test]
    fn test_decrement_drops_item_at_zero() {
        let mut group = OptionGroup::new("Sauce", 3);
        let ketchup = sauce("ketchup", 0);
        group.increment(&ketchup).unwrap();
        group.increment(&ketchup).unwrap();

        assert_eq!(group.decrement(&ketchup.id), 1);
        assert_eq!(group.decrement(&ketchup.id), 0);
        assert!(group.is_empty());
        assert_eq!(group.decrement(&ketchup.id), 0);
    }

    #[test]
    fn test_with_items_rejects_over_capacity() {
        let items = vec![
            OptionItem { accompaniment: sauce("a", 0), quantity: 1 },
            OptionItem { accompaniment: sauce("b", 0), quantity: 1 },
        ];
        match OptionGroup::with_items("Sauce", 1, items.clone()) {
            Err(CommerceError::OptionCapacityExceeded { option, capacity }) => {
                assert_eq!(option, "Sauce");
                assert_eq!(capacity, 1);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
        assert!(OptionGroup::with_items("Sauce", 2, items).is_ok());
    }

    #[test]
    fn test_with_items_rejects_zero_and_duplicates() {
        let zero = vec![OptionItem { accompaniment: sauce("a", 0), quantity: 0 }];
        assert!(OptionGroup::with_items("Sauce", 2, zero).is_err());

        let dup = vec![
            OptionItem { accompaniment: sauce("a", 0), quantity: 1 },
            OptionItem { accompaniment: sauce("a", 0), quantity: 1 },
        ];
        assert!(OptionGroup::with_items("Sauce", 3, dup).is_err());
    }

    #[test]
    fn test_deserialize_validates_capacity() {
        let json = r#"{
            "title": "Sauce",
            "maxOptions": 1,
            "items": [
                { "accompaniment": { "id": "a", "name": "A", "price": { "amount": 0 } }, "quantity": 2 }
            ]
        }"#;
        assert!(serde_json::from_str::<OptionGroup>(json).is_err());

        let ok = json.replace("\"quantity\": 2", "\"quantity\": 1");
        let group: OptionGroup = serde_json::from_str(&ok).unwrap();
        assert_eq!(group.selected(), 1);
    }

    #[test]
    fn test_accompaniment_ids_repeat_by_quantity() {
        let mut group = OptionGroup::new("Sauce", 3);
        let ketchup = sauce("ketchup", 0);
        group.increment(&ketchup).unwrap();
        group.increment(&ketchup).unwrap();
        assert_eq!(
            group.accompaniment_ids(),
            vec![ketchup.id.clone(), ketchup.id.clone()]
        );
    }
}
