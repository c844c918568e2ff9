//! Composition of cart entries.
//!
//! [`FoodBuilder`] and [`MenuBuilder`] hold the configuration being edited
//! before it is saved into the cart. Every operation checks its invariant
//! and returns an error instead of applying an invalid transition.

use crate::cart::entry::{FoodInCart, MenuFoodSelection, MenuInCart};
use crate::cart::option::OptionGroup;
use crate::cart::pricing::{self, PricingMode};
use crate::catalog::{Food, FoodOption, Menu};
use crate::error::CommerceError;
use crate::ids::{AccompanimentId, CartEntryId, FoodId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per cart entry.
pub const MAX_QUANTITY_PER_ENTRY: u32 = 99;

/// Actions a [`FoodBuilder`] understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodAction {
    IncrementQuantity,
    DecrementQuantity,
    IncrementOptionItem { option: String, item: AccompanimentId },
    DecrementOptionItem { option: String, item: AccompanimentId },
    ClearOption { option: String },
    SelectSingle { option: String, item: AccompanimentId },
    SetComment { comment: Option<String> },
    Reset,
}

/// Actions a [`MenuBuilder`] understands. Option actions name the chosen food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuAction {
    IncrementQuantity,
    DecrementQuantity,
    SelectFood { food: FoodId },
    RemoveFood { food: FoodId },
    IncrementOptionItem { food: FoodId, option: String, item: AccompanimentId },
    DecrementOptionItem { food: FoodId, option: String, item: AccompanimentId },
    ClearOption { food: FoodId, option: String },
    SelectSingle { food: FoodId, option: String, item: AccompanimentId },
    SetComment { comment: Option<String> },
    Reset,
}

fn template<'a>(food: &'a Food, option: &str) -> Result<&'a FoodOption, CommerceError> {
    food.option(option).ok_or_else(|| CommerceError::UnknownOption {
        food: food.id.to_string(),
        option: option.to_string(),
    })
}

fn increment_in(
    groups: &mut Vec<OptionGroup>,
    food: &Food,
    option: &str,
    item: &AccompanimentId,
) -> Result<u32, CommerceError> {
    let tpl = template(food, option)?;
    let accompaniment = tpl
        .item(item)
        .ok_or_else(|| CommerceError::UnknownAccompaniment {
            option: option.to_string(),
            accompaniment: item.to_string(),
        })?;

    match groups.iter_mut().find(|g| g.title() == option) {
        Some(group) => group.increment(accompaniment),
        None => {
            let mut group = OptionGroup::from_template(tpl);
            let quantity = group.increment(accompaniment)?;
            groups.push(group);
            Ok(quantity)
        }
    }
}

fn decrement_in(
    groups: &mut Vec<OptionGroup>,
    food: &Food,
    option: &str,
    item: &AccompanimentId,
) -> Result<u32, CommerceError> {
    template(food, option)?;
    let Some(pos) = groups.iter().position(|g| g.title() == option) else {
        return Ok(0);
    };
    let remaining = groups[pos].decrement(item);
    if groups[pos].is_empty() {
        groups.remove(pos);
    }
    Ok(remaining)
}

fn clear_in(groups: &mut Vec<OptionGroup>, food: &Food, option: &str) -> Result<(), CommerceError> {
    template(food, option)?;
    groups.retain(|g| g.title() != option);
    Ok(())
}

fn select_single_in(
    groups: &mut Vec<OptionGroup>,
    food: &Food,
    option: &str,
    item: &AccompanimentId,
) -> Result<(), CommerceError> {
    // Validate before clearing so a bad pick keeps the previous one.
    template(food, option)?
        .item(item)
        .ok_or_else(|| CommerceError::UnknownAccompaniment {
            option: option.to_string(),
            accompaniment: item.to_string(),
        })?;
    clear_in(groups, food, option)?;
    increment_in(groups, food, option, item).map(|_| ())
}

fn step_up(quantity: u32) -> Result<u32, CommerceError> {
    let next = quantity.saturating_add(1);
    if next > MAX_QUANTITY_PER_ENTRY {
        return Err(CommerceError::InvalidQuantity(i64::from(next)));
    }
    Ok(next)
}

fn step_down(quantity: u32) -> Result<u32, CommerceError> {
    if quantity <= 1 {
        return Err(CommerceError::InvalidQuantity(i64::from(quantity) - 1));
    }
    Ok(quantity - 1)
}

/// Configures a food before it goes into the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodBuilder {
    id: CartEntryId,
    food: Food,
    quantity: u32,
    options: Vec<OptionGroup>,
    comment: Option<String>,
    mode: PricingMode,
}

impl FoodBuilder {
    /// Start a fresh configuration with quantity 1 and no options.
    pub fn new(food: Food, mode: PricingMode) -> Self {
        Self {
            id: CartEntryId::generate(),
            food,
            quantity: 1,
            options: Vec::new(),
            comment: None,
            mode,
        }
    }

    /// Reopen a cart entry for editing, keeping its cart-local id.
    pub fn edit(entry: &FoodInCart) -> Self {
        Self {
            id: entry.id.clone(),
            food: entry.food.clone(),
            quantity: entry.quantity.clamp(1, MAX_QUANTITY_PER_ENTRY),
            options: entry.options.clone(),
            comment: entry.comment.clone(),
            mode: entry.pricing_mode,
        }
    }

    pub fn id(&self) -> &CartEntryId {
        &self.id
    }

    pub fn food(&self) -> &Food {
        &self.food
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn options(&self) -> &[OptionGroup] {
        &self.options
    }

    pub fn mode(&self) -> PricingMode {
        self.mode
    }

    pub fn increment_quantity(&mut self) -> Result<u32, CommerceError> {
        self.quantity = step_up(self.quantity)?;
        Ok(self.quantity)
    }

    pub fn decrement_quantity(&mut self) -> Result<u32, CommerceError> {
        self.quantity = step_down(self.quantity)?;
        Ok(self.quantity)
    }

    /// Pick one more unit of `item` in group `option`.
    pub fn increment_option_item(
        &mut self,
        option: &str,
        item: &AccompanimentId,
    ) -> Result<u32, CommerceError> {
        increment_in(&mut self.options, &self.food, option, item)
    }

    pub fn decrement_option_item(
        &mut self,
        option: &str,
        item: &AccompanimentId,
    ) -> Result<u32, CommerceError> {
        decrement_in(&mut self.options, &self.food, option, item)
    }

    pub fn clear_option(&mut self, option: &str) -> Result<(), CommerceError> {
        clear_in(&mut self.options, &self.food, option)
    }

    /// Replace whatever is picked in `option` with a single `item`.
    pub fn select_single(&mut self, option: &str, item: &AccompanimentId) -> Result<(), CommerceError> {
        select_single_in(&mut self.options, &self.food, option, item)
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment.filter(|c| !c.trim().is_empty());
    }

    /// Back to the default configuration under a new cart-local id.
    pub fn reset(&mut self) {
        *self = Self::new(self.food.clone(), self.mode);
    }

    pub fn apply(&mut self, action: FoodAction) -> Result<(), CommerceError> {
        match action {
            FoodAction::IncrementQuantity => self.increment_quantity().map(|_| ()),
            FoodAction::DecrementQuantity => self.decrement_quantity().map(|_| ()),
            FoodAction::IncrementOptionItem { option, item } => {
                self.increment_option_item(&option, &item).map(|_| ())
            }
            FoodAction::DecrementOptionItem { option, item } => {
                self.decrement_option_item(&option, &item).map(|_| ())
            }
            FoodAction::ClearOption { option } => self.clear_option(&option),
            FoodAction::SelectSingle { option, item } => self.select_single(&option, &item),
            FoodAction::SetComment { comment } => {
                self.set_comment(comment);
                Ok(())
            }
            FoodAction::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Price of the configuration as it stands.
    pub fn price(&self) -> Money {
        pricing::estimate_food_price(&self.snapshot(), self.mode)
    }

    fn snapshot(&self) -> FoodInCart {
        FoodInCart {
            id: self.id.clone(),
            food: self.food.clone(),
            quantity: self.quantity,
            options: self.options.clone(),
            comment: self.comment.clone(),
            pricing_mode: self.mode,
        }
    }

    /// Produce the cart entry.
    pub fn save(&self) -> Result<FoodInCart, CommerceError> {
        if self.quantity == 0 {
            return Err(CommerceError::InvalidQuantity(0));
        }
        Ok(self.snapshot())
    }
}

/// Configures a menu before it goes into the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuBuilder {
    id: CartEntryId,
    menu: Menu,
    quantity: u32,
    foods: Vec<MenuFoodSelection>,
    comment: Option<String>,
    mode: PricingMode,
}

impl MenuBuilder {
    pub fn new(menu: Menu, mode: PricingMode) -> Self {
        Self {
            id: CartEntryId::generate(),
            menu,
            quantity: 1,
            foods: Vec::new(),
            comment: None,
            mode,
        }
    }

    pub fn edit(entry: &MenuInCart) -> Self {
        Self {
            id: entry.id.clone(),
            menu: entry.menu.clone(),
            quantity: entry.quantity.clamp(1, MAX_QUANTITY_PER_ENTRY),
            foods: entry.foods.clone(),
            comment: entry.comment.clone(),
            mode: entry.pricing_mode,
        }
    }

    pub fn id(&self) -> &CartEntryId {
        &self.id
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn selections(&self) -> &[MenuFoodSelection] {
        &self.foods
    }

    pub fn mode(&self) -> PricingMode {
        self.mode
    }

    pub fn increment_quantity(&mut self) -> Result<u32, CommerceError> {
        self.quantity = step_up(self.quantity)?;
        Ok(self.quantity)
    }

    pub fn decrement_quantity(&mut self) -> Result<u32, CommerceError> {
        self.quantity = step_down(self.quantity)?;
        Ok(self.quantity)
    }

    fn not_in_menu(&self, food: &FoodId) -> CommerceError {
        CommerceError::FoodNotInMenu {
            menu: self.menu.id.to_string(),
            food: food.to_string(),
        }
    }

    /// Choose one of the menu's allowed foods. Choosing it twice is a no-op.
    pub fn select_food(&mut self, food: &FoodId) -> Result<(), CommerceError> {
        let allowed = self.menu.food(food).ok_or_else(|| self.not_in_menu(food))?;
        if self.foods.iter().any(|s| &s.food.id == food) {
            return Ok(());
        }
        let selection = MenuFoodSelection {
            food: allowed.food.clone(),
            price: self.menu.price_of(allowed),
            options: Vec::new(),
        };
        self.foods.push(selection);
        Ok(())
    }

    pub fn remove_food(&mut self, food: &FoodId) -> Result<(), CommerceError> {
        if self.menu.food(food).is_none() {
            return Err(self.not_in_menu(food));
        }
        self.foods.retain(|s| &s.food.id != food);
        Ok(())
    }

    /// Selection for `food`, choosing it first if needed.
    fn selection_mut(&mut self, food: &FoodId) -> Result<&mut MenuFoodSelection, CommerceError> {
        self.select_food(food)?;
        let err = self.not_in_menu(food);
        self.foods
            .iter_mut()
            .find(|s| &s.food.id == food)
            .ok_or(err)
    }

    pub fn increment_option_item(
        &mut self,
        food: &FoodId,
        option: &str,
        item: &AccompanimentId,
    ) -> Result<u32, CommerceError> {
        let selection = self.selection_mut(food)?;
        increment_in(&mut selection.options, &selection.food, option, item)
    }

    pub fn decrement_option_item(
        &mut self,
        food: &FoodId,
        option: &str,
        item: &AccompanimentId,
    ) -> Result<u32, CommerceError> {
        let not_in_menu = self.not_in_menu(food);
        let allowed = self.menu.food(food).ok_or(not_in_menu)?;
        match self.foods.iter_mut().find(|s| &s.food.id == food) {
            Some(selection) => decrement_in(&mut selection.options, &selection.food, option, item),
            None => template(&allowed.food, option).map(|_| 0),
        }
    }

    pub fn clear_option(&mut self, food: &FoodId, option: &str) -> Result<(), CommerceError> {
        let not_in_menu = self.not_in_menu(food);
        let allowed = self.menu.food(food).ok_or(not_in_menu)?;
        match self.foods.iter_mut().find(|s| &s.food.id == food) {
            Some(selection) => clear_in(&mut selection.options, &selection.food, option),
            None => template(&allowed.food, option).map(|_| ()),
        }
    }

    pub fn select_single(
        &mut self,
        food: &FoodId,
        option: &str,
        item: &AccompanimentId,
    ) -> Result<(), CommerceError> {
        let selection = self.selection_mut(food)?;
        select_single_in(&mut selection.options, &selection.food, option, item)
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment.filter(|c| !c.trim().is_empty());
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.menu.clone(), self.mode);
    }

    pub fn apply(&mut self, action: MenuAction) -> Result<(), CommerceError> {
        match action {
            MenuAction::IncrementQuantity => self.increment_quantity().map(|_| ()),
            MenuAction::DecrementQuantity => self.decrement_quantity().map(|_| ()),
            MenuAction::SelectFood { food } => self.select_food(&food),
            MenuAction::RemoveFood { food } => self.remove_food(&food),
            MenuAction::IncrementOptionItem { food, option, item } => {
                self.increment_option_item(&food, &option, &item).map(|_| ())
            }
            MenuAction::DecrementOptionItem { food, option, item } => {
                self.decrement_option_item(&food, &option, &item).map(|_| ())
            }
            MenuAction::ClearOption { food, option } => self.clear_option(&food, &option),
            MenuAction::SelectSingle { food, option, item } => {
                self.select_single(&food, &option, &item)
            }
            MenuAction::SetComment { comment } => {
                self.set_comment(comment);
                Ok(())
            }
            MenuAction::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    fn snapshot(&self) -> MenuInCart {
        MenuInCart {
            id: self.id.clone(),
            menu: self.menu.clone(),
            quantity: self.quantity,
            foods: self.foods.clone(),
            comment: self.comment.clone(),
            pricing_mode: self.mode,
        }
    }

    pub fn price(&self) -> Money {
        pricing::estimate_menu_price(&self.snapshot(), self.mode)
    }

    /// Produce the cart entry; a menu needs at least one chosen food.
    pub fn save(&self) -> Result<MenuInCart, CommerceError> {
        if self.foods.is_empty() {
            return Err(CommerceError::EmptyMenu(self.menu.id.to_string()));
        }
        if self.quantity == 0 {
            return Err(CommerceError::InvalidQuantity(0));
        }
        Ok(self.snapshot())
    }
}
