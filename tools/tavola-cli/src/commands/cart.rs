//! Cart commands.

use anyhow::{anyhow, bail, Context as _, Result};
use dialoguer::Confirm;
use tavola_commerce::cart::{
    CartState, EntryKind, FoodBuilder, FoodInCart, MenuBuilder, MenuInCart, OptionGroup,
    PricingMode,
};
use tavola_commerce::catalog::Food;
use tavola_commerce::ids::{AccompanimentId, CartEntryId, FoodId, MenuId};
use tavola_commerce::CommerceError;

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::{format_price, short_id};

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => show_cart(ctx),
        CartCommand::AddFood {
            food,
            quantity,
            options,
            comment,
            yes,
        } => add_food(ctx, &food, quantity, &options, comment, yes).await,
        CartCommand::AddMenu {
            menu,
            picks,
            quantity,
            options,
            comment,
            yes,
        } => add_menu(ctx, &menu, &picks, quantity, &options, comment, yes).await,
        CartCommand::SetQuantity { entry, quantity } => set_quantity(ctx, &entry, quantity),
        CartCommand::Remove { entry } => remove_entry(ctx, &entry),
        CartCommand::Reset { yes } => reset_cart(ctx, yes),
    }
}

fn show_cart(ctx: &Context) -> Result<()> {
    let store = ctx.cart_store()?;
    print_cart(ctx, store.state());
    Ok(())
}

/// Print the cart with one row per entry.
pub fn print_cart(ctx: &Context, state: &CartState) {
    if ctx.output.is_json() {
        ctx.output.json(state);
        return;
    }

    ctx.output.header("Cart");
    if state.is_empty() {
        ctx.output.info("Your cart is empty.");
        return;
    }

    if let Some(ref restaurant) = state.restaurant {
        ctx.output.kv("restaurant", restaurant.as_str());
    }

    let pricing = state.pricing();
    for line in &pricing.lines {
        let quantity = format!("{}x", line.quantity);
        let price = format_price(&line.total, state.priceless);
        ctx.output.table_row(
            &[
                short_id(line.entry_id.as_str()),
                quantity.as_str(),
                line.name.as_str(),
                price.as_str(),
            ],
            &[8, 4, 32, 10],
        );

        let details = match line.kind {
            EntryKind::Food => state
                .food(&line.entry_id)
                .map(|f| option_details(&f.options))
                .unwrap_or_default(),
            EntryKind::Menu => state
                .menu(&line.entry_id)
                .map(|m| {
                    m.foods
                        .iter()
                        .map(|s| {
                            let options = option_details(&s.options);
                            if options.is_empty() {
                                s.food.name.clone()
                            } else {
                                format!("{} ({})", s.food.name, options.join(", "))
                            }
                        })
                        .collect()
                })
                .unwrap_or_default(),
        };
        for detail in details {
            ctx.output.sub_item(&detail);
        }
    }

    ctx.output.kv("entries", &state.total_count.to_string());
    ctx.output.kv("items", &state.item_count().to_string());
    ctx.output
        .kv("total", &format_price(&state.total_price, state.priceless));
    if state.priceless {
        ctx.output.info("Prices are set by the restaurant when the order is placed.");
    }
}

fn option_details(options: &[OptionGroup]) -> Vec<String> {
    options
        .iter()
        .flat_map(|group| group.items())
        .map(|item| match item.quantity {
            1 => item.accompaniment.name.clone(),
            n => format!("{} x{}", item.accompaniment.name, n),
        })
        .collect()
}

async fn add_food(
    ctx: &Context,
    food_id: &str,
    quantity: u32,
    options: &[String],
    comment: Option<String>,
    yes: bool,
) -> Result<()> {
    let client = ctx.client()?;
    let spinner = ctx.output.spinner("Loading food...");
    let food = client
        .food(&FoodId::new(food_id))
        .await
        .with_context(|| format!("Failed to load food {}", food_id));
    let food = match food {
        Ok(food) => food,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    let restaurant = client.restaurant(&food.restaurant).await;
    spinner.finish_and_clear();
    let restaurant = restaurant.context("Failed to load restaurant")?;

    if !food.available {
        bail!("{} is not available right now", food.name);
    }

    check_quantity(quantity)?;
    let mut builder = FoodBuilder::new(food, PricingMode::for_food(&restaurant));
    while builder.quantity() < quantity {
        builder.increment_quantity()?;
    }
    for raw in options {
        let (title, item) = parse_option(raw)?;
        if is_single_select(builder.food(), &title) {
            builder.select_single(&title, &item)?;
        } else {
            builder.increment_option_item(&title, &item)?;
        }
    }
    builder.set_comment(comment);

    let entry = builder.save()?;
    let name = entry.food.name.clone();
    let mut store = ctx.cart_store()?;
    match store.add_food(entry.clone()).map(|_| ()) {
        Err(CommerceError::RestaurantMismatch { current, attempted }) => {
            confirm_replace(ctx, &current, &attempted, yes)?;
            store.replace_with_food(entry)?;
        }
        other => other?,
    }

    ctx.output.success(&format!("Added {} to the cart", name));
    print_cart(ctx, store.state());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn add_menu(
    ctx: &Context,
    menu_id: &str,
    picks: &[String],
    quantity: u32,
    options: &[String],
    comment: Option<String>,
    yes: bool,
) -> Result<()> {
    let client = ctx.client()?;
    let spinner = ctx.output.spinner("Loading menu...");
    let menu = client.menu(&MenuId::new(menu_id)).await;
    let menu = match menu {
        Ok(menu) => menu,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).with_context(|| format!("Failed to load menu {}", menu_id));
        }
    };
    let restaurant = client.restaurant(&menu.restaurant).await;
    spinner.finish_and_clear();
    let restaurant = restaurant.context("Failed to load restaurant")?;

    check_quantity(quantity)?;
    let mut builder = MenuBuilder::new(menu.clone(), PricingMode::for_menu(&restaurant, &menu));
    while builder.quantity() < quantity {
        builder.increment_quantity()?;
    }
    for pick in picks {
        builder.select_food(&FoodId::new(pick.as_str()))?;
    }
    for raw in options {
        let (food, rest) = raw
            .split_once('/')
            .ok_or_else(|| anyhow!("Expected `food id/Option title=accompaniment id`, got `{}`", raw))?;
        let food = FoodId::new(food.trim());
        let (title, item) = parse_option(rest)?;
        let single = menu
            .food(&food)
            .map(|mf| is_single_select(&mf.food, &title))
            .unwrap_or(false);
        if single {
            builder.select_single(&food, &title, &item)?;
        } else {
            builder.increment_option_item(&food, &title, &item)?;
        }
    }
    builder.set_comment(comment);

    let entry = builder.save()?;
    let mut store = ctx.cart_store()?;
    match store.add_menu(entry.clone()).map(|_| ()) {
        Err(CommerceError::RestaurantMismatch { current, attempted }) => {
            confirm_replace(ctx, &current, &attempted, yes)?;
            store.replace_with_menu(entry)?;
        }
        other => other?,
    }

    ctx.output.success(&format!("Added menu {} to the cart", menu.name));
    print_cart(ctx, store.state());
    Ok(())
}

/// Ask before emptying a cart that holds another restaurant's items.
fn confirm_replace(ctx: &Context, current: &str, attempted: &str, yes: bool) -> Result<()> {
    let confirmed = yes
        || (!ctx.output.is_json()
            && Confirm::new()
                .with_prompt(format!(
                    "Your cart holds items from {}. Empty it and order from {} instead?",
                    current, attempted
                ))
                .default(false)
                .interact()?);
    if !confirmed {
        bail!("Cart left unchanged: it holds items from restaurant {}", current);
    }
    ctx.output.warn("Previous cart emptied");
    Ok(())
}

fn check_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        bail!("Quantity must be at least 1");
    }
    Ok(())
}

fn is_single_select(food: &Food, title: &str) -> bool {
    food.option(title).map(|o| o.max_options <= 1).unwrap_or(false)
}

/// Parse `Option title=accompaniment id`.
fn parse_option(raw: &str) -> Result<(String, AccompanimentId)> {
    let (title, item) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Expected `Option title=accompaniment id`, got `{}`", raw))?;
    let (title, item) = (title.trim(), item.trim());
    if title.is_empty() || item.is_empty() {
        bail!("Expected `Option title=accompaniment id`, got `{}`", raw);
    }
    Ok((title.to_string(), AccompanimentId::new(item)))
}

fn set_quantity(ctx: &Context, entry: &str, quantity: u32) -> Result<()> {
    if quantity == 0 {
        bail!("Use `tavola cart remove {}` to drop an entry", entry);
    }

    let mut store = ctx.cart_store()?;
    let id = find_entry(store.state(), entry)?;

    if let Some(food) = store.state().food(&id).cloned() {
        let updated = requantify_food(&food, quantity)?;
        store.update_food(updated)?;
    } else if let Some(menu) = store.state().menu(&id).cloned() {
        let updated = requantify_menu(&menu, quantity)?;
        store.update_menu(updated)?;
    }

    ctx.output.success(&format!("Quantity set to {}", quantity));
    print_cart(ctx, store.state());
    Ok(())
}

fn requantify_food(entry: &FoodInCart, quantity: u32) -> Result<FoodInCart> {
    let mut builder = FoodBuilder::edit(entry);
    while builder.quantity() < quantity {
        builder.increment_quantity()?;
    }
    while builder.quantity() > quantity {
        builder.decrement_quantity()?;
    }
    Ok(builder.save()?)
}

fn requantify_menu(entry: &MenuInCart, quantity: u32) -> Result<MenuInCart> {
    let mut builder = MenuBuilder::edit(entry);
    while builder.quantity() < quantity {
        builder.increment_quantity()?;
    }
    while builder.quantity() > quantity {
        builder.decrement_quantity()?;
    }
    Ok(builder.save()?)
}

fn remove_entry(ctx: &Context, entry: &str) -> Result<()> {
    let mut store = ctx.cart_store()?;
    let id = find_entry(store.state(), entry)?;
    store.remove(&id)?;

    ctx.output.success("Entry removed");
    print_cart(ctx, store.state());
    Ok(())
}

fn reset_cart(ctx: &Context, yes: bool) -> Result<()> {
    let mut store = ctx.cart_store()?;
    if store.state().is_empty() {
        ctx.output.info("Cart is already empty");
        return Ok(());
    }

    if !yes
        && !Confirm::new()
            .with_prompt("Empty the cart?")
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    store.reset()?;
    ctx.output.success("Cart emptied");
    Ok(())
}

/// Resolve a full entry id or an unambiguous prefix.
fn find_entry(state: &CartState, needle: &str) -> Result<CartEntryId> {
    let ids = state
        .foods
        .iter()
        .map(|f| &f.id)
        .chain(state.menus.iter().map(|m| &m.id));

    let matches: Vec<&CartEntryId> = ids.filter(|id| id.as_str().starts_with(needle)).collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No cart entry matches `{}`", needle),
        _ if matches.iter().any(|id| id.as_str() == needle) => Ok(CartEntryId::new(needle)),
        _ => bail!("`{}` matches {} entries; use more characters", needle, matches.len()),
    }
}
