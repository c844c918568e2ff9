//! Catalog browsing commands.

use anyhow::{Context as _, Result};
use tavola_commerce::catalog::{Food, Menu, MenuType, Restaurant};
use tavola_commerce::ids::{FoodId, MenuId, RestaurantId};

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::format_price;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let spinner = ctx.output.spinner("Loading catalog...");

    let result = match args.command {
        CatalogCommand::Restaurant { id } => client
            .restaurant(&RestaurantId::new(id.as_str()))
            .await
            .with_context(|| format!("Failed to load restaurant {}", id))
            .map(|r| Listing::Restaurant(Box::new(r))),
        CatalogCommand::Foods { restaurant } => {
            let id = RestaurantId::new(restaurant.as_str());
            match client.restaurant(&id).await {
                Ok(r) => client
                    .foods(&id)
                    .await
                    .map(|foods| Listing::Foods(Box::new(r), foods))
                    .context("Failed to load foods"),
                Err(e) => Err(e).with_context(|| format!("Failed to load restaurant {}", restaurant)),
            }
        }
        CatalogCommand::Food { id } => client
            .food(&FoodId::new(id.as_str()))
            .await
            .with_context(|| format!("Failed to load food {}", id))
            .map(|f| Listing::Food(Box::new(f))),
        CatalogCommand::Menu { id } => client
            .menu(&MenuId::new(id.as_str()))
            .await
            .with_context(|| format!("Failed to load menu {}", id))
            .map(|m| Listing::Menu(Box::new(m))),
        CatalogCommand::Attributes => client
            .food_attributes()
            .await
            .context("Failed to load food attributes")
            .map(Listing::Attributes),
    };
    spinner.finish_and_clear();

    print_listing(ctx, &result?);
    Ok(())
}

enum Listing {
    Restaurant(Box<Restaurant>),
    Foods(Box<Restaurant>, Vec<Food>),
    Food(Box<Food>),
    Menu(Box<Menu>),
    Attributes(Vec<tavola_commerce::catalog::FoodAttribute>),
}

fn print_listing(ctx: &Context, listing: &Listing) {
    match listing {
        Listing::Restaurant(r) if ctx.output.is_json() => ctx.output.json(r),
        Listing::Foods(_, foods) if ctx.output.is_json() => ctx.output.json(foods),
        Listing::Food(f) if ctx.output.is_json() => ctx.output.json(f),
        Listing::Menu(m) if ctx.output.is_json() => ctx.output.json(m),
        Listing::Attributes(a) if ctx.output.is_json() => ctx.output.json(a),
        Listing::Restaurant(r) => print_restaurant(ctx, r),
        Listing::Foods(r, foods) => {
            ctx.output.header(&format!("{} ({} foods)", r.name, foods.len()));
            for food in foods {
                let price = format_price(&food.price, r.is_priceless());
                let mark = if food.available { "" } else { " (unavailable)" };
                ctx.output.table_row(
                    &[food.id.as_str(), food.name.as_str(), price.as_str(), mark],
                    &[16, 32, 10, 0],
                );
            }
        }
        Listing::Food(f) => print_food(ctx, f),
        Listing::Menu(m) => print_menu(ctx, m),
        Listing::Attributes(attributes) => {
            ctx.output.header("Food attributes");
            for attribute in attributes {
                ctx.output.list_item(&format!("{} ({})", attribute.name, attribute.id));
            }
        }
    }
}

fn print_restaurant(ctx: &Context, r: &Restaurant) {
    ctx.output.header(&r.name);
    ctx.output.kv("id", r.id.as_str());
    if let Some(ref description) = r.description {
        ctx.output.kv("description", description);
    }
    if !r.address.is_empty() {
        ctx.output.kv("address", &format!("{}, {}", r.address, r.city));
    }
    if let Some(ref hours) = r.opening_hours {
        ctx.output.kv("hours", hours);
    }
    let types: Vec<&str> = r.command_types().iter().map(|t| t.display_name()).collect();
    ctx.output.kv("orders", &types.join(", "));
    if r.is_priceless() {
        ctx.output.kv("prices", "hidden");
    }
}

fn print_food(ctx: &Context, food: &Food) {
    ctx.output.header(&food.name);
    ctx.output.kv("id", food.id.as_str());
    ctx.output.kv("restaurant", food.restaurant.as_str());
    ctx.output.kv("price", &food.price.display());
    if let Some(ref description) = food.description {
        ctx.output.kv("description", description);
    }
    for option in &food.options {
        let picks = match option.max_options {
            0 | 1 => "pick one".to_string(),
            n => format!("up to {}", n),
        };
        ctx.output.list_item(&format!("{} ({})", option.title, picks));
        for item in &option.items {
            ctx.output
                .sub_item(&format!("{}  {}  +{}", item.id, item.name, item.price.display()));
        }
    }
}

fn print_menu(ctx: &Context, menu: &Menu) {
    ctx.output.header(&menu.name);
    ctx.output.kv("id", menu.id.as_str());
    ctx.output.kv("type", menu.menu_type.as_str());
    if menu.menu_type == MenuType::FixedPrice {
        ctx.output.kv("price", &menu.price.display());
    }
    for entry in &menu.foods {
        let price = menu.price_of(entry);
        ctx.output
            .list_item(&format!("{}  {}  {}", entry.food.id, entry.food.name, price.display()));
    }
}
