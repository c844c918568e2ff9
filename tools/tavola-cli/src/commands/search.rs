//! Catalog search command.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tavola_commerce::search::SearchQuery;
use tavola_data::SearchSession;

use super::SearchArgs;
use crate::context::Context;
use crate::output::format_price;

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let query = build_query(&args);
    if query.is_empty() {
        ctx.output.warn("No filters given; listing everything");
    }

    let session = SearchSession::new(Arc::new(ctx.client()?));
    let spinner = ctx.output.spinner("Searching...");
    let results = session.search(query).await;
    spinner.finish_and_clear();
    let results = results.context("Search failed")?;

    if ctx.output.is_json() {
        ctx.output.json(&results);
        return Ok(());
    }

    let p = &results.pagination;
    ctx.output.header(&format!(
        "Results {}-{} of {} (page {}/{})",
        p.start_item(),
        p.end_item(),
        p.total,
        p.page,
        p.total_pages
    ));

    if results.is_empty() {
        ctx.output.info("Nothing matches.");
        return Ok(());
    }

    for restaurant in &results.restaurants {
        ctx.output
            .list_item(&format!("{}  {}", restaurant.id, restaurant.name));
    }
    for food in &results.foods {
        let price = format_price(&food.price, false);
        ctx.output.table_row(
            &[food.id.as_str(), food.name.as_str(), food.restaurant.as_str(), price.as_str()],
            &[16, 32, 16, 10],
        );
    }

    if p.has_next {
        ctx.output.info(&format!("More results: --page {}", p.page + 1));
    }
    Ok(())
}

fn build_query(args: &SearchArgs) -> SearchQuery {
    let mut query = SearchQuery::new().with_pagination(args.page, args.per_page);
    if let Some(ref text) = args.text {
        query = query.with_text(text.as_str());
    }
    if let Some(ref restaurant) = args.restaurant {
        query = query.in_restaurant(restaurant.as_str());
    }
    for attribute in &args.attributes {
        query = query.with_attribute(attribute.as_str());
    }
    query
}
