//! Checkout command: order form, phone confirmation and submission.

use anyhow::{anyhow, bail, Context as _, Result};
use dialoguer::{Confirm, Input};
use tavola_commerce::cart::CartStore;
use tavola_commerce::catalog::Restaurant;
use tavola_commerce::checkout::{
    CheckoutForm, CheckoutSession, CommandType, Customer, DeliveryDetails, OrderConfirmation,
    PaymentMethod,
};
use tavola_commerce::storage::SessionCartStorage;
use tavola_commerce::CommerceError;
use tavola_data::ApiClient;
use tracing::info;

use super::cart::print_cart;
use super::CheckoutArgs;
use crate::context::Context;
use crate::output::format_price;

/// Run the checkout command.
pub async fn run(mut args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.cart_store()?;
    if store.state().is_empty() {
        bail!("Cart is empty; add something with `tavola cart add-food`");
    }
    let restaurant_id = store
        .state()
        .restaurant
        .clone()
        .context("Cart has no restaurant")?;

    let client = ctx.client()?;
    let spinner = ctx.output.spinner("Loading restaurant...");
    let restaurant = client.restaurant(&restaurant_id).await;
    spinner.finish_and_clear();
    let restaurant = restaurant.context("Failed to load restaurant")?;

    let command_type = resolve_command_type(args.command_type.as_deref(), ctx.config.checkout.default_type)?;
    if !restaurant.accepts(command_type) {
        let accepted: Vec<&str> = restaurant.command_types().iter().map(|t| t.as_str()).collect();
        bail!(
            "{} does not accept {} orders (accepts: {})",
            restaurant.name,
            command_type.as_str(),
            accepted.join(", ")
        );
    }
    let payment = resolve_payment(args.payment.as_deref(), ctx.config.checkout.payment_method)?;

    if !args.no_input {
        prompt_missing(&mut args, command_type)?;
    }
    let form = build_form(&args, command_type, payment, &restaurant);
    let missing = form.missing();
    if !missing.is_empty() {
        bail!("Missing {}", missing.join(", "));
    }

    print_cart(ctx, store.state());

    let mut session = CheckoutSession::new(client);
    let confirmation = if form.requires_confirmation() {
        if args.no_input {
            bail!("This order needs phone confirmation; run without --no-input");
        }
        confirm_and_place(ctx, &mut session, &mut store, &form).await?
    } else {
        let spinner = ctx.output.spinner("Placing order...");
        let result = session.submit(&mut store, &form).await;
        spinner.finish_and_clear();
        result.context("Order was not placed; your cart is unchanged")?
    };

    info!(code = confirmation.code, restaurant = %restaurant.id, "order placed");
    print_confirmation(ctx, &confirmation);
    Ok(())
}

/// Code cycle: send, ask, verify; a rejected code needs a fresh one.
async fn confirm_and_place(
    ctx: &Context,
    session: &mut CheckoutSession<ApiClient>,
    store: &mut CartStore<SessionCartStorage>,
    form: &CheckoutForm,
) -> Result<OrderConfirmation> {
    let phone = form.phone().unwrap_or_default().to_string();

    loop {
        let spinner = ctx.output.spinner("Sending confirmation code...");
        let sent = session.request_code(form).await;
        spinner.finish_and_clear();
        sent.context("Could not send a confirmation code")?;
        ctx.output.info(&format!("A confirmation code was sent to {}", phone));

        let code: String = Input::new()
            .with_prompt("Confirmation code")
            .interact_text()?;

        let spinner = ctx.output.spinner("Placing order...");
        let result = session.confirm_and_submit(store, form, code.trim()).await;
        spinner.finish_and_clear();

        match result {
            Ok(confirmation) => return Ok(confirmation),
            Err(CommerceError::ConfirmationRejected) => {
                ctx.output.warn("That code was not accepted");
                let again = Confirm::new()
                    .with_prompt("Send a new code?")
                    .default(true)
                    .interact()?;
                if !again {
                    bail!("Order not placed: phone not confirmed");
                }
            }
            Err(e) => return Err(anyhow!(e).context("Order was not placed; your cart is unchanged")),
        }
    }
}

fn resolve_command_type(arg: Option<&str>, default: CommandType) -> Result<CommandType> {
    match arg {
        Some(name) => CommandType::from_name(name)
            .with_context(|| format!("Unknown order type `{}` (delivery, on_site, takeaway)", name)),
        None => Ok(default),
    }
}

fn resolve_payment(arg: Option<&str>, default: PaymentMethod) -> Result<PaymentMethod> {
    match arg {
        Some(name) => PaymentMethod::from_name(name)
            .with_context(|| format!("Unknown payment method `{}` (cash, card, online)", name)),
        None => Ok(default),
    }
}

fn prompt_missing(args: &mut CheckoutArgs, command_type: CommandType) -> Result<()> {
    let guest = args.user.is_none();
    if guest && args.name.is_none() {
        args.name = Some(Input::new().with_prompt("Your name").interact_text()?);
    }

    let needs_phone = guest || matches!(command_type, CommandType::Delivery | CommandType::Takeaway);
    if needs_phone && args.phone.is_none() {
        args.phone = Some(Input::new().with_prompt("Phone number").interact_text()?);
    }

    if command_type == CommandType::Delivery && args.address.is_none() {
        args.address = Some(Input::new().with_prompt("Delivery address").interact_text()?);
        if args.city.is_none() {
            let city: String = Input::new()
                .with_prompt("City")
                .allow_empty(true)
                .interact_text()?;
            args.city = Some(city).filter(|c| !c.trim().is_empty());
        }
    }
    Ok(())
}

fn build_form(
    args: &CheckoutArgs,
    command_type: CommandType,
    payment: PaymentMethod,
    restaurant: &Restaurant,
) -> CheckoutForm {
    let customer = match args.user {
        Some(ref id) => Customer::User {
            id: id.as_str().into(),
            phone: args.phone.clone(),
        },
        None => Customer::Guest {
            name: args.name.clone().unwrap_or_default(),
            phone: args.phone.clone().unwrap_or_default(),
            email: args.email.clone(),
        },
    };

    let mut form = CheckoutForm::new(customer, command_type)
        .for_restaurant(restaurant)
        .with_payment(payment);

    if command_type == CommandType::Delivery {
        if let Some(ref address) = args.address {
            let mut delivery = DeliveryDetails::new(address.as_str());
            delivery.city = args.city.clone();
            delivery.floor = args.floor.clone();
            delivery.apartment = args.apartment.clone();
            form = form.with_delivery(delivery);
        }
    }
    if let Some(ref comment) = args.comment {
        form = form.with_comment(comment.as_str());
    }
    form
}

fn print_confirmation(ctx: &Context, confirmation: &OrderConfirmation) {
    if ctx.output.is_json() {
        ctx.output.json(confirmation);
        return;
    }

    ctx.output.success("Order placed");
    ctx.output.kv("tracking code", &confirmation.display_code());
    ctx.output.kv("type", confirmation.command_type.display_name());
    for line in &confirmation.lines {
        ctx.output.list_item(&format!(
            "{}x {}  {}",
            line.quantity,
            line.name,
            format_price(&line.total, confirmation.priceless)
        ));
        for detail in &line.details {
            ctx.output.sub_item(detail);
        }
    }
    ctx.output.kv(
        "total",
        &format_price(&confirmation.total_price, confirmation.priceless),
    );
    if let Some(ref address) = confirmation.delivery_address {
        ctx.output.kv("deliver to", address);
    }
}
