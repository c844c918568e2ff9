use std::sync::Arc;

use async_trait::async_trait;
use tavola_commerce::checkout::{ConfirmCodeRequest, SendCodeRequest};
use tavola_commerce::prelude::*;
use tavola_db::Db;

fn eur(cents: i64) -> Money {
    Money::new(cents, Currency::EUR)
}

fn restaurant() -> Restaurant {
    Restaurant::new("r1", "Chez Nous")
}

fn burger() -> Food {
    Food::new("burger", "r1", "Burger", eur(1000)).with_option(FoodOption::new(
        "Extras",
        3,
        vec![Accompaniment::new("cheese", "Cheese", eur(200))],
    ))
}

fn filled_store() -> CartStore<MemoryCartStorage> {
    let r = restaurant();
    let mut food = FoodBuilder::new(burger(), PricingMode::for_food(&r));
    food.increment_option_item("Extras", &AccompanimentId::new("cheese"))
        .unwrap();
    food.increment_option_item("Extras", &AccompanimentId::new("cheese"))
        .unwrap();
    food.increment_quantity().unwrap();
    food.increment_quantity().unwrap();

    let menu = Menu::new("formule", "r1", "Formule", MenuType::FixedPrice, eur(1500))
        .with_food(Food::new("soup", "r1", "Soup", eur(700)), eur(300));
    let mut menu_builder = MenuBuilder::new(menu.clone(), PricingMode::for_menu(&r, &menu));
    menu_builder.select_food(&FoodId::new("soup")).unwrap();

    let mut store = CartStore::open(MemoryCartStorage::new()).unwrap();
    store.add_food(food.save().unwrap()).unwrap();
    store.add_menu(menu_builder.save().unwrap()).unwrap();
    store
}

fn desk() -> Arc<OrderDesk<Arc<MemoryNotifier>>> {
    Arc::new(OrderDesk::new(
        Db::open_default().unwrap(),
        Arc::new(MemoryNotifier::new()),
    ))
}

#[test]
fn cart_totals_follow_composition() {
    let store = filled_store();
    let state = store.state();
    assert_eq!(state.total_count, 2);
    assert_eq!(state.total_price, eur(4200 + 1800));
    assert_eq!(state.restaurant, Some(RestaurantId::new("r1")));
    assert!(!state.priceless);
}

#[tokio::test]
async fn on_site_user_order_skips_confirmation() {
    let desk = desk();
    let mut store = filled_store();
    let mut session = CheckoutSession::new(desk.clone());
    let form = CheckoutForm::new(Customer::user("u1"), CommandType::OnSite)
        .for_restaurant(&restaurant());

    assert!(!form.requires_confirmation());
    let confirmation = session.submit(&mut store, &form).await.unwrap();

    assert_eq!(session.phase(), CheckoutPhase::Settled);
    assert_eq!(confirmation.total_price, eur(6000));
    assert_eq!(confirmation.lines.len(), 2);
    assert_eq!(confirmation.lines[0].details, vec!["Cheese x2".to_string()]);
    assert!(store.state().is_empty());

    let stored = desk.find_by_code(confirmation.code).unwrap();
    assert_eq!(stored.foods[0].quantity, 3);
    assert_eq!(stored.foods[0].accompaniments.len(), 2);
    assert!(!stored.confirmed);
}

#[tokio::test]
async fn guest_delivery_goes_through_code() {
    let desk = desk();
    let mut store = filled_store();
    let mut session = CheckoutSession::new(desk.clone());
    let form = CheckoutForm::new(Customer::guest("Ana", "06 12 34 56 78"), CommandType::Delivery)
        .with_delivery(DeliveryDetails::new("12 rue de la Paix"))
        .with_payment(PaymentMethod::Card);

    assert!(matches!(
        session.submit(&mut store, &form).await,
        Err(CommerceError::ConfirmationRequired(_))
    ));

    session.request_code(&form).await.unwrap();
    assert_eq!(session.phase(), CheckoutPhase::AwaitingCode);
    let code = desk.notifier().last_code_for("0612345678").unwrap();

    let confirmation = session
        .confirm_and_submit(&mut store, &form, &code)
        .await
        .unwrap();
    assert_eq!(session.phase(), CheckoutPhase::Settled);
    assert_eq!(
        confirmation.delivery_address.as_deref(),
        Some("12 rue de la Paix")
    );

    let stored = desk.find_by_code(confirmation.code).unwrap();
    assert!(stored.confirmed);
    assert_eq!(stored.payment.method, PaymentMethod::Card);
    assert!(store.state().is_empty());
}

#[tokio::test]
async fn wrong_code_requires_new_cycle() {
    let desk = desk();
    let mut store = filled_store();
    let mut session = CheckoutSession::new(desk.clone());
    let form = CheckoutForm::new(Customer::guest("Ana", "0600000000"), CommandType::Takeaway);

    session.request_code(&form).await.unwrap();
    let code = desk.notifier().last_code_for("0600000000").unwrap();
    let wrong = if code == "9999" { "0000" } else { "9999" };

    let err = session
        .confirm_and_submit(&mut store, &form, wrong)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::ConfirmationRejected));
    assert_eq!(session.phase(), CheckoutPhase::Idle);
    assert_eq!(store.state().total_count, 2);

    // The old code cannot be used without a new request.
    assert!(matches!(
        session.confirm_and_submit(&mut store, &form, &code).await,
        Err(CommerceError::InvalidCheckoutTransition { .. })
    ));

    session.request_code(&form).await.unwrap();
    let fresh = desk.notifier().last_code_for("0600000000").unwrap();
    session
        .confirm_and_submit(&mut store, &form, &fresh)
        .await
        .unwrap();
    assert_eq!(desk.notifier().sent_count(), 2);
}

struct FailingGateway;

#[async_trait]
impl OrderGateway for FailingGateway {
    async fn send_code(&self, _: &SendCodeRequest) -> Result<(), CommerceError> {
        Ok(())
    }

    async fn confirm_code(&self, _: &ConfirmCodeRequest) -> Result<CodeVerdict, CommerceError> {
        Ok(CodeVerdict::valid())
    }

    async fn submit(&self, _: &Command) -> Result<CommandReceipt, CommerceError> {
        Err(CommerceError::Gateway("connection reset".to_string()))
    }
}

#[tokio::test]
async fn failed_submission_keeps_cart() {
    let mut store = filled_store();
    let mut session = CheckoutSession::new(FailingGateway);
    let form = CheckoutForm::new(Customer::user("u1"), CommandType::OnSite);

    let err = session.submit(&mut store, &form).await.unwrap_err();
    assert!(matches!(err, CommerceError::Gateway(_)));
    assert_eq!(session.phase(), CheckoutPhase::Idle);
    assert_eq!(store.state().total_count, 2);
}

#[test]
fn priceless_restaurant_orders_at_zero() {
    let mut r = restaurant();
    r.show_price = false;

    let food = FoodBuilder::new(burger(), PricingMode::for_food(&r))
        .save()
        .unwrap();
    let mut store = CartStore::open(MemoryCartStorage::new()).unwrap();
    let state = store.add_food(food).unwrap();

    assert!(state.total_price.is_zero());
    assert!(state.priceless);
    assert_eq!(state.foods[0].food.price, eur(1000));
}
