use std::sync::{Arc, Mutex};

use tavola_commerce::prelude::*;
use tavola_data::{ApiClient, FetchError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Recorded = Arc<Mutex<Vec<(String, String)>>>;

/// Serve one canned response per connection, recording request line and body.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Recorded) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let recorded: Recorded = Arc::default();
    let log = Arc::clone(&recorded);

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let (line, request_body) = read_request(&mut socket).await;
            log.lock().unwrap().push((line, request_body));

            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (base, recorded)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> (String, String) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if n == 0 {
            break buf.len();
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let line = head.lines().next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    (line, body)
}

const SOUP: &str = r#"{"id":"soup","restaurant":"r1","name":"Soup","price":{"amount":700}}"#;

#[tokio::test]
async fn catalog_read_retries_server_errors() {
    let (base, recorded) = serve(vec![(503, "{}"), (502, "{}"), (200, SOUP)]).await;
    let client = ApiClient::new(base).unwrap();

    let food = client.food(&FoodId::new("soup")).await.unwrap();
    assert_eq!(food.price, Money::new(700, Currency::EUR));
    assert!(food.available);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0].0, "GET /foods/soup HTTP/1.1");
}

#[tokio::test]
async fn missing_food_is_not_found() {
    let (base, _) = serve(vec![(404, r#"{"error":"not found"}"#)]).await;
    let client = ApiClient::new(base).unwrap();

    let err = client.food(&FoodId::new("nope")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn submission_posts_once_and_never_retries() {
    let (base, recorded) = serve(vec![(503, "{}")]).await;
    let client = ApiClient::new(base).unwrap();

    let mut store = CartStore::open(MemoryCartStorage::new()).unwrap();
    let food = Food::new("soup", "r1", "Soup", Money::new(700, Currency::EUR));
    store
        .add_food(FoodBuilder::new(food, PricingMode::Standard).save().unwrap())
        .unwrap();

    let mut session = CheckoutSession::new(client);
    let form = CheckoutForm::new(Customer::user("u1"), CommandType::OnSite);
    let err = session.submit(&mut store, &form).await.unwrap_err();

    assert!(matches!(err, CommerceError::Gateway(msg) if msg.contains("503")));
    assert_eq!(session.phase(), CheckoutPhase::Idle);
    assert_eq!(store.state().total_count, 1);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, "POST /commands HTTP/1.1");
    assert!(recorded[0].1.contains(r#""restaurant":"r1""#));
}

#[tokio::test]
async fn accepted_order_returns_receipt() {
    let (base, _) = serve(vec![(201, r#"{"id":"c1","code":42}"#)]).await;
    let client = ApiClient::new(base).unwrap();

    let mut store = CartStore::open(MemoryCartStorage::new()).unwrap();
    let food = Food::new("soup", "r1", "Soup", Money::new(700, Currency::EUR));
    store
        .add_food(FoodBuilder::new(food, PricingMode::Standard).save().unwrap())
        .unwrap();

    let mut session = CheckoutSession::new(client);
    let form = CheckoutForm::new(Customer::user("u1"), CommandType::OnSite);
    let confirmation = session.submit(&mut store, &form).await.unwrap();

    assert_eq!(confirmation.code, 42);
    assert_eq!(confirmation.display_code(), "000042");
    assert!(store.state().is_empty());
}

#[tokio::test]
async fn confirm_code_reads_verdict() {
    let (base, recorded) = serve(vec![(200, r#"{"valid":false}"#)]).await;
    let client = ApiClient::new(base).unwrap();

    let verdict = client
        .confirm_code(&tavola_commerce::checkout::ConfirmCodeRequest {
            phone: "0600000000".to_string(),
            code: "1234".to_string(),
        })
        .await
        .unwrap();
    assert!(!verdict.is_valid());
    assert!(recorded.lock().unwrap()[0].1.contains(r#""code":"1234""#));
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = ApiClient::new(base).unwrap();
    let err = client.food_attributes().await.unwrap_err();
    assert!(matches!(err, FetchError::Connection(_)));
}
