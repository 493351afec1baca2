//! Stub classification/approval service
//!
//! Serves `POST /chat` and `POST /review` on an ephemeral local port and
//! counts every request it receives.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// How the stub answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    Success,
    /// 500, 500, then success (counted per endpoint)
    FailTwiceThenSucceed,
    /// Every request gets this status
    AlwaysStatus(u16),
    /// 200 with a body that does not match the contract
    Malformed,
}

#[derive(Clone)]
struct StubState {
    mode: Arc<Mutex<StubMode>>,
    chat_calls: Arc<AtomicUsize>,
    review_calls: Arc<AtomicUsize>,
    chat_body: Arc<Mutex<Value>>,
    /// `None` echoes the approval request back as ledger items
    review_body: Arc<Mutex<Option<Value>>>,
    last_chat: Arc<Mutex<Option<Value>>>,
    last_review: Arc<Mutex<Option<Value>>>,
}

pub struct StubService {
    pub base_url: String,
    state: StubState,
    handle: JoinHandle<()>,
}

impl StubService {
    pub async fn start(mode: StubMode) -> Self {
        let state = StubState {
            mode: Arc::new(Mutex::new(mode)),
            chat_calls: Arc::new(AtomicUsize::new(0)),
            review_calls: Arc::new(AtomicUsize::new(0)),
            chat_body: Arc::new(Mutex::new(receipt_a_response())),
            review_body: Arc::new(Mutex::new(None)),
            last_chat: Arc::new(Mutex::new(None)),
            last_review: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/chat", post(chat))
            .route("/review", post(review))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn set_mode(&self, mode: StubMode) {
        *self.state.mode.lock().unwrap() = mode;
    }

    pub fn set_chat_body(&self, body: Value) {
        *self.state.chat_body.lock().unwrap() = body;
    }

    pub fn set_review_body(&self, body: Value) {
        *self.state.review_body.lock().unwrap() = Some(body);
    }

    pub fn chat_calls(&self) -> usize {
        self.state.chat_calls.load(Ordering::SeqCst)
    }

    pub fn review_calls(&self) -> usize {
        self.state.review_calls.load(Ordering::SeqCst)
    }

    pub fn last_chat_request(&self) -> Option<Value> {
        self.state.last_chat.lock().unwrap().clone()
    }

    pub fn last_review_request(&self) -> Option<Value> {
        self.state.last_review.lock().unwrap().clone()
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn chat(State(state): State<StubState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let call = state.chat_calls.fetch_add(1, Ordering::SeqCst) + 1;
    *state.last_chat.lock().unwrap() = Some(body);
    let mode = *state.mode.lock().unwrap();
    let success = state.chat_body.lock().unwrap().clone();
    respond(mode, call, success)
}

async fn review(State(state): State<StubState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let call = state.review_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let mode = *state.mode.lock().unwrap();
    let success = state
        .review_body
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| echo_ledger(&body));
    *state.last_review.lock().unwrap() = Some(body);
    respond(mode, call, success)
}

fn respond(mode: StubMode, call: usize, success: Value) -> (StatusCode, Json<Value>) {
    match mode {
        StubMode::Success => (StatusCode::OK, Json(success)),
        StubMode::FailTwiceThenSucceed if call <= 2 => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "temporarily unavailable"})),
        ),
        StubMode::FailTwiceThenSucceed => (StatusCode::OK, Json(success)),
        StubMode::AlwaysStatus(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({"error": "stub failure"})),
        ),
        StubMode::Malformed => (
            StatusCode::OK,
            // No `response`, and a ledger item without `is_eligible`
            Json(json!({
                "items": [{"item_name": "Aspirin", "price": 9.99}],
                "unexpected": true
            })),
        ),
    }
}

/// Ledger items for every approved item, flagged by the bucket it came from
fn echo_ledger(request: &Value) -> Value {
    let mut items = Vec::new();
    for (bucket, is_eligible) in [
        ("approved_hsa_eligible_items", true),
        ("approved_non_hsa_eligible_items", false),
        ("approved_unsure_hsa_items", false),
    ] {
        for item in request[bucket].as_array().into_iter().flatten() {
            let quantity = item["quantity"].as_u64().unwrap_or(1);
            let price = item["price"].as_f64().unwrap_or(0.0) * quantity as f64;
            items.push(json!({
                "item_name": item["name"],
                "store_name": request["store_name"],
                "quantity": quantity,
                "price": price,
                "description": item["description"],
                "purchase_date": request["date"],
                "image_url": null,
                "is_eligible": is_eligible
            }));
        }
    }
    json!({ "items": items })
}

/// CVS receipt: Aspirin and Bandages eligible, Candy not
pub fn receipt_a_response() -> Value {
    json!({
        "response": "I found 3 items on your CVS Pharmacy receipt.",
        "review_request": {
            "receipt_id": "receipt-a",
            "store_name": "CVS Pharmacy",
            "date": "2024-11-20T00:00:00.000Z",
            "hsa_eligible_items": [
                {"name": "Aspirin", "price": 9.99, "quantity": 1, "description": "Pain relief"},
                {"name": "Bandages", "price": 5.49, "quantity": 2, "description": "Adhesive bandages"}
            ],
            "non_hsa_eligible_items": [
                {"name": "Candy", "price": 3.50, "quantity": 2, "description": "Chocolate bar"}
            ],
            "unsure_hsa_items": [],
            "payment_card": "Visa",
            "card_last_four_digit": "1234",
            "total_cost": 27.97
        },
        "image_url": "gs://receipts/receipt-a.jpg"
    })
}

/// Walgreens receipt: one eligible item, one unsure
pub fn receipt_b_response() -> Value {
    json!({
        "response": "I found 2 items on your Walgreens receipt.",
        "review_request": {
            "receipt_id": "receipt-b",
            "store_name": "Walgreens",
            "date": "2024-11-15",
            "hsa_eligible_items": [
                {"name": "Thermometer", "price": 15.49, "quantity": 1, "description": "Digital thermometer"}
            ],
            "non_hsa_eligible_items": [],
            "unsure_hsa_items": [
                {"name": "Vitamin C Gummies", "price": 8.99, "quantity": 1, "description": "Supplement"}
            ],
            "payment_card": "Mastercard",
            "card_last_four_digit": "5678",
            "total_cost": 24.48
        }
    })
}

/// Fixed approval reply with the given `(name, is_eligible)` items
pub fn approval_response(items: &[(&str, bool)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(name, is_eligible)| {
            json!({
                "item_name": name,
                "store_name": "CVS Pharmacy",
                "quantity": 1,
                "price": 9.99,
                "description": "",
                "purchase_date": "2024-11-20T00:00:00.000Z",
                "image_url": "gs://receipts/receipt-a.jpg",
                "is_eligible": is_eligible
            })
        })
        .collect();
    json!({ "items": items })
}

/// Raw TCP server that sends a `200 OK` header and part of the body, then
/// goes silent for `stall`
pub async fn start_stalled_body_server(stall: std::time::Duration) -> (String, JoinHandle<()>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            Content-Type: application/json\r\n\
                            Content-Length: 100\r\n\r\n\
                            {\"response\": \"par";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.flush().await;
                tokio::time::sleep(stall).await;
            });
        }
    });

    (base_url, handle)
}
