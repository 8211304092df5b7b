//! Integration tests for cartsync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartsync-integration-tests
//! ```
//!
//! No external services are needed: [`MockCommerce`] serves the commerce
//! REST API in-process on an ephemeral port, and the real `CommerceClient`
//! talks to it over HTTP.
//!
//! # Test Categories
//!
//! - `cart_sync` - controller against the store: ordering, merge behaviour
//! - `checkout` - capture success and refusal
//! - `storefront_routes` - JSON views through the axum router
//! - `preferences` - theme flag persistence

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use cartsync_storefront::commerce::{CartGateway, CommerceClient};
use cartsync_storefront::config::CommerceConfig;
use cartsync_storefront::state::AppState;
use cartsync_storefront::sync::CartController;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

/// Key the mock accepts in `X-Authorization`.
pub const PUBLIC_KEY: &str = "pk_test_mock";

// =============================================================================
// Catalog fixtures
// =============================================================================

/// A product served by the mock.
#[derive(Debug, Clone)]
pub struct MockProduct {
    pub id: &'static str,
    pub name: &'static str,
    pub price: Decimal,
}

/// Default catalog: two products.
#[must_use]
pub fn default_catalog() -> Vec<MockProduct> {
    vec![
        MockProduct {
            id: "prod_mug",
            name: "Enamel Mug",
            price: Decimal::new(1200, 2),
        },
        MockProduct {
            id: "prod_tee",
            name: "Logo Tee",
            price: Decimal::new(2500, 2),
        },
    ]
}

/// Mock behaviour switches.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Merge repeated adds of a product into one line (the store default).
    pub merge_adds: bool,
    pub products: Vec<MockProduct>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            merge_adds: true,
            products: default_catalog(),
        }
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
struct Line {
    id: String,
    product_id: String,
    quantity: u32,
}

#[derive(Default)]
struct Store {
    carts: HashMap<String, Vec<Line>>,
    expired_tokens: HashSet<String>,
    captured: Vec<Value>,
    delays: VecDeque<Duration>,
    fail_next: Option<(StatusCode, String)>,
    requests: Vec<String>,
}

struct MockState {
    options: MockOptions,
    store: Mutex<Store>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockState {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn product(&self, id: &str) -> Option<&MockProduct> {
        self.options.products.iter().find(|p| p.id == id)
    }

    fn render_line(&self, line: &Line) -> Value {
        let (name, price) = self
            .product(&line.product_id)
            .map_or(("Unknown", Decimal::ZERO), |p| (p.name, p.price));
        json!({
            "id": line.id,
            "product_id": line.product_id,
            "product_name": name,
            "quantity": line.quantity,
            "price": { "raw": price },
            "line_total": { "raw": price * Decimal::from(line.quantity) },
        })
    }

    fn render_cart(&self, id: &str, lines: &[Line]) -> Value {
        let subtotal: Decimal = lines
            .iter()
            .map(|l| {
                self.product(&l.product_id)
                    .map_or(Decimal::ZERO, |p| p.price * Decimal::from(l.quantity))
            })
            .sum();
        json!({
            "id": id,
            "line_items": lines.iter().map(|l| self.render_line(l)).collect::<Vec<_>>(),
            "total_items": lines.iter().map(|l| l.quantity).sum::<u32>(),
            "total_unique_items": lines.len(),
            "subtotal": { "raw": subtotal },
            "currency": { "code": "USD" },
        })
    }
}

/// Tracks one request being handled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Errors
// =============================================================================

struct MockError {
    status: StatusCode,
    message: String,
    kind: &'static str,
}

impl MockError {
    fn new(status: StatusCode, message: impl Into<String>, kind: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            kind,
        }
    }

    fn cart_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Cart not found", "not_found")
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "message": self.message, "type": self.kind } });
        (self.status, Json(body)).into_response()
    }
}

type MockResult = Result<Json<Value>, MockError>;

// =============================================================================
// MockCommerce
// =============================================================================

/// In-process commerce API.
///
/// Mutating requests can be slowed down with [`MockCommerce::script_delays`];
/// the mock records how many requests it handled at once.
pub struct MockCommerce {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockCommerce {
    /// Start with default options.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::start_with(MockOptions::default()).await
    }

    /// Start with the given options.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start_with(options: MockOptions) -> Self {
        let state = Arc::new(MockState {
            options,
            store: Mutex::new(Store::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });

        let api = Router::new()
            .route("/products", get(list_products))
            .route("/carts", get(create_cart))
            .route("/carts/{cart_id}", get(get_cart).post(add_item))
            .route("/carts/{cart_id}/items", axum::routing::delete(empty_cart))
            .route(
                "/carts/{cart_id}/items/{item_id}",
                put(update_item).delete(remove_item),
            )
            .route("/checkouts/{token}", post(capture));
        let app = Router::new().nest("/v1", api).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock commerce API");
        let addr = listener.local_addr().expect("Mock has no local address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// API base URL (`http://127.0.0.1:<port>/v1`).
    ///
    /// # Panics
    ///
    /// Never in practice: the address always forms a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/v1", self.addr)).expect("Mock URL is valid")
    }

    /// Commerce settings pointing at this mock.
    #[must_use]
    pub fn commerce_config(&self) -> CommerceConfig {
        CommerceConfig {
            api_url: self.base_url(),
            public_key: SecretString::from(PUBLIC_KEY),
        }
    }

    /// Real HTTP client pointing at this mock.
    #[must_use]
    pub fn client(&self) -> CommerceClient {
        CommerceClient::new(&self.commerce_config(), Duration::from_secs(60))
    }

    /// Controller driving the real client against this mock.
    #[must_use]
    pub fn controller(&self) -> CartController {
        let gateway: Arc<dyn CartGateway> = Arc::new(self.client());
        CartController::spawn(gateway, 16)
    }

    /// Delay the next mutating requests, one entry per request, in milliseconds.
    pub fn script_delays(&self, delays_ms: &[u64]) {
        self.state.store().delays = delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect();
    }

    /// Make captures with this token fail as expired.
    pub fn expire_token(&self, token: &str) {
        self.state.store().expired_tokens.insert(token.to_string());
    }

    /// Fail the next mutating request with the given status.
    pub fn fail_next(&self, status: StatusCode, message: &str) {
        self.state.store().fail_next = Some((status, message.to_string()));
    }

    /// Requests handled so far, as `METHOD /path` without the `/v1` prefix.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.store().requests.clone()
    }

    /// Number of mutating requests handled so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| !r.starts_with("GET"))
            .count()
    }

    /// Highest number of requests handled at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// `(product_id, quantity)` per line as the store holds them.
    #[must_use]
    pub fn cart_lines(&self, cart_id: &str) -> Option<Vec<(String, u32)>> {
        self.state.store().carts.get(cart_id).map(|lines| {
            lines
                .iter()
                .map(|l| (l.product_id.clone(), l.quantity))
                .collect()
        })
    }

    /// Capture payloads the mock accepted.
    #[must_use]
    pub fn captured_orders(&self) -> Vec<Value> {
        self.state.store().captured.clone()
    }
}

/// Serve the storefront router on an ephemeral port and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve_storefront(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind storefront");
    let addr = listener.local_addr().expect("Storefront has no local address");
    let app = cartsync_storefront::app(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}")
}

// =============================================================================
// Handlers
// =============================================================================

/// Check the key, log the request, then hold the scripted delay.
async fn enter<'a>(
    state: &'a MockState,
    headers: &HeaderMap,
    request: String,
    mutating: bool,
) -> Result<InFlight<'a>, MockError> {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);
    let guard = InFlight(&state.in_flight);

    let authorized = headers
        .get("X-Authorization")
        .and_then(|v| v.to_str().ok())
        == Some(PUBLIC_KEY);
    if !authorized {
        return Err(MockError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid public key",
            "authorization",
        ));
    }

    let delay = if mutating {
        state.store().delays.pop_front()
    } else {
        None
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut store = state.store();
    store.requests.push(request);
    if mutating {
        if let Some((status, message)) = store.fail_next.take() {
            return Err(MockError::new(status, message, "internal"));
        }
    }

    Ok(guard)
}

async fn list_products(State(state): State<Arc<MockState>>, headers: HeaderMap) -> MockResult {
    let _guard = enter(&state, &headers, "GET /products".to_string(), false).await?;
    let data: Vec<Value> = state
        .options
        .products
        .iter()
        .map(|p| json!({ "id": p.id, "name": p.name, "price": { "raw": p.price } }))
        .collect();
    Ok(Json(json!({ "data": data })))
}

async fn create_cart(State(state): State<Arc<MockState>>, headers: HeaderMap) -> MockResult {
    let _guard = enter(&state, &headers, "GET /carts".to_string(), false).await?;
    let id = format!("cart_{}", Uuid::new_v4().simple());
    state.store().carts.insert(id.clone(), Vec::new());
    Ok(Json(state.render_cart(&id, &[])))
}

async fn get_cart(
    State(state): State<Arc<MockState>>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
) -> MockResult {
    let _guard = enter(&state, &headers, format!("GET /carts/{cart_id}"), false).await?;
    let store = state.store();
    let lines = store
        .carts
        .get(&cart_id)
        .ok_or_else(MockError::cart_not_found)?;
    Ok(Json(state.render_cart(&cart_id, lines)))
}

#[derive(Deserialize)]
struct AddBody {
    id: String,
    quantity: i64,
}

#[derive(Deserialize)]
struct UpdateBody {
    quantity: i64,
}

fn positive(quantity: i64) -> Result<u32, MockError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| {
            MockError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "The quantity must be at least 1",
                "validation",
            )
        })
}

async fn add_item(
    State(state): State<Arc<MockState>>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> MockResult {
    let _guard = enter(
        &state,
        &headers,
        format!("POST /carts/{cart_id} {} {}", body.id, body.quantity),
        true,
    )
    .await?;
    let quantity = positive(body.quantity)?;
    if state.product(&body.id).is_none() {
        return Err(MockError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Product {} does not exist", body.id),
            "validation",
        ));
    }

    let mut store = state.store();
    let lines = store
        .carts
        .get_mut(&cart_id)
        .ok_or_else(MockError::cart_not_found)?;
    match lines
        .iter_mut()
        .find(|l| state.options.merge_adds && l.product_id == body.id)
    {
        Some(line) => line.quantity += quantity,
        None => lines.push(Line {
            id: format!("item_{}", Uuid::new_v4().simple()),
            product_id: body.id,
            quantity,
        }),
    }
    Ok(Json(json!({ "cart": state.render_cart(&cart_id, lines) })))
}

async fn update_item(
    State(state): State<Arc<MockState>>,
    Path((cart_id, item_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<UpdateBody>,
) -> MockResult {
    let _guard = enter(
        &state,
        &headers,
        format!("PUT /carts/{cart_id}/items/{item_id} {}", body.quantity),
        true,
    )
    .await?;
    let quantity = positive(body.quantity)?;

    let mut store = state.store();
    let lines = store
        .carts
        .get_mut(&cart_id)
        .ok_or_else(MockError::cart_not_found)?;
    let line = lines.iter_mut().find(|l| l.id == item_id).ok_or_else(|| {
        MockError::new(
            StatusCode::NOT_FOUND,
            "Line item not found",
            "not_found",
        )
    })?;
    line.quantity = quantity;
    Ok(Json(json!({ "cart": state.render_cart(&cart_id, lines) })))
}

async fn remove_item(
    State(state): State<Arc<MockState>>,
    Path((cart_id, item_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> MockResult {
    let _guard = enter(
        &state,
        &headers,
        format!("DELETE /carts/{cart_id}/items/{item_id}"),
        true,
    )
    .await?;

    let mut store = state.store();
    let lines = store
        .carts
        .get_mut(&cart_id)
        .ok_or_else(MockError::cart_not_found)?;
    lines.retain(|l| l.id != item_id);
    Ok(Json(json!({ "cart": state.render_cart(&cart_id, lines) })))
}

async fn empty_cart(
    State(state): State<Arc<MockState>>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
) -> MockResult {
    let _guard = enter(
        &state,
        &headers,
        format!("DELETE /carts/{cart_id}/items"),
        true,
    )
    .await?;

    let mut store = state.store();
    let lines = store
        .carts
        .get_mut(&cart_id)
        .ok_or_else(MockError::cart_not_found)?;
    lines.clear();
    Ok(Json(json!({ "cart": state.render_cart(&cart_id, lines) })))
}

async fn capture(
    State(state): State<Arc<MockState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> MockResult {
    let _guard = enter(&state, &headers, format!("POST /checkouts/{token}"), true).await?;

    let mut store = state.store();
    if store.expired_tokens.contains(&token) {
        return Err(MockError::new(
            StatusCode::UNAUTHORIZED,
            "Checkout token has expired",
            "authorization",
        ));
    }
    let has_lines = payload["line_items"]
        .as_object()
        .is_some_and(|lines| !lines.is_empty());
    if !has_lines {
        return Err(MockError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The checkout has no line items",
            "validation",
        ));
    }

    store.captured.push(payload.clone());
    let number = store.captured.len();
    Ok(Json(json!({
        "id": format!("ord_{number}"),
        "customer_reference": format!("ORD-{number:05}"),
        "customer": payload["customer"],
        "line_items": [],
        "total": { "raw": Decimal::ZERO },
        "currency": { "code": "USD" },
        "created": 1_700_000_000,
    })))
}
