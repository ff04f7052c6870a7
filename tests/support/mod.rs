//! In-process mock of the shop backend.
//!
//! Runs an axum server on a random port with in-memory collections. Every
//! request is recorded so tests can assert on the exact calls a screen made.
//! Like the real backend it hands out an `XSRF-TOKEN` cookie and refuses
//! mutating calls that do not echo it back.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use shop_admin::api::ApiClient;
use shop_admin::AdminConfig;

pub const XSRF_TOKEN: &str = "mock-xsrf-token";
pub const ACCESS_TOKEN: &str = "test-access-token";

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

struct Failure {
    method: Method,
    path: String,
    body_contains: Option<String>,
    status: StatusCode,
    body: String,
}

#[derive(Default)]
struct BackendState {
    requests: Vec<Recorded>,
    collections: HashMap<String, Vec<Value>>,
    next_id: i64,
    failures: Vec<Failure>,
    delays: HashMap<(Method, String), Duration>,
    menu: Vec<String>,
}

type Shared = Arc<Mutex<BackendState>>;

pub struct MockBackend {
    state: Shared,
    _handle: JoinHandle<()>,
    addr: SocketAddr,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            next_id: 1000,
            menu: vec!["customers".into(), "categories".into(), "products".into(), "orders".into()],
            ..Default::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to get local address");

        let app = Router::new()
            .fallback(handle)
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        Self { state, _handle: handle, addr }
    }

    /// API base URL, e.g. `http://127.0.0.1:12345/api`.
    pub fn url(&self) -> String { format!("http://{}/api", self.addr) }

    pub fn config(&self) -> AdminConfig {
        AdminConfig::default()
            .with_base_url(self.url())
            .with_tokens(Some(ACCESS_TOKEN.to_string()), None)
    }

    pub fn client(&self) -> ApiClient { ApiClient::new(&self.config()).expect("client") }

    /// Stores a record, assigning an id when it has none. Returns the id.
    pub fn seed(&self, resource: &str, mut item: Value) -> i64 {
        let mut state = self.state.lock();
        let key = id_key(resource);
        let id = match item.get(key).and_then(Value::as_i64) {
            Some(id) if id != 0 => id,
            _ => {
                state.next_id += 1;
                state.next_id
            }
        };
        item[key] = json!(id);
        state.collections.entry(resource.to_string()).or_default().push(item);
        id
    }

    pub fn items(&self, resource: &str) -> Vec<Value> {
        self.state.lock().collections.get(resource).cloned().unwrap_or_default()
    }

    /// Answers matching calls with `status` and a raw body instead of handling them.
    pub fn fail(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.fail_when(method, path, None, status, body);
    }

    /// Like [`fail`](Self::fail) but only for request bodies containing `needle`.
    pub fn fail_when(&self, method: Method, path: &str, needle: Option<&str>, status: StatusCode, body: &str) {
        self.state.lock().failures.push(Failure {
            method,
            path: path.to_string(),
            body_contains: needle.map(str::to_string),
            status,
            body: body.to_string(),
        });
    }

    pub fn clear_failures(&self) { self.state.lock().failures.clear(); }

    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        self.state.lock().delays.insert((method, path.to_string()), delay);
    }

    pub fn requests(&self) -> Vec<Recorded> { self.state.lock().requests.clone() }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.method == method && r.path == path).collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize { self.requests_to(method, path).len() }

    pub fn mutating_requests(&self) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.method != Method::GET).collect()
    }

    pub fn clear_requests(&self) { self.state.lock().requests.clear(); }
}

fn id_key(resource: &str) -> &'static str {
    match resource {
        "customers" => "customerID",
        "products" => "productID",
        "categories" => "categoryID",
        "orders" => "orderID",
        "details" => "orderDetailID",
        _ => "id",
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/api").trim_matches('/').to_string();
    let raw = String::from_utf8_lossy(&body).to_string();
    let json_body: Option<Value> = serde_json::from_slice(&body).ok();

    let delay = {
        let mut s = state.lock();
        s.requests.push(Recorded {
            method: method.clone(),
            path: path.clone(),
            query: query.clone(),
            headers: headers.clone(),
            body: json_body.clone(),
        });
        s.delays.get(&(method.clone(), path.clone())).copied()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if method != Method::GET && headers.get("x-xsrf-token").and_then(|v| v.to_str().ok()) != Some(XSRF_TOKEN) {
        return reply(StatusCode::FORBIDDEN, json!({ "message": "Invalid CSRF token" }).to_string());
    }

    let mut s = state.lock();
    let injected = s.failures.iter().find(|f| {
        f.method == method && f.path == path && f.body_contains.as_ref().map_or(true, |n| raw.contains(n.as_str()))
    });
    if let Some(failure) = injected {
        return reply(failure.status, failure.body.clone());
    }

    let segments: Vec<&str> = path.split('/').collect();
    let (status, value) = route(&mut s, &method, &segments, &query, json_body);
    let text = if value.is_null() { String::new() } else { value.to_string() };
    reply(status, text)
}

fn reply(status: StatusCode, body: String) -> Response {
    (
        status,
        [
            (header::SET_COOKIE, format!("XSRF-TOKEN={XSRF_TOKEN}; Path=/")),
            (header::CONTENT_TYPE, "application/json".to_string()),
        ],
        body,
    )
        .into_response()
}

fn route(
    s: &mut BackendState,
    method: &Method,
    segments: &[&str],
    query: &HashMap<String, String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let not_found = (StatusCode::NOT_FOUND, json!({ "message": "Not found" }));
    match (method.as_str(), segments) {
        ("GET", ["menu"]) => (StatusCode::OK, json!(s.menu)),
        ("GET", ["orders", "statuses"]) => (
            StatusCode::OK,
            json!([{ "id": 1, "name": "Pending" }, { "id": 2, "name": "Shipped" }, { "id": 3, "name": "Delivered" }]),
        ),
        ("GET", ["products", "list"]) => {
            let items: Vec<Value> = collection(s, "products")
                .iter()
                .map(|p| json!({ "id": p["productID"], "name": p["productName"], "sku": p["sku"], "price": p["price"] }))
                .collect();
            (StatusCode::OK, json!(items))
        }
        ("GET", ["customers", "list"]) => {
            let items: Vec<Value> = collection(s, "customers")
                .iter()
                .map(|c| {
                    let name = format!("{} {}", c["firstName"].as_str().unwrap_or(""), c["lastName"].as_str().unwrap_or(""));
                    json!({ "id": c["customerID"], "name": name })
                })
                .collect();
            (StatusCode::OK, json!(items))
        }
        ("GET", ["orders", id, "details"]) => {
            let id = parse_id(id);
            let details: Vec<Value> = collection(s, "details").into_iter().filter(|d| d["orderID"] == json!(id)).collect();
            (StatusCode::OK, json!(details))
        }
        ("POST", ["orders", id, "details"]) => {
            let Some(mut item) = body else { return (StatusCode::BAD_REQUEST, json!("Missing body")) };
            item["orderID"] = json!(parse_id(id));
            (StatusCode::OK, insert(s, "details", item))
        }
        ("PUT", ["orders", "details", id]) => replace(s, "details", parse_id(id), body),
        ("DELETE", ["orders", "details", id]) => remove(s, "details", parse_id(id)),
        ("GET", [resource]) => {
            let number: usize = query.get("pageNumber").and_then(|v| v.parse().ok()).unwrap_or(1);
            let size: usize = query.get("pageSize").and_then(|v| v.parse().ok()).unwrap_or(10);
            let all = collection(s, resource);
            let page: Vec<Value> = all.iter().skip(number.saturating_sub(1) * size).take(size).cloned().collect();
            let mut response = json!({ "totalCount": all.len() });
            response[*resource] = json!(page);
            (StatusCode::OK, response)
        }
        ("POST", [resource]) => match body {
            Some(item) if item.is_object() => (StatusCode::OK, insert(s, resource, item)),
            _ => (StatusCode::BAD_REQUEST, json!("Missing body")),
        },
        ("GET", [resource, id]) => {
            let key = id_key(resource);
            let id = parse_id(id);
            match collection(s, resource).into_iter().find(|i| i[key] == json!(id)) {
                Some(item) => (StatusCode::OK, item),
                None => not_found,
            }
        }
        ("PUT", [resource, id]) => replace(s, resource, parse_id(id), body),
        ("DELETE", [resource, id]) => remove(s, resource, parse_id(id)),
        _ => not_found,
    }
}

fn parse_id(raw: &str) -> i64 { raw.parse().unwrap_or(-1) }

fn collection(s: &BackendState, resource: &str) -> Vec<Value> {
    s.collections.get(resource).cloned().unwrap_or_default()
}

fn insert(s: &mut BackendState, resource: &str, mut item: Value) -> Value {
    s.next_id += 1;
    item[id_key(resource)] = json!(s.next_id);
    s.collections.entry(resource.to_string()).or_default().push(item.clone());
    item
}

fn replace(s: &mut BackendState, resource: &str, id: i64, body: Option<Value>) -> (StatusCode, Value) {
    let key = id_key(resource);
    let Some(mut item) = body else { return (StatusCode::BAD_REQUEST, json!("Missing body")) };
    item[key] = json!(id);
    match s.collections.get_mut(resource).and_then(|items| items.iter_mut().find(|i| i[key] == json!(id))) {
        Some(slot) => {
            *slot = item.clone();
            (StatusCode::OK, item)
        }
        None => (StatusCode::NOT_FOUND, json!({ "message": "Not found" })),
    }
}

fn remove(s: &mut BackendState, resource: &str, id: i64) -> (StatusCode, Value) {
    let key = id_key(resource);
    let Some(items) = s.collections.get_mut(resource) else { return (StatusCode::NOT_FOUND, Value::Null) };
    let before = items.len();
    items.retain(|i| i[key] != json!(id));
    if items.len() == before { (StatusCode::NOT_FOUND, Value::Null) } else { (StatusCode::OK, Value::Null) }
}
