//! In-process pet store that shows writes to reads only after a lag

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use shopcheck_e2e::{Order, Pet};

#[derive(Debug, Default)]
struct Store {
    pets: HashMap<i64, Pet>,
    /// Reads left that still answer 404 for a fresh pet
    hidden: HashMap<i64, u32>,
    /// Deleted pets still served, with reads left
    ghosts: HashMap<i64, (Pet, u32)>,
    orders: HashMap<i64, Order>,
    create_lag: u32,
    delete_lag: u32,
    failing_reads: u32,
    reads: HashMap<i64, u32>,
    delete_keys: Vec<Option<String>>,
}

type Shared = Arc<Mutex<Store>>;

/// Handle to a running mock store; the server stops when dropped
#[derive(Debug)]
pub struct MockStore {
    addr: SocketAddr,
    state: Shared,
    task: JoinHandle<()>,
}

impl MockStore {
    /// Start on an ephemeral port
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = Router::new()
            .route("/pet", post(create_pet).put(update_pet))
            .route("/pet/:id", get(get_pet).delete(delete_pet))
            .route("/store/inventory", get(inventory))
            .route("/store/order", post(place_order))
            .route("/store/order/:id", get(get_order).delete(delete_order))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Reads of a new pet answer 404 this many times first
    pub fn set_create_lag(&self, reads: u32) {
        self.state.lock().unwrap().create_lag = reads;
    }

    /// Reads of a deleted pet still find it this many times first
    pub fn set_delete_lag(&self, reads: u32) {
        self.state.lock().unwrap().delete_lag = reads;
    }

    /// The next reads by id answer 500
    pub fn fail_next_reads(&self, reads: u32) {
        self.state.lock().unwrap().failing_reads = reads;
    }

    /// Insert a pet that is visible immediately
    pub fn seed(&self, pet: Pet) {
        self.state.lock().unwrap().pets.insert(pet.id, pet);
    }

    pub fn reads_of(&self, id: i64) -> u32 {
        self.state.lock().unwrap().reads.get(&id).copied().unwrap_or(0)
    }

    /// `api_key` header seen on each delete
    pub fn delete_keys(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().delete_keys.clone()
    }
}

impl Drop for MockStore {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "code": 1, "type": "error", "message": format!("{} not found", what) })),
    )
        .into_response()
}

async fn create_pet(State(state): State<Shared>, Json(pet): Json<Pet>) -> Json<Pet> {
    let mut store = state.lock().unwrap();
    let lag = store.create_lag;
    if lag > 0 {
        store.hidden.insert(pet.id, lag);
    }
    store.pets.insert(pet.id, pet.clone());
    Json(pet)
}

async fn update_pet(State(state): State<Shared>, Json(pet): Json<Pet>) -> Response {
    let mut store = state.lock().unwrap();
    match store.pets.get_mut(&pet.id) {
        Some(existing) => {
            *existing = pet.clone();
            Json(pet).into_response()
        }
        None => not_found("Pet"),
    }
}

async fn get_pet(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut store = state.lock().unwrap();
    *store.reads.entry(id).or_insert(0) += 1;

    if store.failing_reads > 0 {
        store.failing_reads -= 1;
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response();
    }
    if let Some(left) = store.hidden.get_mut(&id) {
        *left -= 1;
        if *left == 0 {
            store.hidden.remove(&id);
        }
        return not_found("Pet");
    }
    if let Some((pet, left)) = store.ghosts.get_mut(&id) {
        let pet = pet.clone();
        *left -= 1;
        if *left == 0 {
            store.ghosts.remove(&id);
        }
        return Json(pet).into_response();
    }
    match store.pets.get(&id) {
        Some(pet) => Json(pet.clone()).into_response(),
        None => not_found("Pet"),
    }
}

async fn delete_pet(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut store = state.lock().unwrap();
    let key = headers
        .get("api_key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    store.delete_keys.push(key);

    let removed = store.pets.remove(&id);
    match removed {
        Some(pet) => {
            let lag = store.delete_lag;
            if lag > 0 {
                store.ghosts.insert(id, (pet, lag));
            }
            Json(json!({ "code": 200, "type": "unknown", "message": id.to_string() }))
                .into_response()
        }
        None => not_found("Pet"),
    }
}

async fn inventory(State(state): State<Shared>) -> Json<HashMap<String, i64>> {
    let store = state.lock().unwrap();
    let mut counts = HashMap::new();
    for pet in store.pets.values() {
        let status = pet
            .status
            .map(|s| serde_json::to_value(s).unwrap().as_str().unwrap().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        *counts.entry(status).or_insert(0) += 1;
    }
    Json(counts)
}

async fn place_order(State(state): State<Shared>, Json(order): Json<Order>) -> Json<Order> {
    state.lock().unwrap().orders.insert(order.id, order.clone());
    Json(order)
}

async fn get_order(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().unwrap().orders.get(&id) {
        Some(order) => Json(order.clone()).into_response(),
        None => not_found("Order"),
    }
}

async fn delete_order(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().unwrap().orders.remove(&id) {
        Some(_) => Json(json!({ "code": 200, "message": id.to_string() })).into_response(),
        None => not_found("Order"),
    }
}
