//! Pet-store REST client
//!
//! Thin `reqwest` wrapper whose URLs all come from the configured endpoint
//! templates. Reads after a write go through the poller, because the public
//! pet store does not show a create or delete to the next read right away.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use shopcheck_common::{
    params, poll_until_cancelled, ApiEndpoint, Config, PetEndpoint, PollPolicy, Probe, StoreEndpoint,
    Verified,
};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub name: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl Pet {
    /// An available dog with one photo and a `friendly` tag
    pub fn sample(id: i64, name: &str) -> Self {
        Self {
            id,
            category: Some(Category {
                id: 1,
                name: "dogs".to_string(),
            }),
            name: name.to_string(),
            photo_urls: vec!["https://example.com/photo.jpg".to_string()],
            tags: vec![Tag {
                id: 1,
                name: "friendly".to_string(),
            }],
            status: Some(PetStatus::Available),
        }
    }

    pub fn with_status(mut self, status: PetStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Approved,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub pet_id: i64,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub complete: bool,
}

/// Result of a read by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Unexpected { status: u16, body: String },
}

/// Poll attempts spent on each verified step of [`PetStoreClient::pet_lifecycle`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleReport {
    pub pet_id: i64,
    pub create_attempts: u32,
    pub delete_attempts: u32,
}

/// Millisecond timestamp, unique enough per run for pet and order ids
pub fn unique_id() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Client for the pet and store resources
#[derive(Debug, Clone)]
pub struct PetStoreClient {
    http: reqwest::Client,
    config: Arc<Config>,
    cancel: CancellationToken,
}

impl PetStoreClient {
    pub fn new(config: Arc<Config>) -> E2eResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(config.api_key()).map_err(|_| {
            shopcheck_common::Error::InvalidSetting {
                var: "API_KEY".to_string(),
                value: "<not a valid header value>".to_string(),
            }
        })?;
        headers.insert("api_key", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeouts().default_ms))
            .build()?;

        Ok(Self {
            http,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop waiting in `verify_*` once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn url(&self, endpoint: ApiEndpoint, params: &HashMap<&str, String>) -> E2eResult<String> {
        Ok(self.config.api_url(endpoint, params)?)
    }

    fn pet_url(&self, endpoint: PetEndpoint, id: i64) -> E2eResult<String> {
        self.url(ApiEndpoint::Pet(endpoint), &params([("petId", id.to_string())]))
    }

    fn order_url(&self, endpoint: StoreEndpoint, id: i64) -> E2eResult<String> {
        self.url(ApiEndpoint::Store(endpoint), &params([("orderId", id.to_string())]))
    }

    /// POST a new pet
    pub async fn create_pet(&self, pet: &Pet) -> E2eResult<Pet> {
        let url = self.pet_url(PetEndpoint::Create, pet.id)?;
        info!("POST {}", url);
        debug!(?pet, "Request body");

        let response = self.http.post(&url).json(pet).send().await?;
        let created: Pet = expect_success("POST", &url, response).await?.json().await?;
        info!(id = created.id, "Created pet");
        Ok(created)
    }

    /// GET a pet by id
    pub async fn get_pet(&self, id: i64) -> E2eResult<Lookup<Pet>> {
        let url = self.pet_url(PetEndpoint::GetById, id)?;
        self.lookup(&url).await
    }

    /// PUT a full pet record
    pub async fn update_pet(&self, pet: &Pet) -> E2eResult<Pet> {
        let url = self.pet_url(PetEndpoint::Update, pet.id)?;
        info!("PUT {}", url);
        debug!(?pet, "Request body");

        let response = self.http.put(&url).json(pet).send().await?;
        Ok(expect_success("PUT", &url, response).await?.json().await?)
    }

    /// DELETE a pet
    pub async fn delete_pet(&self, id: i64) -> E2eResult<()> {
        let url = self.pet_url(PetEndpoint::Delete, id)?;
        info!("DELETE {}", url);

        let response = self.http.delete(&url).send().await?;
        expect_success("DELETE", &url, response).await?;
        Ok(())
    }

    /// Poll until a read by id returns the pet with this id
    pub async fn verify_created(&self, id: i64, policy: &PollPolicy) -> E2eResult<Verified<Pet>> {
        let what = format!("pet {} to exist", id);
        let verified = poll_until_cancelled(&what, policy, &self.cancel, |_| async move {
            match self.get_pet(id).await {
                Ok(Lookup::Found(pet)) if pet.id == id => Probe::Matched(pet),
                Ok(Lookup::Found(pet)) => Probe::NotYetVisible(format!("found pet {} instead", pet.id)),
                Ok(Lookup::NotFound) => Probe::NotYetVisible("HTTP 404".to_string()),
                Ok(Lookup::Unexpected { status, body }) => {
                    Probe::UnexpectedError(format!("HTTP {}: {}", status, body))
                }
                Err(e) => Probe::UnexpectedError(e.to_string()),
            }
        })
        .await?;
        Ok(verified)
    }

    /// Poll until a read by id returns HTTP 404
    pub async fn verify_deleted(&self, id: i64, policy: &PollPolicy) -> E2eResult<Verified<()>> {
        let what = format!("pet {} to be deleted", id);
        let verified = poll_until_cancelled(&what, policy, &self.cancel, |_| async move {
            match self.get_pet(id).await {
                Ok(Lookup::NotFound) => Probe::Matched(()),
                Ok(Lookup::Found(_)) => Probe::NotYetVisible("HTTP 200, pet still present".to_string()),
                Ok(Lookup::Unexpected { status, body }) => {
                    Probe::UnexpectedError(format!("HTTP {}: {}", status, body))
                }
                Err(e) => Probe::UnexpectedError(e.to_string()),
            }
        })
        .await?;
        Ok(verified)
    }

    /// Create, verify, rename, delete and verify a fresh pet
    pub async fn pet_lifecycle(&self, name: &str) -> E2eResult<LifecycleReport> {
        let policy = self.config.poll_policy()?;
        let pet = Pet::sample(unique_id(), name);

        let created = self.create_pet(&pet).await?;
        let visible = self.verify_created(created.id, &policy).await?;
        if visible.value.name != pet.name {
            return Err(E2eError::AssertionFailed(format!(
                "pet {} read back as {:?}, expected {:?}",
                pet.id, visible.value.name, pet.name
            )));
        }

        let renamed = Pet {
            name: format!("{}-updated", pet.name),
            ..pet.clone()
        }
        .with_status(PetStatus::Sold);
        let updated = self.update_pet(&renamed).await?;
        if updated.name != renamed.name || updated.status != Some(PetStatus::Sold) {
            return Err(E2eError::AssertionFailed(format!(
                "update of pet {} returned {:?}",
                pet.id, updated
            )));
        }

        self.delete_pet(pet.id).await?;
        let gone = self.verify_deleted(pet.id, &policy).await?;

        Ok(LifecycleReport {
            pet_id: pet.id,
            create_attempts: visible.attempts,
            delete_attempts: gone.attempts,
        })
    }

    /// Pet counts by status
    pub async fn inventory(&self) -> E2eResult<BTreeMap<String, i64>> {
        let url = self.url(ApiEndpoint::Store(StoreEndpoint::Inventory), &HashMap::new())?;
        info!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        Ok(expect_success("GET", &url, response).await?.json().await?)
    }

    pub async fn place_order(&self, order: &Order) -> E2eResult<Order> {
        let url = self.url(ApiEndpoint::Store(StoreEndpoint::Order), &HashMap::new())?;
        info!("POST {}", url);

        let response = self.http.post(&url).json(order).send().await?;
        Ok(expect_success("POST", &url, response).await?.json().await?)
    }

    pub async fn get_order(&self, id: i64) -> E2eResult<Lookup<Order>> {
        let url = self.order_url(StoreEndpoint::OrderById, id)?;
        self.lookup(&url).await
    }

    pub async fn delete_order(&self, id: i64) -> E2eResult<()> {
        let url = self.order_url(StoreEndpoint::DeleteOrder, id)?;
        info!("DELETE {}", url);

        let response = self.http.delete(&url).send().await?;
        expect_success("DELETE", &url, response).await?;
        Ok(())
    }

    async fn lookup<T: DeserializeOwned>(&self, url: &str) -> E2eResult<Lookup<T>> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            Ok(Lookup::NotFound)
        } else if status.is_success() {
            Ok(Lookup::Found(response.json().await?))
        } else {
            Ok(Lookup::Unexpected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

async fn expect_success(method: &'static str, url: &str, response: Response) -> E2eResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(E2eError::UnexpectedStatus {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pet_wire_format() {
        let pet = Pet::sample(1700000000000, "TestPet");
        let json = serde_json::to_value(&pet).unwrap();
        assert_eq!(json["id"], 1700000000000i64);
        assert_eq!(json["photoUrls"][0], "https://example.com/photo.jpg");
        assert_eq!(json["category"]["name"], "dogs");
        assert_eq!(json["status"], "available");
    }

    #[test]
    fn test_sparse_pet_from_server() {
        let pet: Pet = serde_json::from_str(r#"{"id": 5, "name": "Rex", "status": "sold"}"#).unwrap();
        assert_eq!(pet.id, 5);
        assert!(pet.photo_urls.is_empty());
        assert_eq!(pet.status, Some(PetStatus::Sold));
    }

    #[test]
    fn test_order_wire_format() {
        let order = Order {
            id: 3,
            pet_id: 5,
            quantity: 1,
            ship_date: None,
            status: Some(OrderStatus::Placed),
            complete: false,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["petId"], 5);
        assert_eq!(json["status"], "placed");
        assert!(json.get("shipDate").is_none());
    }

    #[test]
    fn test_unique_ids_increase() {
        let a = unique_id();
        let b = unique_id();
        assert!(b >= a);
    }
}
