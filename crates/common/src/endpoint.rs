//! Endpoint catalogue and path-template rendering
//!
//! UI and API endpoints are closed enums whose string forms match the keys
//! used in `urls.json`. A stored path may carry `{name}` placeholders that are
//! filled in at call time by [`render`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Named UI pages of the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiEndpoint {
    Login,
    Inventory,
    InventoryItem,
    Cart,
    Checkout,
    CheckoutOverview,
    CheckoutComplete,
}

impl UiEndpoint {
    pub const ALL: [UiEndpoint; 7] = [
        UiEndpoint::Login,
        UiEndpoint::Inventory,
        UiEndpoint::InventoryItem,
        UiEndpoint::Cart,
        UiEndpoint::Checkout,
        UiEndpoint::CheckoutOverview,
        UiEndpoint::CheckoutComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UiEndpoint::Login => "login",
            UiEndpoint::Inventory => "inventory",
            UiEndpoint::InventoryItem => "inventoryItem",
            UiEndpoint::Cart => "cart",
            UiEndpoint::Checkout => "checkout",
            UiEndpoint::CheckoutOverview => "checkoutOverview",
            UiEndpoint::CheckoutComplete => "checkoutComplete",
        }
    }
}

impl fmt::Display for UiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UiEndpoint::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| Error::UnknownEndpoint(format!("ui.{}", s)))
    }
}

/// Pet resource operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PetEndpoint {
    Create,
    GetById,
    Update,
    Delete,
}

impl PetEndpoint {
    pub const ALL: [PetEndpoint; 4] = [
        PetEndpoint::Create,
        PetEndpoint::GetById,
        PetEndpoint::Update,
        PetEndpoint::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetEndpoint::Create => "create",
            PetEndpoint::GetById => "getById",
            PetEndpoint::Update => "update",
            PetEndpoint::Delete => "delete",
        }
    }
}

/// Store resource operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEndpoint {
    Inventory,
    Order,
    OrderById,
    DeleteOrder,
}

impl StoreEndpoint {
    pub const ALL: [StoreEndpoint; 4] = [
        StoreEndpoint::Inventory,
        StoreEndpoint::Order,
        StoreEndpoint::OrderById,
        StoreEndpoint::DeleteOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreEndpoint::Inventory => "inventory",
            StoreEndpoint::Order => "order",
            StoreEndpoint::OrderById => "orderById",
            StoreEndpoint::DeleteOrder => "deleteOrder",
        }
    }
}

/// An API endpoint, grouped by resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEndpoint {
    Pet(PetEndpoint),
    Store(StoreEndpoint),
}

impl ApiEndpoint {
    pub fn resource(&self) -> &'static str {
        match self {
            ApiEndpoint::Pet(_) => "pet",
            ApiEndpoint::Store(_) => "store",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiEndpoint::Pet(e) => e.as_str(),
            ApiEndpoint::Store(e) => e.as_str(),
        }
    }

    /// Look up an endpoint by resource and operation name, e.g. `("pet", "getById")`
    pub fn lookup(resource: &str, name: &str) -> Result<Self> {
        let found = match resource {
            "pet" => PetEndpoint::ALL
                .into_iter()
                .find(|e| e.as_str() == name)
                .map(ApiEndpoint::Pet),
            "store" => StoreEndpoint::ALL
                .into_iter()
                .find(|e| e.as_str() == name)
                .map(ApiEndpoint::Store),
            _ => None,
        };
        found.ok_or_else(|| Error::UnknownEndpoint(format!("{}.{}", resource, name)))
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource(), self.name())
    }
}

impl FromStr for ApiEndpoint {
    type Err = Error;

    /// Parses the dotted form, e.g. `pet.getById`
    fn from_str(s: &str) -> Result<Self> {
        let (resource, name) = s
            .split_once('.')
            .ok_or_else(|| Error::UnknownEndpoint(s.to_string()))?;
        ApiEndpoint::lookup(resource, name)
    }
}

/// Path templates for the UI, one per [`UiEndpoint`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiRoutes {
    pub login: String,
    pub inventory: String,
    pub inventory_item: String,
    pub cart: String,
    pub checkout: String,
    pub checkout_overview: String,
    pub checkout_complete: String,
}

impl UiRoutes {
    pub fn get(&self, endpoint: UiEndpoint) -> &str {
        match endpoint {
            UiEndpoint::Login => &self.login,
            UiEndpoint::Inventory => &self.inventory,
            UiEndpoint::InventoryItem => &self.inventory_item,
            UiEndpoint::Cart => &self.cart,
            UiEndpoint::Checkout => &self.checkout,
            UiEndpoint::CheckoutOverview => &self.checkout_overview,
            UiEndpoint::CheckoutComplete => &self.checkout_complete,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetRoutes {
    pub create: String,
    pub get_by_id: String,
    pub update: String,
    pub delete: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRoutes {
    pub inventory: String,
    pub order: String,
    pub order_by_id: String,
    pub delete_order: String,
}

/// Path templates for the REST API, grouped by resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRoutes {
    pub pet: PetRoutes,
    pub store: StoreRoutes,
}

impl ApiRoutes {
    pub fn get(&self, endpoint: ApiEndpoint) -> &str {
        match endpoint {
            ApiEndpoint::Pet(e) => match e {
                PetEndpoint::Create => &self.pet.create,
                PetEndpoint::GetById => &self.pet.get_by_id,
                PetEndpoint::Update => &self.pet.update,
                PetEndpoint::Delete => &self.pet.delete,
            },
            ApiEndpoint::Store(e) => match e {
                StoreEndpoint::Inventory => &self.store.inventory,
                StoreEndpoint::Order => &self.store.order,
                StoreEndpoint::OrderById => &self.store.order_by_id,
                StoreEndpoint::DeleteOrder => &self.store.delete_order,
            },
        }
    }
}

/// Names of the `{name}` placeholders in a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                names.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    names
}

/// Substitute every `{name}` placeholder in `template` with `params[name]`.
///
/// The template is scanned once from left to right and substituted values
/// are never rescanned. Params without a matching placeholder are ignored and
/// an unterminated `{` is kept as-is. A placeholder with no param is an error.
pub fn render(template: &str, params: &HashMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };

        let name = &after[..close];
        let value = params.get(name).ok_or_else(|| Error::MissingPlaceholder {
            template: template.to_string(),
            placeholder: name.to_string(),
        })?;
        out.push_str(value);
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
