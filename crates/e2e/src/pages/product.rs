//! Product details page

use shopcheck_common::{Config, UiEndpoint};

use crate::steps::UiStep;

const CONTAINER: &str = "[data-test=\"inventory-container\"]";
const NAME: &str = "[data-test=\"inventory-item-name\"]";
const DESCRIPTION: &str = "[data-test=\"inventory-item-desc\"]";
const PRICE: &str = "[data-test=\"inventory-item-price\"]";
const ADD_TO_CART: &str = "[data-test=\"add-to-cart\"]";
const REMOVE: &str = "[data-test=\"remove\"]";
const BACK: &str = "[data-test=\"back-to-products\"]";

pub struct ProductPage<'a> {
    config: &'a Config,
}

impl<'a> ProductPage<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn open(&self, product_id: u32) -> Vec<UiStep> {
        vec![UiStep::Navigate {
            url: format!("{}?id={}", self.config.ui_url(UiEndpoint::InventoryItem), product_id),
            wait_for_selector: Some(CONTAINER.to_string()),
        }]
    }

    pub fn expect_details(&self, name: &str, price: &str) -> Vec<UiStep> {
        vec![
            UiStep::expect_text(NAME, name),
            UiStep::expect_text(PRICE, price),
            UiStep::expect_visible(DESCRIPTION),
        ]
    }

    pub fn add_to_cart(&self) -> Vec<UiStep> {
        vec![UiStep::click(ADD_TO_CART), UiStep::expect_visible(REMOVE)]
    }

    pub fn remove_from_cart(&self) -> Vec<UiStep> {
        vec![UiStep::click(REMOVE), UiStep::expect_visible(ADD_TO_CART)]
    }

    pub fn back(&self) -> Vec<UiStep> {
        vec![UiStep::click(BACK)]
    }
}
