//! Inventory (product list) page

use shopcheck_common::{Config, UiEndpoint};

use crate::steps::UiStep;

const INVENTORY_CONTAINER: &str = "#inventory_container";
const CART_LINK: &str = ".shopping_cart_link";
const CART_BADGE: &str = ".shopping_cart_badge";

pub struct InventoryPage<'a> {
    config: &'a Config,
}

impl<'a> InventoryPage<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn open(&self) -> Vec<UiStep> {
        vec![UiStep::navigate(self.config.ui_url(UiEndpoint::Inventory))]
    }

    pub fn expect_loaded(&self) -> Vec<UiStep> {
        vec![
            UiStep::wait(INVENTORY_CONTAINER),
            UiStep::AssertUrl {
                contains: self.config.ui_path(UiEndpoint::Inventory).to_string(),
            },
        ]
    }

    pub fn add_to_cart(&self, product: &str) -> Vec<UiStep> {
        vec![UiStep::click(&format!(
            ".inventory_item:has-text(\"{}\") [data-test^=\"add-to-cart-\"]",
            product
        ))]
    }

    pub fn remove_from_cart(&self, product: &str) -> Vec<UiStep> {
        vec![UiStep::click(&format!(
            "[data-test=\"remove-{}\"]",
            super::slug(product)
        ))]
    }

    pub fn open_product(&self, product: &str) -> Vec<UiStep> {
        vec![UiStep::click(&format!(
            "[data-test=\"inventory-item-name\"]:has-text(\"{}\")",
            product
        ))]
    }

    /// An empty cart shows no badge at all
    pub fn expect_cart_count(&self, count: usize) -> Vec<UiStep> {
        if count == 0 {
            vec![UiStep::expect_hidden(CART_BADGE)]
        } else {
            vec![UiStep::expect_text(CART_BADGE, &count.to_string())]
        }
    }

    pub fn open_cart(&self) -> Vec<UiStep> {
        vec![UiStep::click(CART_LINK)]
    }
}
