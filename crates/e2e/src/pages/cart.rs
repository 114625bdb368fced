//! Cart page

use shopcheck_common::{Config, UiEndpoint};

use crate::steps::UiStep;

const CART_ITEM: &str = "[data-test=\"inventory-item\"]";
const CHECKOUT: &str = "[data-test=\"checkout\"]";
const CONTINUE_SHOPPING: &str = "[data-test=\"continue-shopping\"]";

pub struct CartPage<'a> {
    config: &'a Config,
}

impl<'a> CartPage<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn open(&self) -> Vec<UiStep> {
        vec![UiStep::navigate(self.config.ui_url(UiEndpoint::Cart))]
    }

    pub fn expect_item(&self, name: &str, price: &str) -> Vec<UiStep> {
        let row = format!("{}:has-text(\"{}\")", CART_ITEM, name);
        vec![
            UiStep::expect_visible(&row),
            UiStep::expect_text_contains(&format!("{} [data-test=\"inventory-item-price\"]", row), price),
        ]
    }

    pub fn expect_absent(&self, name: &str) -> Vec<UiStep> {
        vec![UiStep::expect_count(
            &format!("{}:has-text(\"{}\")", CART_ITEM, name),
            0,
        )]
    }

    pub fn expect_item_count(&self, count: usize) -> Vec<UiStep> {
        vec![UiStep::expect_count(CART_ITEM, count)]
    }

    pub fn remove(&self, name: &str) -> Vec<UiStep> {
        vec![UiStep::click(&format!(
            "[data-test=\"remove-{}\"]",
            super::slug(name)
        ))]
    }

    pub fn continue_shopping(&self) -> Vec<UiStep> {
        vec![UiStep::click(CONTINUE_SHOPPING)]
    }

    pub fn checkout(&self) -> Vec<UiStep> {
        vec![
            UiStep::click(CHECKOUT),
            UiStep::AssertUrl {
                contains: self.config.ui_path(UiEndpoint::Checkout).to_string(),
            },
        ]
    }
}
