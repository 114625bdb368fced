//! Checkout pages: shipping info, overview and completion

use shopcheck_common::{Config, UiEndpoint};

use crate::steps::UiStep;

const FIRST_NAME: &str = "[data-test=\"firstName\"]";
const LAST_NAME: &str = "[data-test=\"lastName\"]";
const POSTAL_CODE: &str = "[data-test=\"postalCode\"]";
const CONTINUE: &str = "[data-test=\"continue\"]";
const CANCEL: &str = "[data-test=\"cancel\"]";
const FINISH: &str = "[data-test=\"finish\"]";
const ERROR_MESSAGE: &str = "[data-test=\"error\"]";
const SUMMARY_INFO: &str = "[data-test=\"summary-info\"]";
const SUMMARY_SUBTOTAL: &str = "[data-test=\"summary-subtotal\"]";
const SUMMARY_TAX: &str = "[data-test=\"summary-tax\"]";
const SUMMARY_TOTAL: &str = "[data-test=\"summary-total\"]";
const COMPLETE_HEADER: &str = "[data-test=\"complete-header\"]";

pub struct CheckoutPage<'a> {
    config: &'a Config,
}

impl<'a> CheckoutPage<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn fill_shipping(&self, first_name: &str, last_name: &str, postal_code: &str) -> Vec<UiStep> {
        vec![
            UiStep::fill(FIRST_NAME, first_name),
            UiStep::fill(LAST_NAME, last_name),
            UiStep::fill(POSTAL_CODE, postal_code),
        ]
    }

    pub fn continue_to_overview(&self) -> Vec<UiStep> {
        vec![UiStep::click(CONTINUE)]
    }

    pub fn cancel(&self) -> Vec<UiStep> {
        vec![UiStep::click(CANCEL)]
    }

    pub fn finish(&self) -> Vec<UiStep> {
        vec![UiStep::click(FINISH)]
    }

    pub fn expect_error(&self, message: &str) -> Vec<UiStep> {
        vec![UiStep::expect_text_contains(ERROR_MESSAGE, message)]
    }

    pub fn expect_overview(&self) -> Vec<UiStep> {
        vec![
            UiStep::AssertUrl {
                contains: self.config.ui_path(UiEndpoint::CheckoutOverview).to_string(),
            },
            UiStep::expect_visible(SUMMARY_INFO),
            UiStep::expect_text_contains(SUMMARY_SUBTOTAL, "Item total: $"),
            UiStep::expect_text_contains(SUMMARY_TAX, "Tax: $"),
            UiStep::expect_text_contains(SUMMARY_TOTAL, "Total: $"),
        ]
    }

    pub fn expect_complete(&self, message: &str) -> Vec<UiStep> {
        vec![
            UiStep::AssertUrl {
                contains: self.config.ui_path(UiEndpoint::CheckoutComplete).to_string(),
            },
            UiStep::expect_text_contains(COMPLETE_HEADER, message),
        ]
    }
}
