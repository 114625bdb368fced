//! Page objects for the storefront
//!
//! Each page turns an intent ("log in as the standard user", "add the
//! backpack to the cart") into [`UiStep`]s. [`journeys`] strings them into
//! the built-in suite.

pub mod cart;
pub mod checkout;
pub mod inventory;
pub mod login;
pub mod product;

pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use inventory::InventoryPage;
pub use login::LoginPage;
pub use product::ProductPage;

use shopcheck_common::Config;

use crate::error::E2eResult;
use crate::steps::{Journey, UiStep};

pub const BACKPACK: &str = "Sauce Labs Backpack";
pub const BIKE_LIGHT: &str = "Sauce Labs Bike Light";

/// Product name to the suffix used in its `data-test` ids,
/// e.g. "Sauce Labs Backpack" -> "sauce-labs-backpack"
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// The built-in storefront journeys
pub fn journeys(config: &Config) -> E2eResult<Vec<Journey>> {
    let login = LoginPage::new(config);
    let inventory = InventoryPage::new(config);
    let product = ProductPage::new(config);
    let cart = CartPage::new(config);
    let checkout = CheckoutPage::new(config);

    Ok(vec![
        Journey::new("login-standard-user", "Standard user lands on the inventory page")
            .tagged("login")
            .tagged("smoke")
            .then(login.login_as("standard")?)
            .then(inventory.expect_loaded()),
        Journey::new("login-locked-user", "Locked-out user is refused with an error")
            .tagged("login")
            .then(login.login_as("locked")?)
            .then(login.expect_error("Epic sadface: Sorry, this user has been locked out.")),
        Journey::new("login-empty-username", "Submitting without a username is rejected")
            .tagged("login")
            .then(login.open())
            .then(login.submit())
            .then(login.expect_error("Epic sadface: Username is required")),
        Journey::new("inventory-requires-login", "Direct inventory access bounces to login")
            .tagged("login")
            .then(inventory.open())
            .then(login.expect_on_login_page()),
        Journey::new("cart-add-and-remove", "Cart badge follows add and remove")
            .tagged("cart")
            .then(login.login_as("standard")?)
            .then(inventory.add_to_cart(BACKPACK))
            .then(inventory.add_to_cart(BIKE_LIGHT))
            .then(inventory.expect_cart_count(2))
            .then(inventory.remove_from_cart(BIKE_LIGHT))
            .then(inventory.expect_cart_count(1))
            .then(inventory.open_cart())
            .then(cart.expect_item(BACKPACK, "$29.99"))
            .then(cart.expect_absent(BIKE_LIGHT)),
        Journey::new("product-details", "Product page shows details and adds to cart")
            .tagged("cart")
            .then(login.login_as("standard")?)
            .then(product.open(4))
            .then(product.expect_details(BACKPACK, "$29.99"))
            .then(product.add_to_cart())
            .then(inventory.expect_cart_count(1))
            .then(product.back())
            .then(inventory.expect_loaded()),
        Journey::new("checkout-complete", "Standard user completes an order")
            .tagged("checkout")
            .tagged("smoke")
            .then(login.login_as("standard")?)
            .then(inventory.add_to_cart(BACKPACK))
            .then(cart.open())
            .then(cart.expect_item_count(1))
            .then(cart.checkout())
            .then(checkout.fill_shipping("John", "Doe", "12345"))
            .then(checkout.continue_to_overview())
            .then(checkout.expect_overview())
            .then(checkout.finish())
            .then(checkout.expect_complete("Thank you for your order!")),
        Journey::new("checkout-missing-postal-code", "Shipping form requires a postal code")
            .tagged("checkout")
            .then(login.login_as("standard")?)
            .then(inventory.add_to_cart(BACKPACK))
            .then(cart.open())
            .then(cart.checkout())
            .then(checkout.fill_shipping("John", "Doe", ""))
            .then(checkout.continue_to_overview())
            .then(checkout.expect_error("Error: Postal Code is required")),
        Journey::new("checkout-cancel", "Cancelling the shipping form returns to the cart")
            .tagged("checkout")
            .then(login.login_as("standard")?)
            .then(cart.open())
            .then(cart.checkout())
            .then(checkout.cancel())
            .then([UiStep::AssertUrl {
                contains: config.ui_path(shopcheck_common::UiEndpoint::Cart).to_string(),
            }]),
    ])
}
