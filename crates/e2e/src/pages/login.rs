//! Login page

use shopcheck_common::{Config, UiEndpoint};

use crate::error::E2eResult;
use crate::steps::UiStep;

const USERNAME_INPUT: &str = "[data-test=\"username\"]";
const PASSWORD_INPUT: &str = "[data-test=\"password\"]";
const LOGIN_BUTTON: &str = "[data-test=\"login-button\"]";
const ERROR_MESSAGE: &str = "[data-test=\"error\"]";
const ERROR_ICON: &str = ".error_icon";

pub struct LoginPage<'a> {
    config: &'a Config,
}

impl<'a> LoginPage<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn open(&self) -> Vec<UiStep> {
        vec![UiStep::Navigate {
            url: self.config.ui_url(UiEndpoint::Login),
            wait_for_selector: Some(LOGIN_BUTTON.to_string()),
        }]
    }

    pub fn fill_credentials(&self, username: &str, password: &str) -> Vec<UiStep> {
        vec![
            UiStep::fill(USERNAME_INPUT, username),
            UiStep::fill(PASSWORD_INPUT, password),
        ]
    }

    pub fn submit(&self) -> Vec<UiStep> {
        vec![UiStep::click(LOGIN_BUTTON)]
    }

    /// Open the page and log in with the credentials stored for `role`
    pub fn login_as(&self, role: &str) -> E2eResult<Vec<UiStep>> {
        let user = self.config.user(role)?;
        let mut steps = self.open();
        steps.extend(self.fill_credentials(&user.username, &user.password));
        steps.extend(self.submit());
        Ok(steps)
    }

    /// The error banner shows exactly `message` and the inputs carry error icons
    pub fn expect_error(&self, message: &str) -> Vec<UiStep> {
        vec![
            UiStep::expect_text(ERROR_MESSAGE, message),
            UiStep::expect_count(ERROR_ICON, 2),
        ]
    }

    pub fn expect_on_login_page(&self) -> Vec<UiStep> {
        vec![
            UiStep::expect_visible(LOGIN_BUTTON),
            UiStep::AssertUrl {
                contains: self.config.ui_url(UiEndpoint::Login),
            },
        ]
    }
}
