//! Layered configuration: defaults, then JSON fixtures, then environment
//!
//! The data directory holds `urls.json` (UI and API base URLs plus endpoint
//! templates) and `users.json` (role to credentials). Environment variables
//! override fixture values when they are set and non-empty.
//!
//! A [`Config`] is immutable once loaded. Build one explicitly with
//! [`Config::load_from`] and hand it around as `Arc<Config>`, or install the
//! process-wide snapshot once with [`init`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::endpoint::{self, ApiEndpoint, ApiRoutes, UiEndpoint, UiRoutes};
use crate::error::{Error, Result};
use crate::poll::PollPolicy;
use crate::users::{Credentials, Users};

pub const DATA_DIR_VAR: &str = "SHOPCHECK_DATA_DIR";
pub const URLS_FILE: &str = "urls.json";
pub const USERS_FILE: &str = "users.json";

pub const DEFAULT_ENV: &str = "dev";
pub const DEFAULT_UI_BASE_URL: &str = "https://www.saucedemo.com";
pub const DEFAULT_API_BASE_URL: &str = "https://petstore.swagger.io/v2";
pub const DEFAULT_API_KEY: &str = "special-key";

/// Source of environment variables
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<K, V> EnvSource for HashMap<K, V>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
{
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.as_ref().to_string())
    }
}

/// A variable counts only when set and non-blank
fn lookup(env: &impl EnvSource, key: &str) -> Option<String> {
    env.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(env: &impl EnvSource, key: &str, default: T) -> Result<T> {
    match lookup(env, key) {
        Some(raw) => raw.parse().map_err(|_| Error::InvalidSetting {
            var: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn flag(env: &impl EnvSource, key: &str) -> bool {
    lookup(env, key).as_deref() == Some("true")
}

fn string_or(env: &impl EnvSource, key: &str, default: &str) -> String {
    lookup(env, key).unwrap_or_else(|| default.to_string())
}

/// Env value, else fixture value, else default
fn layered(env: &impl EnvSource, key: &str, fixture: Option<String>, default: &str) -> String {
    if let Some(value) = lookup(env, key) {
        debug!(var = key, "Environment override applied");
        return value;
    }
    fixture
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Directory holding the JSON fixtures
pub fn data_dir(env: &impl EnvSource) -> PathBuf {
    lookup(env, DATA_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn read_fixture<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::config_load(path, e))?;
    serde_json::from_str(&content).map_err(|e| Error::config_load(path, e))
}

#[derive(Debug, Deserialize)]
struct UrlsFixture {
    ui: UiFixture,
    api: ApiFixture,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiFixture {
    #[serde(default)]
    base_url: Option<String>,
    endpoints: UiRoutes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFixture {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    endpoints: ApiRoutes,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub base_url: String,
    pub endpoints: UiRoutes,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(skip)]
    pub api_key: String,
    pub endpoints: ApiRoutes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize)]
pub struct BrowserSettings {
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeouts {
    pub default_ms: u64,
    pub navigation_ms: u64,
    pub assertion_ms: u64,
}

/// Scenario-level retries
#[derive(Debug, Clone, Serialize)]
pub struct RetrySettings {
    pub retries: u32,
    pub max_timeout_ms: u64,
}

/// Screenshot or video capture on failure
#[derive(Debug, Clone, Serialize)]
pub struct CaptureSettings {
    pub on_failure: bool,
    pub path: PathBuf,
}

/// Eventual-consistency polling bounds
#[derive(Debug, Clone, Serialize)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

/// The merged, read-only configuration snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    env: String,
    ui: UiConfig,
    api: ApiConfig,
    #[serde(skip)]
    users: Users,
    browser: BrowserSettings,
    timeouts: Timeouts,
    retry: RetrySettings,
    screenshot: CaptureSettings,
    video: CaptureSettings,
    poll: PollSettings,
}

impl Config {
    /// Load from the process environment and its data directory
    pub fn load() -> Result<Self> {
        let env = ProcessEnv;
        Self::load_from(&data_dir(&env), &env)
    }

    /// Load fixtures from `dir` and apply overrides from `env`
    pub fn load_from(dir: &Path, env: &impl EnvSource) -> Result<Self> {
        let urls: UrlsFixture = read_fixture(&dir.join(URLS_FILE))?;
        let users: Users = read_fixture(&dir.join(USERS_FILE))?;

        let poll = PollSettings {
            max_attempts: parse_var(env, "POLL_MAX_ATTEMPTS", 5)?,
            delay_ms: parse_var(env, "POLL_DELAY_MS", 1000)?,
        };
        if poll.max_attempts == 0 {
            return Err(Error::InvalidSetting {
                var: "POLL_MAX_ATTEMPTS".to_string(),
                value: "0".to_string(),
            });
        }

        let config = Self {
            env: string_or(env, "TEST_ENV", DEFAULT_ENV),
            ui: UiConfig {
                base_url: layered(env, "UI_BASE_URL", urls.ui.base_url, DEFAULT_UI_BASE_URL),
                endpoints: urls.ui.endpoints,
            },
            api: ApiConfig {
                base_url: layered(env, "API_BASE_URL", urls.api.base_url, DEFAULT_API_BASE_URL),
                api_key: layered(env, "API_KEY", urls.api.api_key, DEFAULT_API_KEY),
                endpoints: urls.api.endpoints,
            },
            users,
            browser: BrowserSettings {
                headless: flag(env, "HEADLESS"),
                slow_mo_ms: parse_var(env, "SLOW_MO", 50)?,
                viewport: Viewport {
                    width: parse_var(env, "VIEWPORT_WIDTH", 1280)?,
                    height: parse_var(env, "VIEWPORT_HEIGHT", 720)?,
                },
            },
            timeouts: Timeouts {
                default_ms: parse_var(env, "DEFAULT_TIMEOUT", 30_000)?,
                navigation_ms: parse_var(env, "NAVIGATION_TIMEOUT", 30_000)?,
                assertion_ms: parse_var(env, "ASSERTION_TIMEOUT", 5_000)?,
            },
            retry: RetrySettings {
                retries: parse_var(env, "RETRY_COUNT", 2)?,
                max_timeout_ms: parse_var(env, "MAX_TIMEOUT", 30_000)?,
            },
            screenshot: CaptureSettings {
                on_failure: flag(env, "SCREENSHOT_ON_FAILURE"),
                path: PathBuf::from(string_or(env, "SCREENSHOT_PATH", "./test-results/screenshots")),
            },
            video: CaptureSettings {
                on_failure: flag(env, "VIDEO_ON_FAILURE"),
                path: PathBuf::from(string_or(env, "VIDEO_PATH", "./test-results/videos")),
            },
            poll,
        };

        info!(
            env = %config.env,
            ui = %config.ui.base_url,
            api = %config.api.base_url,
            users = config.users.len(),
            "Configuration loaded from {}",
            dir.display()
        );
        Ok(config)
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn ui_base_url(&self) -> &str {
        &self.ui.base_url
    }

    pub fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api.api_key
    }

    /// Path template for a UI endpoint given by its fixture name
    pub fn ui_endpoint(&self, name: &str) -> Result<&str> {
        let endpoint: UiEndpoint = name.parse()?;
        Ok(self.ui.endpoints.get(endpoint))
    }

    pub fn ui_path(&self, endpoint: UiEndpoint) -> &str {
        self.ui.endpoints.get(endpoint)
    }

    /// Fully qualified UI URL
    pub fn ui_url(&self, endpoint: UiEndpoint) -> String {
        join_url(&self.ui.base_url, self.ui_path(endpoint))
    }

    /// Path for `resource.name`, with placeholders filled from `params`.
    ///
    /// `None` counts as no params, so a templated endpoint fails with
    /// [`Error::MissingPlaceholder`].
    pub fn api_endpoint(
        &self,
        resource: &str,
        name: &str,
        params: Option<&HashMap<&str, String>>,
    ) -> Result<String> {
        let endpoint = ApiEndpoint::lookup(resource, name)?;
        match params {
            Some(params) => self.api_path(endpoint, params),
            None => self.api_path(endpoint, &HashMap::new()),
        }
    }

    /// The unrendered path template, e.g. `/pet/{petId}`
    pub fn api_template(&self, endpoint: ApiEndpoint) -> &str {
        self.api.endpoints.get(endpoint)
    }

    pub fn api_path(&self, endpoint: ApiEndpoint, params: &HashMap<&str, String>) -> Result<String> {
        endpoint::render(self.api.endpoints.get(endpoint), params)
    }

    /// Fully qualified API URL with placeholders filled from `params`
    pub fn api_url(&self, endpoint: ApiEndpoint, params: &HashMap<&str, String>) -> Result<String> {
        Ok(join_url(&self.api.base_url, &self.api_path(endpoint, params)?))
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn user(&self, role: &str) -> Result<&Credentials> {
        self.users.get(role)
    }

    pub fn browser(&self) -> &BrowserSettings {
        &self.browser
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn retry(&self) -> &RetrySettings {
        &self.retry
    }

    pub fn screenshot(&self) -> &CaptureSettings {
        &self.screenshot
    }

    pub fn video(&self) -> &CaptureSettings {
        &self.video
    }

    pub fn poll(&self) -> &PollSettings {
        &self.poll
    }

    pub fn poll_policy(&self) -> Result<PollPolicy> {
        PollPolicy::new(self.poll.max_attempts, Duration::from_millis(self.poll.delay_ms))
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() || path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

static SHARED: OnceCell<Arc<Config>> = OnceCell::new();

/// Load the process-wide snapshot on first call; later calls return it
pub fn init() -> Result<Arc<Config>> {
    SHARED
        .get_or_try_init(|| Config::load().map(Arc::new))
        .map(Arc::clone)
}

/// The process-wide snapshot installed by [`init`]
pub fn shared() -> Result<Arc<Config>> {
    SHARED.get().cloned().ok_or_else(|| {
        Error::config_load(data_dir(&ProcessEnv), "configuration has not been initialised")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{PetEndpoint, StoreEndpoint};
    use tempfile::TempDir;
    use test_case::test_case;

    const URLS: &str = r#"{
        "ui": {
            "baseUrl": "https://fixture.example",
            "endpoints": {
                "login": "/",
                "inventory": "/inventory.html",
                "inventoryItem": "/inventory-item.html",
                "cart": "/cart.html",
                "checkout": "/checkout-step-one.html",
                "checkoutOverview": "/checkout-step-two.html",
                "checkoutComplete": "/checkout-complete.html"
            }
        },
        "api": {
            "baseUrl": "https://api.fixture.example/v2/",
            "apiKey": "fixture-key",
            "endpoints": {
                "pet": {
                    "create": "/pet",
                    "getById": "/pet/{petId}",
                    "update": "/pet",
                    "delete": "/pet/{petId}"
                },
                "store": {
                    "inventory": "/store/inventory",
                    "order": "/store/order",
                    "orderById": "/store/order/{orderId}",
                    "deleteOrder": "/store/order/{orderId}"
                }
            }
        }
    }"#;

    const USERS: &str = r#"{
        "standard": { "username": "standard_user", "password": "secret_sauce" }
    }"#;

    fn fixture_dir(urls: &str, users: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(URLS_FILE), urls).unwrap();
        std::fs::write(dir.path().join(USERS_FILE), users).unwrap();
        dir
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    fn load(pairs: &[(&'static str, &'static str)]) -> Config {
        let dir = fixture_dir(URLS, USERS);
        Config::load_from(dir.path(), &env(pairs)).unwrap()
    }

    #[test]
    fn test_fixture_values_without_env() {
        let config = load(&[]);
        assert_eq!(config.env(), "dev");
        assert_eq!(config.ui_base_url(), "https://fixture.example");
        assert_eq!(config.api_base_url(), "https://api.fixture.example/v2/");
        assert_eq!(config.api_key(), "fixture-key");
        assert_eq!(config.user("standard").unwrap().username, "standard_user");
    }

    #[test_case("UI_BASE_URL", "https://env.example", "https://env.example" ; "set")]
    #[test_case("UI_BASE_URL", "", "https://fixture.example" ; "empty")]
    #[test_case("UI_BASE_URL", "   ", "https://fixture.example" ; "blank")]
    #[test_case("OTHER", "https://env.example", "https://fixture.example" ; "unset")]
    fn test_ui_override_precedence(var: &'static str, value: &'static str, expected: &str) {
        let config = load(&[(var, value)]);
        assert_eq!(config.ui_base_url(), expected);
    }

    #[test]
    fn test_api_overrides() {
        let config = load(&[("API_BASE_URL", "http://127.0.0.1:9999"), ("API_KEY", "env-key")]);
        assert_eq!(config.api_base_url(), "http://127.0.0.1:9999");
        assert_eq!(config.api_key(), "env-key");
    }

    #[test]
    fn test_defaults_when_fixture_omits_base_urls() {
        let urls = URLS
            .replace(r#""baseUrl": "https://fixture.example","#, "")
            .replace(r#""baseUrl": "https://api.fixture.example/v2/","#, "")
            .replace(r#""apiKey": "fixture-key","#, "");
        let dir = fixture_dir(&urls, USERS);
        let config = Config::load_from(dir.path(), &env(&[])).unwrap();
        assert_eq!(config.ui_base_url(), DEFAULT_UI_BASE_URL);
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.api_key(), DEFAULT_API_KEY);
    }

    #[test]
    fn test_runtime_settings_defaults_and_overrides() {
        let config = load(&[]);
        assert!(!config.browser().headless);
        assert_eq!(config.browser().slow_mo_ms, 50);
        assert_eq!(config.browser().viewport, Viewport { width: 1280, height: 720 });
        assert_eq!(config.timeouts().assertion_ms, 5000);
        assert_eq!(config.retry().retries, 2);
        assert_eq!(config.poll().max_attempts, 5);
        assert_eq!(config.poll_policy().unwrap(), PollPolicy::default());

        let config = load(&[
            ("HEADLESS", "true"),
            ("VIEWPORT_WIDTH", "375"),
            ("SCREENSHOT_ON_FAILURE", "true"),
            ("POLL_MAX_ATTEMPTS", "3"),
            ("POLL_DELAY_MS", "10"),
        ]);
        assert!(config.browser().headless);
        assert_eq!(config.browser().viewport.width, 375);
        assert!(config.screenshot().on_failure);
        assert_eq!(config.poll_policy().unwrap().max_attempts(), 3);
        assert_eq!(config.poll_policy().unwrap().delay(), Duration::from_millis(10));
    }

    #[test_case("SLOW_MO", "fast")]
    #[test_case("POLL_MAX_ATTEMPTS", "0")]
    #[test_case("VIEWPORT_HEIGHT", "-1")]
    fn test_invalid_numeric_setting(var: &'static str, value: &'static str) {
        let dir = fixture_dir(URLS, USERS);
        let err = Config::load_from(dir.path(), &env(&[(var, value)])).unwrap_err();
        assert!(matches!(&err, Error::InvalidSetting { var: v, .. } if v == var));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_fixture_is_config_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(URLS_FILE), URLS).unwrap();
        let err = Config::load_from(dir.path(), &env(&[])).unwrap_err();
        match err {
            Error::ConfigLoad { path, .. } => assert!(path.ends_with(USERS_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json_is_config_load_error() {
        let dir = fixture_dir("{ not json", USERS);
        assert!(matches!(
            Config::load_from(dir.path(), &env(&[])),
            Err(Error::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_fixture_missing_endpoint_slot_is_rejected() {
        let urls = URLS.replace(r#""orderById": "/store/order/{orderId}","#, "");
        let dir = fixture_dir(&urls, USERS);
        assert!(matches!(
            Config::load_from(dir.path(), &env(&[])),
            Err(Error::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_ui_endpoint_lookup() {
        let config = load(&[]);
        assert_eq!(config.ui_endpoint("cart").unwrap(), "/cart.html");
        assert_eq!(config.ui_endpoint("login").unwrap(), "/");
        assert!(matches!(config.ui_endpoint("payment"), Err(Error::UnknownEndpoint(_))));
        assert_eq!(
            config.ui_url(UiEndpoint::CheckoutComplete),
            "https://fixture.example/checkout-complete.html"
        );
    }

    #[test]
    fn test_api_endpoint_substitution() {
        let config = load(&[]);
        let params = HashMap::from([("petId", "42".to_string())]);
        assert_eq!(config.api_endpoint("pet", "getById", Some(&params)).unwrap(), "/pet/42");
        assert_eq!(config.api_endpoint("pet", "create", None).unwrap(), "/pet");
        assert!(matches!(
            config.api_endpoint("pet", "getById", None),
            Err(Error::MissingPlaceholder { placeholder, .. }) if placeholder == "petId"
        ));
        assert_eq!(
            config.api_template(ApiEndpoint::Pet(PetEndpoint::GetById)),
            "/pet/{petId}"
        );
        assert!(matches!(
            config.api_endpoint("store", "orderById", Some(&params)),
            Err(Error::MissingPlaceholder { placeholder, .. }) if placeholder == "orderId"
        ));
        assert!(matches!(
            config.api_endpoint("pet", "fly", None),
            Err(Error::UnknownEndpoint(name)) if name == "pet.fly"
        ));
    }

    #[test]
    fn test_api_url_joins_without_double_slash() {
        let config = load(&[]);
        let params = HashMap::from([("orderId", "3".to_string())]);
        assert_eq!(
            config
                .api_url(ApiEndpoint::Store(StoreEndpoint::DeleteOrder), &params)
                .unwrap(),
            "https://api.fixture.example/v2/store/order/3"
        );
        assert_eq!(
            config
                .api_url(ApiEndpoint::Pet(PetEndpoint::Create), &HashMap::new())
                .unwrap(),
            "https://api.fixture.example/v2/pet"
        );
    }

    #[test]
    fn test_serialized_snapshot_hides_secrets() {
        let json = serde_json::to_string(&load(&[])).unwrap();
        assert!(!json.contains("fixture-key"));
        assert!(!json.contains("secret_sauce"));
        assert!(json.contains("api.fixture.example"));
    }

    #[test]
    fn test_data_dir_override() {
        assert_eq!(data_dir(&env(&[])), PathBuf::from("data"));
        assert_eq!(
            data_dir(&env(&[(DATA_DIR_VAR, "/srv/fixtures")])),
            PathBuf::from("/srv/fixtures")
        );
    }
}
