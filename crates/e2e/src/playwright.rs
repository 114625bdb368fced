//! Playwright browser automation
//!
//! A journey is rendered to a single Node script and run with `node`. The
//! script prints one JSON marker per finished step on stdout and a JSON
//! failure record on stderr, which [`parse_report`] turns back into
//! [`StepResult`]s.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use shopcheck_common::Config;

use crate::error::{E2eError, E2eResult};
use crate::steps::{Journey, UiStep};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser: {}", other))),
        }
    }
}

/// Result of executing a journey step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// Everything a browser run of one journey produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyReport {
    pub success: bool,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// The browser side of the runner
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn run(&self, journey: &Journey) -> E2eResult<JourneyReport>;
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub default_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub assertion_timeout_ms: u64,
    pub screenshot_on_failure: bool,
    pub screenshot_dir: PathBuf,
    pub video_on_failure: bool,
    pub video_dir: PathBuf,
}

impl PlaywrightConfig {
    pub fn from_config(config: &Config) -> Self {
        let browser = config.browser();
        let timeouts = config.timeouts();
        Self {
            browser: Browser::default(),
            headless: browser.headless,
            slow_mo_ms: browser.slow_mo_ms,
            viewport_width: browser.viewport.width,
            viewport_height: browser.viewport.height,
            default_timeout_ms: timeouts.default_ms,
            navigation_timeout_ms: timeouts.navigation_ms,
            assertion_timeout_ms: timeouts.assertion_ms,
            screenshot_on_failure: config.screenshot().on_failure,
            screenshot_dir: config.screenshot().path.clone(),
            video_on_failure: config.video().on_failure,
            video_dir: config.video().path.clone(),
        }
    }
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            slow_mo_ms: 0,
            viewport_width: 1280,
            viewport_height: 720,
            default_timeout_ms: 30_000,
            navigation_timeout_ms: 30_000,
            assertion_timeout_ms: 5_000,
            screenshot_on_failure: false,
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            video_on_failure: false,
            video_dir: PathBuf::from("test-results/videos"),
        }
    }
}

/// Quote a string as a JavaScript literal
fn js(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a handle after checking that Playwright is installed
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self::unchecked(config))
    }

    /// Create a handle without touching the system, for script generation
    pub fn unchecked(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    fn failure_screenshot(&self, journey: &Journey) -> PathBuf {
        self.config
            .screenshot_dir
            .join(format!("{}-failure.png", journey.name))
    }

    /// Build the Playwright script for a journey
    pub fn build_script(&self, journey: &Journey) -> String {
        let c = &self.config;
        let mut script = String::new();

        let video = if c.video_on_failure {
            format!(", recordVideo: {{ dir: {} }}", js(&c.video_dir.to_string_lossy()))
        } else {
            String::new()
        };

        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless}, slowMo: {slow_mo} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}{video}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({default_timeout});
  page.setDefaultNavigationTimeout({navigation_timeout});
  let step = 0;
  let started = Date.now();
  const done = () => {{
    console.log(JSON.stringify({{ step, ms: Date.now() - started }}));
    step += 1;
    started = Date.now();
  }};

  try {{
"#,
            browser = c.browser.as_str(),
            headless = c.headless,
            slow_mo = c.slow_mo_ms,
            width = c.viewport_width,
            height = c.viewport_height,
            video = video,
            default_timeout = c.default_timeout_ms,
            navigation_timeout = c.navigation_timeout_ms,
        ));

        for (i, step) in journey.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&self.step_to_js(step));
            script.push_str("\n    done();\n");
        }

        let screenshot = if c.screenshot_on_failure {
            let path = self.failure_screenshot(journey);
            format!(
                "\n    await page.screenshot({{ path: {}, fullPage: true }}).catch(() => {{}});",
                js(&path.to_string_lossy())
            )
        } else {
            String::new()
        };

        script.push_str(&format!(
            r#"
    console.log(JSON.stringify({{ success: true }}));
  }} catch (error) {{{screenshot}
    console.error(JSON.stringify({{ success: false, step, error: error.message }}));
    process.exitCode = 1;
  }} finally {{
    await context.close();
    await browser.close();
  }}
}})();
"#,
            screenshot = screenshot,
        ));

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &UiStep) -> String {
        let assertion_timeout = self.config.assertion_timeout_ms;
        match step {
            UiStep::Navigate { url, wait_for_selector } => {
                let wait = wait_for_selector
                    .as_ref()
                    .map(|s| format!("\n    await page.waitForSelector({});", js(s)))
                    .unwrap_or_default();
                format!("    await page.goto({});{}", js(url), wait)
            }
            UiStep::Click { selector } => {
                format!("    await page.click({});", js(selector))
            }
            UiStep::Fill { selector, value } => {
                format!("    await page.fill({}, {});", js(selector), js(value))
            }
            UiStep::Press { selector, key } => match selector {
                Some(sel) => format!("    await page.locator({}).press({});", js(sel), js(key)),
                None => format!("    await page.keyboard.press({});", js(key)),
            },
            UiStep::Wait { selector, state } => {
                format!(
                    "    await page.waitForSelector({}, {{ state: '{}' }});",
                    js(selector),
                    state.as_str()
                )
            }
            UiStep::Assert {
                selector,
                visible,
                text,
                text_contains,
                count,
            } => {
                let locator = format!("page.locator({})", js(selector));
                let opts = format!("{{ timeout: {} }}", assertion_timeout);
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!(
                        "    await expect({}).toBeVisible({});",
                        locator, opts
                    )),
                    Some(false) => assertions.push(format!(
                        "    await expect({}).toBeHidden({});",
                        locator, opts
                    )),
                    None => {}
                }
                if let Some(t) = text {
                    assertions.push(format!(
                        "    await expect({}).toHaveText({}, {});",
                        locator,
                        js(t),
                        opts
                    ));
                }
                if let Some(t) = text_contains {
                    assertions.push(format!(
                        "    await expect({}).toContainText({}, {});",
                        locator,
                        js(t),
                        opts
                    ));
                }
                if let Some(n) = count {
                    assertions.push(format!(
                        "    await expect({}).toHaveCount({}, {});",
                        locator, n, opts
                    ));
                }
                assertions.join("\n")
            }
            UiStep::AssertUrl { contains } => {
                format!(
                    "    if (!page.url().includes({c})) throw new Error('Expected URL to contain ' + {c} + ' but was ' + page.url());",
                    c = js(contains)
                )
            }
            UiStep::Screenshot { name, full_page } => {
                let path = self.config.screenshot_dir.join(format!("{}.png", name));
                format!(
                    "    await page.screenshot({{ path: {}, fullPage: {} }});",
                    js(&path.to_string_lossy()),
                    full_page
                )
            }
            UiStep::Log { message } => {
                format!("    console.error('[journey] ' + {});", js(message))
            }
        }
    }

    /// Execute a script via Node, returning (exit ok, stdout, stderr)
    pub async fn run_script(&self, script: &str) -> E2eResult<(bool, String, String)> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("journey.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(std::env::current_dir()?)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightHandle {
    async fn run(&self, journey: &Journey) -> E2eResult<JourneyReport> {
        info!(journey = %journey.name, steps = journey.steps.len(), "Launching {}", self.config.browser.as_str());
        let script = self.build_script(journey);
        let (exit_ok, stdout, stderr) = self.run_script(&script).await?;

        let screenshot = self
            .config
            .screenshot_on_failure
            .then(|| self.failure_screenshot(journey));
        let report = parse_report(journey, exit_ok, &stdout, &stderr, screenshot);
        if !report.success {
            warn!(journey = %journey.name, error = report.error.as_deref().unwrap_or(""), "Journey failed");
        }
        Ok(report)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Marker {
    step: Option<usize>,
    ms: Option<u64>,
    success: Option<bool>,
    error: Option<String>,
}

fn markers(output: &str) -> impl Iterator<Item = Marker> + '_ {
    output
        .lines()
        .filter(|l| l.trim_start().starts_with('{'))
        .filter_map(|l| serde_json::from_str(l).ok())
}

/// Rebuild per-step results from the script's output
pub fn parse_report(
    journey: &Journey,
    exit_ok: bool,
    stdout: &str,
    stderr: &str,
    failure_screenshot: Option<PathBuf>,
) -> JourneyReport {
    let mut steps = Vec::new();
    let mut finished = false;

    for marker in markers(stdout) {
        if let (Some(i), None) = (marker.step, marker.success) {
            if let Some(step) = journey.steps.get(i) {
                steps.push(StepResult {
                    success: true,
                    step_name: step.name(),
                    duration_ms: marker.ms.unwrap_or(0),
                    error: None,
                    screenshot_path: None,
                });
            }
        }
        if marker.success == Some(true) {
            finished = true;
        }
    }

    if exit_ok && finished {
        return JourneyReport {
            success: true,
            steps,
            error: None,
        };
    }

    let failure = markers(stderr).find(|m| m.success == Some(false));
    let error = failure
        .as_ref()
        .and_then(|m| m.error.clone())
        .unwrap_or_else(|| {
            let tail = stderr.trim();
            if tail.is_empty() {
                "script exited without reporting success".to_string()
            } else {
                tail.to_string()
            }
        });

    let failed_index = failure.and_then(|m| m.step).unwrap_or(steps.len());
    if let Some(step) = journey.steps.get(failed_index) {
        steps.push(StepResult {
            success: false,
            step_name: step.name(),
            duration_ms: 0,
            error: Some(error.clone()),
            screenshot_path: failure_screenshot,
        });
    }

    JourneyReport {
        success: false,
        steps,
        error: Some(error),
    }
}
