//! Journey runner: retries, filtering and the results file

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use shopcheck_common::Config;

use crate::error::{E2eError, E2eResult};
use crate::playwright::{BrowserDriver, StepResult};
use crate::steps::Journey;

/// Result of running a single journey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyResult {
    pub name: String,
    pub success: bool,
    pub attempts: u32,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running a set of journeys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub env: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<JourneyResult>,
}

impl SuiteResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the journey runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub env: String,
    /// Extra attempts after a failed run
    pub retries: u32,
    /// Budget for a single attempt at a journey
    pub journey_timeout: Duration,
    pub output_dir: PathBuf,
}

impl RunnerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            env: config.env().to_string(),
            retries: config.retry().retries,
            journey_timeout: Duration::from_millis(config.retry().max_timeout_ms),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            retries: 0,
            journey_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs journeys through a browser driver
pub struct JourneyRunner<D> {
    driver: D,
    config: RunnerConfig,
}

impl<D: BrowserDriver> JourneyRunner<D> {
    pub fn new(driver: D, config: RunnerConfig) -> Self {
        Self { driver, config }
    }

    /// Run every journey
    pub async fn run_all(&self, journeys: &[Journey]) -> SuiteResult {
        self.run_journeys(journeys.iter()).await
    }

    /// Run journeys carrying a tag
    pub async fn run_tagged(&self, journeys: &[Journey], tag: &str) -> SuiteResult {
        self.run_journeys(journeys.iter().filter(|j| j.has_tag(tag))).await
    }

    /// Run one journey by name
    pub async fn run_named(&self, journeys: &[Journey], name: &str) -> E2eResult<JourneyResult> {
        let journey = journeys
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| E2eError::JourneyNotFound(name.to_string()))?;
        Ok(self.run_journey(journey).await)
    }

    async fn run_journeys<'a>(&self, journeys: impl Iterator<Item = &'a Journey>) -> SuiteResult {
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let journeys: Vec<&Journey> = journeys.collect();
        let mut results = Vec::with_capacity(journeys.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} journey(s)...", journeys.len());

        for journey in &journeys {
            let result = self.run_journey(journey).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Journey results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteResult {
            env: self.config.env.clone(),
            started_at,
            total: journeys.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run one journey, retrying a failed run up to the configured count
    pub async fn run_journey(&self, journey: &Journey) -> JourneyResult {
        let start = Instant::now();
        let max_attempts = self.config.retries + 1;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(journey = %journey.name, attempt = attempts, "Running journey");

            let run = tokio::time::timeout(self.config.journey_timeout, self.driver.run(journey));
            let (success, steps, error) = match run.await {
                Ok(Ok(report)) => (report.success, report.steps, report.error),
                Ok(Err(e)) => (false, Vec::new(), Some(e.to_string())),
                Err(_) => (
                    false,
                    Vec::new(),
                    Some(format!(
                        "journey exceeded {} ms",
                        self.config.journey_timeout.as_millis()
                    )),
                ),
            };

            if success || attempts >= max_attempts {
                return JourneyResult {
                    name: journey.name.clone(),
                    success,
                    attempts,
                    duration_ms: start.elapsed().as_millis() as u64,
                    steps,
                    error,
                };
            }

            warn!(
                journey = %journey.name,
                attempt = attempts,
                error = error.as_deref().unwrap_or(""),
                "Journey failed, retrying"
            );
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
