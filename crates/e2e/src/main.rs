//! shopcheck - storefront and pet-store checks
//!
//! Exit codes: 0 when every check passed, 1 when a check failed, 2 when the
//! run could not be set up (bad configuration, Playwright missing).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shopcheck_common::{config, Config};
use shopcheck_e2e::pages;
use shopcheck_e2e::playwright::Browser;
use shopcheck_e2e::{
    JourneyRunner, PetStoreClient, PlaywrightConfig, PlaywrightHandle, RunnerConfig, SuiteResult,
};

#[derive(Parser)]
#[command(name = "shopcheck")]
#[command(author, version, about = "End-to-end checks for the storefront and pet-store API")]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration as JSON
    Config,

    /// Run the pet lifecycle against the configured API
    Api {
        /// Name for the pet created by this run
        #[arg(long, default_value = "TestPet")]
        pet_name: String,
    },

    /// Run the built-in storefront journeys
    Ui {
        /// Run only journeys carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Run only the journey with this name
        #[arg(short, long, conflicts_with = "tag")]
        name: Option<String>,

        /// List journeys without running them
        #[arg(long)]
        list: bool,

        /// Browser to use (chromium, firefox, webkit)
        #[arg(long, default_value = "chromium")]
        browser: String,

        /// Output directory for results
        #[arg(short, long, default_value = "test-results")]
        output: PathBuf,
    },
}

/// Outcome of a command that got far enough to run its checks
enum Verdict {
    Passed,
    Failed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match run(cli.command).await {
        Ok(Verdict::Passed) => ExitCode::SUCCESS,
        Ok(Verdict::Failed) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<Verdict> {
    let config = config::init().context("failed to load configuration")?;
    info!(env = config.env(), "Configuration loaded");

    match command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&masked(&config)?)?);
            Ok(Verdict::Passed)
        }
        Commands::Api { pet_name } => run_api(config, &pet_name).await,
        Commands::Ui {
            tag,
            name,
            list,
            browser,
            output,
        } => {
            let journeys = pages::journeys(&config)?;
            if list {
                for journey in &journeys {
                    println!(
                        "{:<32} [{}] {}",
                        journey.name,
                        journey.tags.join(","),
                        journey.description
                    );
                }
                return Ok(Verdict::Passed);
            }

            let playwright = PlaywrightHandle::new(PlaywrightConfig {
                browser: browser.parse::<Browser>()?,
                ..PlaywrightConfig::from_config(&config)
            })?;
            let runner = JourneyRunner::new(
                playwright,
                RunnerConfig {
                    output_dir: output,
                    ..RunnerConfig::from_config(&config)
                },
            );

            let results = if let Some(name) = name {
                let result = runner.run_named(&journeys, &name).await?;
                SuiteResult {
                    env: config.env().to_string(),
                    started_at: chrono::Utc::now(),
                    total: 1,
                    passed: usize::from(result.success),
                    failed: usize::from(!result.success),
                    duration_ms: result.duration_ms,
                    results: vec![result],
                }
            } else if let Some(tag) = tag {
                runner.run_tagged(&journeys, &tag).await
            } else {
                runner.run_all(&journeys).await
            };

            runner.write_results(&results)?;
            Ok(if results.is_success() {
                Verdict::Passed
            } else {
                Verdict::Failed
            })
        }
    }
}

async fn run_api(config: Arc<Config>, pet_name: &str) -> anyhow::Result<Verdict> {
    let cancel = CancellationToken::new();
    let client = PetStoreClient::new(config)
        .context("failed to build HTTP client")?
        .with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning verification");
            cancel.cancel();
        }
    });

    match client.pet_lifecycle(pet_name).await {
        Ok(report) => {
            println!(
                "✅ pet {} lifecycle verified (create after {} attempt(s), delete after {})",
                report.pet_id, report.create_attempts, report.delete_attempts
            );
            Ok(Verdict::Passed)
        }
        Err(e) if e.is_setup_error() => {
            Err(anyhow::Error::new(e).context("pet lifecycle could not start"))
        }
        Err(e) => {
            error!("Pet lifecycle failed: {}", e);
            println!("❌ pet lifecycle failed: {}", e);
            Ok(Verdict::Failed)
        }
    }
}

/// The snapshot as JSON with the API key shown only as a mask
fn masked(config: &Config) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(config)?;
    let mask = if config.api_key().is_empty() { "" } else { "****" };
    if let Some(api) = value.get_mut("api").and_then(|a| a.as_object_mut()) {
        api.insert("api_key".to_string(), serde_json::Value::from(mask));
    }
    Ok(value)
}
