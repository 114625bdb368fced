//! shopcheck end-to-end checks
//!
//! This crate drives the two systems under test:
//! - the storefront, through page objects that emit browser steps run by
//!   Playwright
//! - the pet-store REST API, through a `reqwest` client whose reads after a
//!   write are verified with the eventual-consistency poller
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    shopcheck (Rust binary)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (shopcheck-common)                                  │
//! │    ├── defaults < data/*.json < environment                 │
//! │    └── ui_url(endpoint), api_url(endpoint, params)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pages::*Page -> Vec<UiStep> -> Journey                     │
//! │  JourneyRunner<D: BrowserDriver>                            │
//! │    ├── run_all / run_tagged / run_named                     │
//! │    └── PlaywrightHandle: Journey -> node script -> report   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PetStoreClient                                             │
//! │    ├── create_pet / get_pet / update_pet / delete_pet       │
//! │    └── verify_created / verify_deleted -> poll_until        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod pages;
pub mod petstore;
pub mod playwright;
pub mod runner;
pub mod steps;

pub use error::{E2eError, E2eResult};
pub use petstore::{LifecycleReport, Lookup, Order, Pet, PetStoreClient};
pub use playwright::{BrowserDriver, PlaywrightConfig, PlaywrightHandle};
pub use runner::{JourneyResult, JourneyRunner, RunnerConfig, SuiteResult};
pub use steps::{Journey, UiStep};
