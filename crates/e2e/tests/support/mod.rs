#![allow(dead_code)]

pub mod mock_store;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use shopcheck_common::Config;

pub use mock_store::MockStore;

/// The shipped fixtures with the API pointed at `api_base_url` and a
/// fast poll policy
pub fn config_for(api_base_url: &str, max_attempts: u32, delay_ms: u64) -> Arc<Config> {
    let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data");
    let env = HashMap::from([
        ("API_BASE_URL", api_base_url.to_string()),
        ("API_KEY", "special-key".to_string()),
        ("POLL_MAX_ATTEMPTS", max_attempts.to_string()),
        ("POLL_DELAY_MS", delay_ms.to_string()),
    ]);
    Arc::new(Config::load_from(&data, &env).expect("shipped fixtures load"))
}
