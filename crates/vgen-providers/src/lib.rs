//! Provider adapters and the generation orchestrator.
//!
//! Adapters translate a generic generation request into one provider's
//! wire protocol (create task, poll status, extract the media URL).
//! The orchestrator picks an ordered candidate list and tries adapters
//! strictly sequentially until one succeeds.

pub mod adapter;
pub mod direct;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod orchestrator;
pub mod rehost;
pub mod sanitize;

pub use adapter::{AdapterRequest, PollConfig, TaskStatus, VideoAdapter};
pub use direct::{LumaAdapter, RunwayAdapter};
pub use error::{ProviderError, ProviderResult};
pub use gateway::GatewayAdapter;
pub use orchestrator::{Orchestrator, ProviderRecommendation, ProviderRecommender};
pub use sanitize::I2vIntent;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use vgen_models::ProviderKey;

/// Build adapters for every provider whose credentials are present.
///
/// Missing credentials drop the provider from the roster rather than
/// failing startup; the orchestrator falls back across whatever is
/// registered.
pub fn adapters_from_env() -> HashMap<ProviderKey, Arc<dyn VideoAdapter>> {
    let mut adapters: HashMap<ProviderKey, Arc<dyn VideoAdapter>> = HashMap::new();

    match RunwayAdapter::from_env() {
        Ok(adapter) => {
            adapters.insert(ProviderKey::Runway, Arc::new(adapter));
        }
        Err(e) => info!("Runway disabled: {}", e),
    }
    match LumaAdapter::from_env() {
        Ok(adapter) => {
            adapters.insert(ProviderKey::Luma, Arc::new(adapter));
        }
        Err(e) => info!("Luma disabled: {}", e),
    }
    for key in [ProviderKey::Kling, ProviderKey::Hailuo, ProviderKey::Seedance] {
        match GatewayAdapter::from_env(key) {
            Ok(adapter) => {
                adapters.insert(key, Arc::new(adapter));
            }
            Err(e) => info!("{} disabled: {}", key, e),
        }
    }

    adapters
}
