pub mod config;
pub mod error;
pub mod familiarity;
pub mod matchmaker;
pub mod outcome;
pub mod pool;
pub mod rating;
pub mod resolver;
pub mod sampler;
pub mod simulation;
pub mod types;

use config::SimulationConfig;
use error::SimError;
use serde::Serialize;
use simulation::Simulation;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    web_sys::console::info_1(&JsValue::from_str("context rating simulation ready"));
}

fn to_js(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(SimError::from)
        .map_err(to_js)
}

#[cfg(target_arch = "wasm32")]
fn entropy_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn entropy_seed() -> u64 {
    rand::random()
}

/// WASM-exposed simulation wrapper.
///
/// Call order: `add_players` and `generate_practice_hours`, then per match
/// `start_match`, `simulate_outcome`, `compute_ratings`, `commit_ratings`.
/// Out-of-order calls reject with a message instead of running.
#[wasm_bindgen]
pub struct RatingSimEngine {
    sim: Simulation,
}

#[wasm_bindgen]
impl RatingSimEngine {
    /// Create a new simulation with default config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<RatingSimEngine, JsValue> {
        let sim = Simulation::new(SimulationConfig::default(), seed).map_err(to_js)?;
        Ok(RatingSimEngine { sim })
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<RatingSimEngine, JsValue> {
        let config = SimulationConfig::from_json(config_json).map_err(to_js)?;
        let sim = Simulation::new(config, seed).map_err(to_js)?;
        Ok(RatingSimEngine { sim })
    }

    /// Create with a seed drawn from the host's entropy
    pub fn from_entropy() -> Result<RatingSimEngine, JsValue> {
        Self::new(entropy_seed())
    }

    /// Add players; returns the whole pool as JSON
    pub fn add_players(&mut self, count: usize) -> Result<String, JsValue> {
        to_json(&self.sim.add_players(count))
    }

    /// Regenerate practice hours and familiarity; returns the pool as JSON
    pub fn generate_practice_hours(&mut self) -> Result<String, JsValue> {
        to_json(&self.sim.generate_practice_hours())
    }

    /// Select the next match. Resolves to `"null"` when fewer than ten
    /// players are available.
    pub fn start_match(&mut self) -> Result<String, JsValue> {
        let setup = self.sim.start_match().map_err(to_js)?;
        to_json(&setup)
    }

    pub fn simulate_outcome(&mut self) -> Result<String, JsValue> {
        let outcome = self.sim.simulate_outcome().map_err(to_js)?;
        to_json(&outcome)
    }

    pub fn compute_ratings(&mut self) -> Result<String, JsValue> {
        let report = self.sim.compute_ratings().map_err(to_js)?;
        to_json(&report)
    }

    /// Apply the computed ratings to the pool; returns the pool as JSON
    pub fn commit_ratings(&mut self) -> Result<String, JsValue> {
        let players = self.sim.commit_ratings().map_err(to_js)?;
        to_json(&players)
    }

    /// Run full match cycles; returns how many completed
    pub fn run_cycles(&mut self, cycles: usize) -> Result<usize, JsValue> {
        self.sim.run_cycles(cycles).map_err(to_js)
    }

    /// In-flight match (setup, outcome, ratings); absent parts are null
    pub fn get_current_match(&self) -> Result<String, JsValue> {
        to_json(&serde_json::json!({
            "setup": self.sim.current_setup(),
            "outcome": self.sim.current_outcome(),
            "ratings": self.sim.current_report(),
        }))
    }

    pub fn get_players(&self) -> Result<String, JsValue> {
        to_json(self.sim.pool.players())
    }

    /// Players by rating, highest first
    pub fn get_leaderboard(&self) -> Result<String, JsValue> {
        to_json(&self.sim.pool.leaderboard())
    }

    pub fn get_pool_size(&self) -> usize {
        self.sim.pool.len()
    }

    /// Current pipeline stage name
    pub fn get_stage(&self) -> String {
        format!("{:?}", self.sim.stage())
    }

    /// Get statistics JSON
    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.sim.stats).unwrap_or_default()
    }

    /// Get current simulation state as JSON
    pub fn get_state(&self) -> String {
        self.sim.get_state_json()
    }

    /// Reset statistics (keep population)
    pub fn reset_stats(&mut self) {
        self.sim.reset_stats();
    }

    /// Update simulation config
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = SimulationConfig::from_json(config_json).map_err(to_js)?;
        self.sim.update_config(config).map_err(to_js)
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&SimulationConfig::default()).unwrap_or_default()
    }
}
