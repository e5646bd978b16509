use crate::error::SimError;
use crate::sampler::{PiecewiseUniform, UniformTier};
use serde::{Deserialize, Serialize};

/// Which computed rating becomes a player's canonical rating on commit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitPolicy {
    #[default]
    Traditional,
    ContextAware,
}

/// Tunable constants for generation, outcome sampling and rating
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step size of both rating updates
    pub k_factor: f64,
    /// Multiplier on the mean rating gap inside the expected-outcome exponent
    pub rating_sensitivity: f64,

    /// Context factor weights
    pub latency_weight: f64,
    pub map_weight: f64,
    pub inactivity_weight: f64,

    /// Upper bound (inclusive) of sampled practice hours per map
    pub max_practice_hours: u32,

    /// Connection quality mixture: good / moderate / poor
    pub network_tiers: Vec<UniformTier>,
    /// Inactive-player AFK share mixture: brief / moderate / severe
    pub inactivity_tiers: Vec<UniformTier>,

    /// Kill ceiling is floor(scale * performance), at least 1
    pub kill_ceiling_scale: f64,
    /// Performance below this is treated as severely impaired
    pub impaired_performance_threshold: f64,
    /// Chance an impaired player is held to 0-2 kills
    pub impaired_floor_probability: f64,

    pub commit_policy: CommitPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            k_factor: 0.1,
            rating_sensitivity: 10.0,
            latency_weight: 0.02,
            map_weight: 0.0002,
            inactivity_weight: 0.06,
            max_practice_hours: 30,
            network_tiers: vec![
                UniformTier::new(0.80, 0.80, 1.00),
                UniformTier::new(0.15, 0.50, 0.79),
                UniformTier::new(0.05, 0.10, 0.49),
            ],
            inactivity_tiers: vec![
                UniformTier::new(0.70, 0.10, 0.30),
                UniformTier::new(0.20, 0.30, 0.60),
                UniformTier::new(0.10, 0.60, 0.90),
            ],
            kill_ceiling_scale: 20.0,
            impaired_performance_threshold: 0.3,
            impaired_floor_probability: 0.95,
            commit_policy: CommitPolicy::Traditional,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "k_factor must be positive, got {}",
                self.k_factor
            )));
        }
        if !self.rating_sensitivity.is_finite() || self.rating_sensitivity <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "rating_sensitivity must be positive, got {}",
                self.rating_sensitivity
            )));
        }
        for (name, weight) in [
            ("latency_weight", self.latency_weight),
            ("map_weight", self.map_weight),
            ("inactivity_weight", self.inactivity_weight),
            ("kill_ceiling_scale", self.kill_ceiling_scale),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, weight
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.impaired_floor_probability) {
            return Err(SimError::InvalidConfig(format!(
                "impaired_floor_probability must be in [0, 1], got {}",
                self.impaired_floor_probability
            )));
        }
        PiecewiseUniform::validate(&self.network_tiers)?;
        PiecewiseUniform::validate(&self.inactivity_tiers)?;
        if self.network_tiers.iter().any(|t| t.low < 0.1 || t.high > 1.0) {
            return Err(SimError::InvalidConfig(
                "network tiers must lie inside [0.1, 1.0]".to_string(),
            ));
        }
        if self.inactivity_tiers.iter().any(|t| t.low <= 0.0 || t.high >= 1.0) {
            return Err(SimError::InvalidConfig(
                "inactivity tiers must lie strictly inside (0, 1)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn network_sampler(&self) -> Result<PiecewiseUniform, SimError> {
        PiecewiseUniform::new(self.network_tiers.clone())
    }

    pub fn inactivity_sampler(&self) -> Result<PiecewiseUniform, SimError> {
        PiecewiseUniform::new(self.inactivity_tiers.clone())
    }
}
