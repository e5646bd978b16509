use crate::error::SimError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One band of a piecewise-uniform distribution: with probability `weight`,
/// draw uniformly from `[low, high]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformTier {
    pub weight: f64,
    pub low: f64,
    pub high: f64,
}

impl UniformTier {
    pub const fn new(weight: f64, low: f64, high: f64) -> Self {
        Self { weight, low, high }
    }
}

/// Mixture of uniform bands, chosen by cumulative weight in listed order
#[derive(Clone, Debug, PartialEq)]
pub struct PiecewiseUniform {
    tiers: Vec<UniformTier>,
}

impl PiecewiseUniform {
    /// Validate and build a sampler. Weights must be non-negative and sum to 1.
    pub fn new(tiers: Vec<UniformTier>) -> Result<Self, SimError> {
        Self::validate(&tiers)?;
        Ok(Self { tiers })
    }

    pub fn validate(tiers: &[UniformTier]) -> Result<(), SimError> {
        if tiers.is_empty() {
            return Err(SimError::InvalidConfig("sampler needs at least one tier".to_string()));
        }
        for tier in tiers {
            if !tier.weight.is_finite() || tier.weight < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "tier weight must be a non-negative number, got {}",
                    tier.weight
                )));
            }
            if !(tier.low <= tier.high) {
                return Err(SimError::InvalidConfig(format!(
                    "tier range [{}, {}] is empty",
                    tier.low, tier.high
                )));
            }
        }
        let total: f64 = tiers.iter().map(|t| t.weight).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(SimError::InvalidConfig(format!(
                "tier weights must sum to 1, got {}",
                total
            )));
        }
        Ok(())
    }

    /// Tier selected by a unit draw `r` in [0, 1)
    fn tier_for(&self, r: f64) -> &UniformTier {
        let mut cumulative = 0.0;
        for tier in &self.tiers {
            cumulative += tier.weight;
            if r < cumulative {
                return tier;
            }
        }
        // Rounding can leave the cumulative sum just below 1
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        let r: f64 = rng.gen();
        let tier = self.tier_for(r);
        if tier.low == tier.high {
            tier.low
        } else {
            rng.gen_range(tier.low..=tier.high)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network_like() -> PiecewiseUniform {
        PiecewiseUniform::new(vec![
            UniformTier::new(0.80, 0.80, 1.00),
            UniformTier::new(0.15, 0.50, 0.79),
            UniformTier::new(0.05, 0.10, 0.49),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_weights() {
        let result = PiecewiseUniform::new(vec![
            UniformTier::new(0.5, 0.0, 1.0),
            UniformTier::new(0.4, 0.0, 1.0),
        ]);
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));

        let result = PiecewiseUniform::new(vec![UniformTier::new(-0.5, 0.0, 1.0), UniformTier::new(1.5, 0.0, 1.0)]);
        assert!(result.is_err());

        assert!(PiecewiseUniform::new(Vec::new()).is_err());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let result = PiecewiseUniform::new(vec![UniformTier::new(1.0, 0.9, 0.1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tier_selection_boundaries() {
        let sampler = network_like();
        assert_eq!(sampler.tier_for(0.0).low, 0.80);
        assert_eq!(sampler.tier_for(0.7999).low, 0.80);
        assert_eq!(sampler.tier_for(0.80).low, 0.50);
        assert_eq!(sampler.tier_for(0.9499).low, 0.50);
        assert_eq!(sampler.tier_for(0.951).low, 0.10);
        assert_eq!(sampler.tier_for(0.999_999_9).low, 0.10);
    }

    #[test]
    fn test_samples_stay_in_support_and_follow_weights() {
        let sampler = network_like();
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 20_000;
        let mut good = 0;
        for _ in 0..draws {
            let value = sampler.sample(&mut rng);
            assert!((0.10..=1.00).contains(&value));
            if value >= 0.80 {
                good += 1;
            }
        }
        let share = good as f64 / draws as f64;
        assert!((share - 0.80).abs() < 0.02, "good share was {}", share);
    }

    #[test]
    fn test_degenerate_tier_returns_point() {
        let sampler = PiecewiseUniform::new(vec![UniformTier::new(1.0, 0.25, 0.25)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sampler.sample(&mut rng), 0.25);
    }
}
