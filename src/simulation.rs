use crate::config::{CommitPolicy, SimulationConfig};
use crate::error::SimError;
use crate::matchmaker;
use crate::outcome::MatchOutcomeSimulator;
use crate::pool::PlayerPool;
use crate::rating::RatingEngine;
use crate::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Main simulation state and controller.
///
/// Owns the pool, the single shared random source and the in-flight match.
/// Each entry point checks the pipeline stage before running, so calls made
/// out of order fail instead of reading fields an earlier stage never set.
pub struct Simulation {
    pub pool: PlayerPool,
    pub config: SimulationConfig,
    pub stats: SimulationStats,
    stage: PipelineStage,
    rng: StdRng,
    outcome_simulator: MatchOutcomeSimulator,
    rating_engine: RatingEngine,
    /// Current match cycle; cleared when a new cycle starts
    setup: Option<MatchSetup>,
    outcome: Option<MatchOutcome>,
    report: Option<RatingReport>,
    /// Whether `report` has been written back into the pool
    committed: bool,
}

impl Simulation {
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            pool: PlayerPool::new(),
            outcome_simulator: MatchOutcomeSimulator::new(&config)?,
            rating_engine: RatingEngine::new(&config),
            config,
            stats: SimulationStats::default(),
            stage: PipelineStage::Uninitialized,
            rng: StdRng::seed_from_u64(seed),
            setup: None,
            outcome: None,
            report: None,
            committed: false,
        })
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn current_setup(&self) -> Option<&MatchSetup> {
        self.setup.as_ref()
    }

    pub fn current_outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn current_report(&self) -> Option<&RatingReport> {
        self.report.as_ref()
    }

    fn require(&self, operation: &'static str, allowed: &[PipelineStage]) -> Result<(), SimError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            warn!(operation, stage = ?self.stage, "pipeline call out of order");
            Err(SimError::StageViolation {
                operation,
                stage: self.stage,
            })
        }
    }

    fn clear_match(&mut self) {
        self.setup = None;
        self.outcome = None;
        self.report = None;
        self.committed = false;
    }

    /// Add players to the pool. Allowed at any stage; newcomers carry no
    /// familiarity until hours are regenerated.
    pub fn add_players(&mut self, count: usize) -> Vec<Player> {
        self.pool.add_players(count, &mut self.rng);
        if self.stage >= PipelineStage::HoursGenerated && count > 0 {
            warn!(count, "players added after practice hours; their familiarity reads 0 until regenerated");
        }
        debug!(count, pool_size = self.pool.len(), "added players");
        self.pool.snapshot()
    }

    /// Regenerate practice hours and familiarity for the whole pool.
    /// Any in-flight match is discarded.
    pub fn generate_practice_hours(&mut self) -> Vec<Player> {
        self.pool
            .generate_practice_hours(self.config.max_practice_hours, &mut self.rng);
        self.clear_match();
        self.stage = PipelineStage::HoursGenerated;
        debug!(pool_size = self.pool.len(), "generated practice hours");
        self.pool.snapshot()
    }

    /// Select ten players and split them into two teams.
    ///
    /// Returns `Ok(None)` when the pool is too small; the stage is then left
    /// as it was.
    pub fn start_match(&mut self) -> Result<Option<MatchSetup>, SimError> {
        if self.stage == PipelineStage::Uninitialized || !self.pool.has_practice_data() {
            warn!("match requested before practice hours were generated");
            return Err(SimError::MissingFamiliarityData);
        }

        let players = self.pool.snapshot();
        let Some(setup) = matchmaker::start_match(&players, &mut self.rng) else {
            let err = SimError::InsufficientPool {
                available: players.len(),
                required: MATCH_SIZE,
            };
            warn!("{}", err);
            return Ok(None);
        };

        self.clear_match();
        debug!(
            spread = setup.rating_spread,
            mean_rating = setup.mean_rating,
            "selected match candidates"
        );
        self.setup = Some(setup.clone());
        self.stage = PipelineStage::MatchSelected;
        Ok(Some(setup))
    }

    pub fn simulate_outcome(&mut self) -> Result<MatchOutcome, SimError> {
        self.require("simulate outcome", &[PipelineStage::MatchSelected])?;
        let setup = self.setup.as_ref().ok_or(SimError::StageViolation {
            operation: "simulate outcome",
            stage: self.stage,
        })?;

        let outcome = self.outcome_simulator.simulate(&setup.teams, &mut self.rng);
        self.outcome = Some(outcome.clone());
        self.stage = PipelineStage::OutcomeSimulated;
        Ok(outcome)
    }

    /// Compute both rating updates. The pool is not touched until
    /// `commit_ratings`.
    pub fn compute_ratings(&mut self) -> Result<RatingReport, SimError> {
        self.require("compute ratings", &[PipelineStage::OutcomeSimulated])?;
        let outcome = self.outcome.as_ref().ok_or(SimError::StageViolation {
            operation: "compute ratings",
            stage: self.stage,
        })?;

        let report = self.rating_engine.compute(&outcome.teams, &outcome.result);
        self.report = Some(report.clone());
        self.committed = false;
        self.stage = PipelineStage::RatingComputed;
        Ok(report)
    }

    /// Write the ratings chosen by the commit policy back into the pool.
    /// A report can be committed once.
    pub fn commit_ratings(&mut self) -> Result<Vec<Player>, SimError> {
        self.require("commit ratings", &[PipelineStage::RatingComputed])?;
        if self.committed {
            return Err(SimError::StageViolation {
                operation: "commit ratings twice",
                stage: self.stage,
            });
        }
        let (Some(report), Some(outcome)) = (self.report.as_ref(), self.outcome.as_ref()) else {
            return Err(SimError::StageViolation {
                operation: "commit ratings",
                stage: self.stage,
            });
        };

        let updates: Vec<(&str, f64)> = match self.config.commit_policy {
            CommitPolicy::Traditional => report
                .traditional
                .team_a
                .iter()
                .chain(report.traditional.team_b.iter())
                .map(|r| (r.player_id.as_str(), r.new_rating))
                .collect(),
            CommitPolicy::ContextAware => report
                .context_aware
                .team_a
                .iter()
                .chain(report.context_aware.team_b.iter())
                .map(|r| (r.player_id.as_str(), r.new_rating))
                .collect(),
        };
        let applied = self.pool.commit_ratings(updates);

        self.stats.record(&outcome.result, report);
        self.committed = true;
        info!(
            applied,
            winner = ?outcome.result.winner,
            map = outcome.selected_map.name(),
            policy = ?self.config.commit_policy,
            "committed match ratings"
        );
        Ok(self.pool.snapshot())
    }

    /// Run full match cycles. Stops early when the pool is too small and
    /// returns the number of cycles completed.
    pub fn run_cycles(&mut self, cycles: usize) -> Result<usize, SimError> {
        for completed in 0..cycles {
            if self.start_match()?.is_none() {
                return Ok(completed);
            }
            self.simulate_outcome()?;
            self.compute_ratings()?;
            self.commit_ratings()?;
        }
        Ok(cycles)
    }

    /// Replace the config; samplers and rating weights are rebuilt
    pub fn update_config(&mut self, config: SimulationConfig) -> Result<(), SimError> {
        config.validate()?;
        self.outcome_simulator = MatchOutcomeSimulator::new(&config)?;
        self.rating_engine = RatingEngine::new(&config);
        self.config = config;
        Ok(())
    }

    pub fn reset_stats(&mut self) {
        self.stats = SimulationStats::default();
    }

    pub fn get_state_json(&self) -> String {
        serde_json::to_string(&SimulationState {
            stage: self.stage,
            total_players: self.pool.len(),
            stats: self.stats.clone(),
            config: self.config.clone(),
        })
        .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize)]
pub struct SimulationState {
    pub stage: PipelineStage,
    pub total_players: usize,
    pub stats: SimulationStats,
    pub config: SimulationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_simulation(players: usize) -> Simulation {
        let mut sim = Simulation::new(SimulationConfig::default(), 42).unwrap();
        sim.add_players(players);
        sim.generate_practice_hours();
        sim
    }

    #[test]
    fn test_match_before_hours_is_rejected() {
        let mut sim = Simulation::new(SimulationConfig::default(), 1).unwrap();
        sim.add_players(20);
        assert!(matches!(sim.start_match(), Err(SimError::MissingFamiliarityData)));
        assert_eq!(sim.stage(), PipelineStage::Uninitialized);
    }

    #[test]
    fn test_hours_on_empty_pool_do_not_count_as_familiarity() {
        let mut sim = Simulation::new(SimulationConfig::default(), 1).unwrap();
        sim.generate_practice_hours();
        assert_eq!(sim.stage(), PipelineStage::HoursGenerated);
        sim.add_players(10);
        assert!(matches!(sim.start_match(), Err(SimError::MissingFamiliarityData)));
        assert!(sim.current_setup().is_none());

        sim.generate_practice_hours();
        assert!(sim.start_match().unwrap().is_some());
    }

    #[test]
    fn test_undersized_pool_returns_none() {
        let mut sim = create_test_simulation(9);
        assert!(sim.start_match().unwrap().is_none());
        assert_eq!(sim.stage(), PipelineStage::HoursGenerated);
        assert_eq!(sim.run_cycles(3).unwrap(), 0);
    }

    #[test]
    fn test_out_of_order_calls_fail() {
        let mut sim = create_test_simulation(12);
        assert!(matches!(sim.simulate_outcome(), Err(SimError::StageViolation { .. })));
        assert!(matches!(sim.compute_ratings(), Err(SimError::StageViolation { .. })));

        sim.start_match().unwrap().unwrap();
        assert!(matches!(sim.compute_ratings(), Err(SimError::StageViolation { .. })));
        assert!(matches!(sim.commit_ratings(), Err(SimError::StageViolation { .. })));
    }

    #[test]
    fn test_full_cycle_updates_pool() {
        let mut sim = create_test_simulation(15);
        let setup = sim.start_match().unwrap().unwrap();
        assert_eq!(setup.teams.team_a.len(), TEAM_SIZE);
        assert_eq!(setup.teams.team_b.len(), TEAM_SIZE);
        assert_eq!(sim.stage(), PipelineStage::MatchSelected);

        let outcome = sim.simulate_outcome().unwrap();
        assert_eq!(sim.stage(), PipelineStage::OutcomeSimulated);

        let before = sim.pool.snapshot();
        let report = sim.compute_ratings().unwrap();
        assert_eq!(sim.stage(), PipelineStage::RatingComputed);
        // Computing does not commit
        for (a, b) in before.iter().zip(sim.pool.players().iter()) {
            assert_eq!(a.rating, b.rating);
        }

        sim.commit_ratings().unwrap();
        assert!(sim.current_outcome().is_some());
        assert_eq!(
            sim.current_report().map(|r| r.expected.team_a),
            Some(report.expected.team_a)
        );
        for rated in report.traditional.team_a.iter().chain(report.traditional.team_b.iter()) {
            let player = sim.pool.get(&rated.player_id).unwrap();
            assert_eq!(player.rating, rated.new_rating);
            assert_eq!(player.previous_rating, Some(rated.previous_rating));
            assert_eq!(player.rank_delta, rated.rank_delta);
        }
        assert_eq!(sim.stats.matches_played, 1);
        match outcome.result.winner {
            TeamSide::A => assert_eq!(sim.stats.team_a_wins, 1),
            TeamSide::B => assert_eq!(sim.stats.team_b_wins, 1),
        }

        // Second commit of the same report is refused
        assert!(sim.commit_ratings().is_err());
    }

    #[test]
    fn test_context_policy_commits_context_rating() {
        let config = SimulationConfig {
            commit_policy: CommitPolicy::ContextAware,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config, 7).unwrap();
        sim.add_players(10);
        sim.generate_practice_hours();
        sim.start_match().unwrap().unwrap();
        sim.simulate_outcome().unwrap();
        let report = sim.compute_ratings().unwrap();
        sim.commit_ratings().unwrap();
        for rated in report.context_aware.team_a.iter().chain(report.context_aware.team_b.iter()) {
            assert_eq!(sim.pool.get(&rated.player_id).unwrap().rating, rated.new_rating);
        }
    }

    #[test]
    fn test_run_cycles_keeps_ratings_in_range() {
        let mut sim = create_test_simulation(30);
        assert_eq!(sim.run_cycles(100).unwrap(), 100);
        assert_eq!(sim.stats.matches_played, 100);
        assert_eq!(sim.stats.team_a_wins + sim.stats.team_b_wins, 100);
        assert_eq!(sim.stats.rated_samples, 100 * MATCH_SIZE);
        for player in sim.pool.players() {
            assert!((0.0..=1.0).contains(&player.rating));
        }
        assert!(sim.stats.avg_latency_factor <= 0.0);
        assert!(sim.stats.avg_inactivity_factor < 0.0);
        assert!(sim.stats.avg_map_factor >= 0.0);
    }

    #[test]
    fn test_regenerating_hours_discards_match() {
        let mut sim = create_test_simulation(10);
        sim.start_match().unwrap().unwrap();
        sim.generate_practice_hours();
        assert_eq!(sim.stage(), PipelineStage::HoursGenerated);
        assert!(sim.current_setup().is_none());
        assert!(sim.simulate_outcome().is_err());
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let mut a = create_test_simulation(20);
        let mut b = create_test_simulation(20);
        a.run_cycles(5).unwrap();
        b.run_cycles(5).unwrap();
        for (x, y) in a.pool.players().iter().zip(b.pool.players().iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.rating, y.rating);
        }
    }

    #[test]
    fn test_update_config_rejects_invalid() {
        let mut sim = create_test_simulation(10);
        let config = SimulationConfig {
            k_factor: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(sim.update_config(config), Err(SimError::InvalidConfig(_))));
        assert_eq!(sim.config.k_factor, 0.1);
    }
}
