use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::resolver;
use crate::sampler::PiecewiseUniform;
use crate::types::{round_to, GameMap, MatchOutcome, Player, PlayerPerformance, TeamPair};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// K/D ratio with deaths floored at 1, rounded to 2 decimals
pub fn kill_death_ratio(kills: u32, deaths: u32) -> f64 {
    round_to(kills as f64 / deaths.max(1) as f64, 2)
}

/// Performance factor in [0, 1]
pub fn performance_factor(network_quality: f64, inactivity_fraction: f64) -> f64 {
    (network_quality * (1.0 - inactivity_fraction)).clamp(0.0, 1.0)
}

/// Deaths by ordered precedence: heavy inactivity, then poor connection,
/// then the baseline range.
pub fn sample_deaths(inactivity_fraction: f64, network_quality: f64, rng: &mut impl Rng) -> u32 {
    if inactivity_fraction > 0.5 {
        rng.gen_range(10..=19)
    } else if network_quality < 0.5 {
        rng.gen_range(8..=19)
    } else {
        rng.gen_range(1..=15)
    }
}

/// Draws per-player samples for a match
pub struct MatchOutcomeSimulator {
    network: PiecewiseUniform,
    inactivity: PiecewiseUniform,
    kill_ceiling_scale: f64,
    impaired_threshold: f64,
    impaired_floor_probability: f64,
}

impl MatchOutcomeSimulator {
    pub fn new(config: &SimulationConfig) -> Result<Self, SimError> {
        Ok(Self {
            network: config.network_sampler()?,
            inactivity: config.inactivity_sampler()?,
            kill_ceiling_scale: config.kill_ceiling_scale,
            impaired_threshold: config.impaired_performance_threshold,
            impaired_floor_probability: config.impaired_floor_probability,
        })
    }

    /// Highest kill count reachable at this performance, at least 1
    pub fn kill_ceiling(&self, performance: f64) -> u32 {
        ((self.kill_ceiling_scale * performance).floor() as u32).max(1)
    }

    /// Impaired players are usually held to 0-2 kills but keep a small
    /// chance of the full range.
    pub fn sample_kills(&self, performance: f64, rng: &mut impl Rng) -> u32 {
        let ceiling = self.kill_ceiling(performance);
        if performance < self.impaired_threshold && rng.gen_bool(self.impaired_floor_probability) {
            rng.gen_range(0..=2)
        } else {
            rng.gen_range(1..=ceiling)
        }
    }

    /// Sample one team. Exactly one member, chosen uniformly, is the team's
    /// inactive player; everyone else has an inactivity fraction of 0.
    pub fn simulate_team(&self, team: &[Player], rng: &mut impl Rng) -> Vec<PlayerPerformance> {
        let network: Vec<f64> = team.iter().map(|_| self.network.sample(rng)).collect();

        let inactive_index = if team.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..team.len()))
        };

        team.iter()
            .zip(network)
            .enumerate()
            .map(|(i, (player, network_quality))| {
                let inactivity_fraction = if Some(i) == inactive_index {
                    self.inactivity.sample(rng)
                } else {
                    0.0
                };
                let performance = performance_factor(network_quality, inactivity_fraction);
                let kills = self.sample_kills(performance, rng);
                let deaths = sample_deaths(inactivity_fraction, network_quality, rng);

                PlayerPerformance {
                    player_id: player.id.clone(),
                    rating: player.rating,
                    network_quality,
                    inactivity_fraction,
                    performance,
                    kills,
                    deaths,
                    kill_death_ratio: kill_death_ratio(kills, deaths),
                    map_familiarity: 0.0,
                }
            })
            .collect()
    }

    /// Sample both teams, pick the map, read familiarity and decide the winner
    pub fn simulate(&self, teams: &TeamPair<Vec<Player>>, rng: &mut impl Rng) -> MatchOutcome {
        let mut team_a = self.simulate_team(&teams.team_a, rng);
        let mut team_b = self.simulate_team(&teams.team_b, rng);

        let selected_map = select_map(rng);
        attach_familiarity(&mut team_a, &teams.team_a, selected_map);
        attach_familiarity(&mut team_b, &teams.team_b, selected_map);

        let result = resolver::resolve(&team_a, &team_b);
        debug!(
            map = selected_map.name(),
            winner = ?result.winner,
            kd_a = result.mean_kd.team_a,
            kd_b = result.mean_kd.team_b,
            "simulated match outcome"
        );

        MatchOutcome {
            teams: TeamPair::new(team_a, team_b),
            selected_map,
            result,
        }
    }
}

/// Uniform choice among the known maps
pub fn select_map(rng: &mut impl Rng) -> GameMap {
    *GameMap::ALL.choose(rng).unwrap_or(&GameMap::ALL[0])
}

fn attach_familiarity(samples: &mut [PlayerPerformance], team: &[Player], map: GameMap) {
    for (sample, player) in samples.iter_mut().zip(team) {
        sample.map_familiarity = player.familiarity_on(map);
    }
}
