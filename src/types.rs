use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Players per team
pub const TEAM_SIZE: usize = 5;

/// Players drawn from the pool for one match (two teams)
pub const MATCH_SIZE: usize = 2 * TEAM_SIZE;

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Clamp a rating into [0, 1]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Maps a match can be played on.
///
/// Declaration order is the tie-break precedence for a player's best map,
/// and `Ord` follows it, so `BTreeMap<GameMap, _>` iterates in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameMap {
    Dust2,
    Mirage,
    Inferno,
}

impl GameMap {
    pub const ALL: [GameMap; 3] = [GameMap::Dust2, GameMap::Mirage, GameMap::Inferno];

    pub fn name(&self) -> &'static str {
        match self {
            GameMap::Dust2 => "Dust2",
            GameMap::Mirage => "Mirage",
            GameMap::Inferno => "Inferno",
        }
    }
}

/// Direction of the most recent rating change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDelta {
    Increased,
    Decreased,
    #[default]
    Unchanged,
}

impl RankDelta {
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            RankDelta::Increased
        } else if current < previous {
            RankDelta::Decreased
        } else {
            RankDelta::Unchanged
        }
    }
}

/// A pooled player record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Sequential identifier, never reused within a pool
    pub id: String,
    /// Canonical skill estimate in [0, 1]
    pub rating: f64,
    /// Rating immediately before the last committed update
    pub previous_rating: Option<f64>,
    pub rank_delta: RankDelta,
    /// Map with the highest familiarity, once familiarity has been computed
    pub best_map: Option<GameMap>,
    pub practice_hours: Option<BTreeMap<GameMap, u32>>,
    /// Practice hours relative to the pool mean, as a percentage
    pub map_familiarity: Option<BTreeMap<GameMap, f64>>,
}

impl Player {
    pub fn new(id: String, rating: f64) -> Self {
        Self {
            id,
            rating: clamp01(rating),
            previous_rating: None,
            rank_delta: RankDelta::Unchanged,
            best_map: None,
            practice_hours: None,
            map_familiarity: None,
        }
    }

    /// Familiarity on `map`, or 0 when it has never been computed
    pub fn familiarity_on(&self, map: GameMap) -> f64 {
        self.map_familiarity
            .as_ref()
            .and_then(|table| table.get(&map).copied())
            .unwrap_or(0.0)
    }

    /// Snapshot the current rating and move to `new_rating`
    pub fn apply_rating(&mut self, new_rating: f64) {
        let previous = self.rating;
        self.previous_rating = Some(previous);
        self.rating = clamp01(new_rating);
        self.rank_delta = RankDelta::between(previous, self.rating);
    }
}

/// Which side of a match a team is on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    A,
    B,
}

/// One value per team
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamPair<T> {
    pub team_a: T,
    pub team_b: T,
}

impl<T> TeamPair<T> {
    pub fn new(team_a: T, team_b: T) -> Self {
        Self { team_a, team_b }
    }

    pub fn get(&self, side: TeamSide) -> &T {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }
}

/// Two teams selected by the matchmaker, as snapshots of pool records
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSetup {
    pub teams: TeamPair<Vec<Player>>,
    /// Rating spread (max - min) of the selected ten players
    pub rating_spread: f64,
    /// Mean rating of the selected ten players
    pub mean_rating: f64,
}

/// Per-player samples for a single match
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerPerformance {
    pub player_id: String,
    /// Pre-match rating
    pub rating: f64,
    /// Connection quality in [0.1, 1.0]
    pub network_quality: f64,
    /// Share of the match the player was unresponsive, in [0, 1)
    pub inactivity_fraction: f64,
    /// network_quality * (1 - inactivity_fraction)
    pub performance: f64,
    pub kills: u32,
    pub deaths: u32,
    pub kill_death_ratio: f64,
    pub map_familiarity: f64,
}

/// Win/loss decision for a match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: TeamSide,
    pub mean_kd: TeamPair<f64>,
    /// Means were equal and the decision fell to team B
    pub tied: bool,
}

/// Samples and decision for a simulated match
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub teams: TeamPair<Vec<PlayerPerformance>>,
    pub selected_map: GameMap,
    pub result: MatchResult,
}

/// Additive corrections of the context-aware update
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextFactors {
    pub latency: f64,
    pub map: f64,
    pub inactivity: f64,
    pub total: f64,
}

/// Traditional update for one player
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraditionalRating {
    pub player_id: String,
    pub previous_rating: f64,
    pub new_rating: f64,
    pub rank_delta: RankDelta,
}

/// Context-aware update for one player
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextRating {
    pub player_id: String,
    pub previous_rating: f64,
    pub new_rating: f64,
    pub rank_delta: RankDelta,
    pub factors: ContextFactors,
}

/// Both rating systems applied to one match
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RatingReport {
    /// Expected score of each team from pre-match mean ratings
    pub expected: TeamPair<f64>,
    pub traditional: TeamPair<Vec<TraditionalRating>>,
    pub context_aware: TeamPair<Vec<ContextRating>>,
}

/// Where the match pipeline currently stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    Uninitialized,
    HoursGenerated,
    MatchSelected,
    OutcomeSimulated,
    RatingComputed,
}

/// Running statistics across committed matches in this session
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub matches_played: usize,
    pub team_a_wins: usize,
    pub team_b_wins: usize,
    /// Matches decided for team B because mean K/D was equal
    pub tied_decisions: usize,
    pub avg_traditional_delta: f64,
    pub avg_context_delta: f64,
    /// Mean |context - traditional| over all rated players
    pub avg_system_divergence: f64,
    pub avg_latency_factor: f64,
    pub avg_map_factor: f64,
    pub avg_inactivity_factor: f64,
    /// Number of per-player samples behind the averages
    pub rated_samples: usize,
}

impl SimulationStats {
    /// Fold one match's rating report into the running averages
    pub fn record(&mut self, result: &MatchResult, report: &RatingReport) {
        self.matches_played += 1;
        match result.winner {
            TeamSide::A => self.team_a_wins += 1,
            TeamSide::B => self.team_b_wins += 1,
        }
        if result.tied {
            self.tied_decisions += 1;
        }

        for side in [TeamSide::A, TeamSide::B] {
            let traditional = report.traditional.get(side);
            let context = report.context_aware.get(side);
            for (trad, ctx) in traditional.iter().zip(context.iter()) {
                let n = self.rated_samples as f64;
                let update = |avg: f64, sample: f64| (avg * n + sample) / (n + 1.0);

                self.avg_traditional_delta =
                    update(self.avg_traditional_delta, (trad.new_rating - trad.previous_rating).abs());
                self.avg_context_delta =
                    update(self.avg_context_delta, (ctx.new_rating - ctx.previous_rating).abs());
                self.avg_system_divergence =
                    update(self.avg_system_divergence, (ctx.new_rating - trad.new_rating).abs());
                self.avg_latency_factor = update(self.avg_latency_factor, ctx.factors.latency);
                self.avg_map_factor = update(self.avg_map_factor, ctx.factors.map);
                self.avg_inactivity_factor =
                    update(self.avg_inactivity_factor, ctx.factors.inactivity);
                self.rated_samples += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.12345, 2), 0.12);
        assert_eq!(round_to(0.4567, 3), 0.457);
        assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
    }

    #[test]
    fn test_apply_rating_snapshots_and_clamps() {
        let mut player = Player::new("P1".to_string(), 0.98);
        player.apply_rating(1.2);
        assert_eq!(player.previous_rating, Some(0.98));
        assert_eq!(player.rating, 1.0);
        assert_eq!(player.rank_delta, RankDelta::Increased);

        player.apply_rating(1.0);
        assert_eq!(player.rank_delta, RankDelta::Unchanged);

        player.apply_rating(-0.5);
        assert_eq!(player.rating, 0.0);
        assert_eq!(player.rank_delta, RankDelta::Decreased);
    }

    #[test]
    fn test_familiarity_defaults_to_zero() {
        let mut player = Player::new("P1".to_string(), 0.5);
        assert_eq!(player.familiarity_on(GameMap::Mirage), 0.0);

        let mut table = BTreeMap::new();
        table.insert(GameMap::Mirage, 42.5);
        player.map_familiarity = Some(table);
        assert_eq!(player.familiarity_on(GameMap::Mirage), 42.5);
        assert_eq!(player.familiarity_on(GameMap::Inferno), 0.0);
    }

    #[test]
    fn test_game_map_order_matches_precedence() {
        let mut sorted = GameMap::ALL.to_vec();
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, GameMap::ALL.to_vec());
    }
}
