use crate::config::SimulationConfig;
use crate::types::{
    clamp01, ContextFactors, ContextRating, MatchResult, PlayerPerformance, RankDelta,
    RatingReport, TeamPair, TeamSide, TraditionalRating,
};

/// Expected score of team A against team B from their mean ratings
pub fn expected_outcome(mean_rating_a: f64, mean_rating_b: f64, sensitivity: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((mean_rating_b - mean_rating_a) * sensitivity))
}

pub fn mean_rating(team: &[PlayerPerformance]) -> f64 {
    if team.is_empty() {
        return 0.0;
    }
    team.iter().map(|p| p.rating).sum::<f64>() / team.len() as f64
}

/// Computes both rating updates for a resolved match.
///
/// Both systems start from the same pre-match rating and share one expected
/// outcome per team; the context-aware rating is never derived from the
/// traditional one.
#[derive(Clone, Debug)]
pub struct RatingEngine {
    k_factor: f64,
    sensitivity: f64,
    latency_weight: f64,
    map_weight: f64,
    inactivity_weight: f64,
}

impl RatingEngine {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            k_factor: config.k_factor,
            sensitivity: config.rating_sensitivity,
            latency_weight: config.latency_weight,
            map_weight: config.map_weight,
            inactivity_weight: config.inactivity_weight,
        }
    }

    /// Win/loss term shared by both systems
    pub fn base_delta(&self, actual: f64, expected: f64) -> f64 {
        self.k_factor * (actual - expected)
    }

    pub fn traditional(&self, rating: f64, actual: f64, expected: f64) -> f64 {
        clamp01(rating + self.base_delta(actual, expected))
    }

    /// Latency penalty, familiarity reward and inactivity penalty
    pub fn context_factors(
        &self,
        network_quality: f64,
        map_familiarity: f64,
        inactivity_fraction: f64,
    ) -> ContextFactors {
        let latency = (network_quality - 1.0) * self.latency_weight;
        let map = map_familiarity * self.map_weight;
        let inactivity = -(inactivity_fraction * self.inactivity_weight);
        ContextFactors {
            latency,
            map,
            inactivity,
            total: latency + map + inactivity,
        }
    }

    pub fn context_aware(&self, rating: f64, actual: f64, expected: f64, factors: &ContextFactors) -> f64 {
        clamp01(rating + self.base_delta(actual, expected) + factors.total)
    }

    fn rate_team(
        &self,
        team: &[PlayerPerformance],
        actual: f64,
        expected: f64,
    ) -> (Vec<TraditionalRating>, Vec<ContextRating>) {
        team.iter()
            .map(|p| {
                let traditional = self.traditional(p.rating, actual, expected);
                let factors =
                    self.context_factors(p.network_quality, p.map_familiarity, p.inactivity_fraction);
                let context = self.context_aware(p.rating, actual, expected, &factors);
                (
                    TraditionalRating {
                        player_id: p.player_id.clone(),
                        previous_rating: p.rating,
                        new_rating: traditional,
                        rank_delta: RankDelta::between(p.rating, traditional),
                    },
                    ContextRating {
                        player_id: p.player_id.clone(),
                        previous_rating: p.rating,
                        new_rating: context,
                        rank_delta: RankDelta::between(p.rating, context),
                        factors,
                    },
                )
            })
            .unzip()
    }

    /// Rate every player of both teams against the resolved result
    pub fn compute(&self, teams: &TeamPair<Vec<PlayerPerformance>>, result: &MatchResult) -> RatingReport {
        let expected_a = expected_outcome(
            mean_rating(&teams.team_a),
            mean_rating(&teams.team_b),
            self.sensitivity,
        );
        let expected = TeamPair::new(expected_a, 1.0 - expected_a);

        let actual = |side: TeamSide| if result.winner == side { 1.0 } else { 0.0 };

        let (trad_a, ctx_a) = self.rate_team(&teams.team_a, actual(TeamSide::A), expected.team_a);
        let (trad_b, ctx_b) = self.rate_team(&teams.team_b, actual(TeamSide::B), expected.team_b);

        RatingReport {
            expected,
            traditional: TeamPair::new(trad_a, trad_b),
            context_aware: TeamPair::new(ctx_a, ctx_b),
        }
    }
}
