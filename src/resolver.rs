use crate::types::{round_to, MatchResult, PlayerPerformance, TeamPair, TeamSide};

/// Mean K/D of a team, rounded to 2 decimals; 0 for an empty team
pub fn mean_kill_death_ratio(team: &[PlayerPerformance]) -> f64 {
    if team.is_empty() {
        return 0.0;
    }
    let total: f64 = team.iter().map(|p| p.kill_death_ratio).sum();
    round_to(total / team.len() as f64, 2)
}

/// Decide the winner on rounded mean K/D.
///
/// Team A wins only with a strictly greater mean; equal means go to team B.
/// Means are compared after rounding, so raw means within 0.005 of each
/// other can round equal and the match goes to team B.
pub fn resolve(team_a: &[PlayerPerformance], team_b: &[PlayerPerformance]) -> MatchResult {
    let kd_a = mean_kill_death_ratio(team_a);
    let kd_b = mean_kill_death_ratio(team_b);

    let winner = if kd_a > kd_b { TeamSide::A } else { TeamSide::B };

    MatchResult {
        winner,
        mean_kd: TeamPair::new(kd_a, kd_b),
        tied: kd_a == kd_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kd: f64) -> PlayerPerformance {
        PlayerPerformance {
            player_id: "P".to_string(),
            rating: 0.5,
            network_quality: 1.0,
            inactivity_fraction: 0.0,
            performance: 1.0,
            kills: 0,
            deaths: 1,
            kill_death_ratio: kd,
            map_familiarity: 0.0,
        }
    }

    #[test]
    fn test_higher_mean_wins() {
        let team_a = vec![sample(2.0), sample(1.0)];
        let team_b = vec![sample(0.5), sample(1.0)];
        let result = resolve(&team_a, &team_b);
        assert_eq!(result.winner, TeamSide::A);
        assert_eq!(result.mean_kd.team_a, 1.5);
        assert_eq!(result.mean_kd.team_b, 0.75);
        assert!(!result.tied);

        let result = resolve(&team_b, &team_a);
        assert_eq!(result.winner, TeamSide::B);
    }

    #[test]
    fn test_equal_means_go_to_team_b() {
        let team_a = vec![sample(1.0), sample(3.0)];
        let team_b = vec![sample(2.0), sample(2.0)];
        let result = resolve(&team_a, &team_b);
        assert_eq!(result.winner, TeamSide::B);
        assert!(result.tied);
    }

    #[test]
    fn test_near_tie_within_rounding_goes_to_team_b() {
        let team_a = vec![sample(1.004), sample(1.004)];
        let team_b = vec![sample(1.0), sample(1.0)];
        let result = resolve(&team_a, &team_b);
        assert_eq!(result.winner, TeamSide::B);
        assert!(result.tied);
    }

    #[test]
    fn test_means_are_rounded() {
        let team = vec![sample(1.0), sample(1.0), sample(0.33)];
        assert_eq!(mean_kill_death_ratio(&team), 0.78);
        assert_eq!(mean_kill_death_ratio(&[]), 0.0);
    }
}
