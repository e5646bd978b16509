use crate::types::{round_to, GameMap, Player};
use std::collections::BTreeMap;

/// Mean practice hours per map over players that have hours.
///
/// A map whose mean would be zero (empty pool, or nobody practised) gets 1
/// so familiarity stays finite.
pub fn mean_hours(players: &[Player]) -> BTreeMap<GameMap, f64> {
    let with_hours: Vec<&BTreeMap<GameMap, u32>> = players
        .iter()
        .filter_map(|p| p.practice_hours.as_ref())
        .collect();

    GameMap::ALL
        .iter()
        .map(|&map| {
            let mean = if with_hours.is_empty() {
                1.0
            } else {
                let total: u32 = with_hours
                    .iter()
                    .map(|hours| hours.get(&map).copied().unwrap_or(0))
                    .sum();
                total as f64 / with_hours.len() as f64
            };
            (map, if mean > 0.0 { mean } else { 1.0 })
        })
        .collect()
}

/// Map with the highest familiarity; earlier maps win ties
pub fn best_map(familiarity: &BTreeMap<GameMap, f64>) -> Option<GameMap> {
    let mut best: Option<(GameMap, f64)> = None;
    for map in GameMap::ALL {
        let Some(&value) = familiarity.get(&map) else {
            continue;
        };
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((map, value)),
        }
    }
    best.map(|(map, _)| map)
}

/// Recompute every player's familiarity against the pool's current means.
///
/// Players without practice hours come back unchanged.
pub fn compute(players: &[Player]) -> Vec<Player> {
    let means = mean_hours(players);

    players
        .iter()
        .map(|player| {
            let mut player = player.clone();
            if let Some(hours) = &player.practice_hours {
                let familiarity: BTreeMap<GameMap, f64> = GameMap::ALL
                    .iter()
                    .map(|&map| {
                        let h = hours.get(&map).copied().unwrap_or(0) as f64;
                        (map, round_to(100.0 * h / means[&map], 2))
                    })
                    .collect();
                player.best_map = best_map(&familiarity);
                player.map_familiarity = Some(familiarity);
            }
            player
        })
        .collect()
}
