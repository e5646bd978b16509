use crate::types::{MatchSetup, Player, TeamPair, MATCH_SIZE, TEAM_SIZE};
use rand::seq::SliceRandom;
use rand::Rng;

/// Start index and spread of the tightest `size`-wide window over ratings
/// sorted ascending. The first window wins ties.
pub fn min_spread_window(sorted_ratings: &[f64], size: usize) -> Option<(usize, f64)> {
    if size == 0 || sorted_ratings.len() < size {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (start, window) in sorted_ratings.windows(size).enumerate() {
        let spread = window[size - 1] - window[0];
        match best {
            Some((_, best_spread)) if spread >= best_spread => {}
            _ => best = Some((start, spread)),
        }
    }
    best
}

/// Pick the ten most rating-homogeneous players.
///
/// Players are sorted by rating (stable, so equal ratings keep pool order)
/// and a ten-wide window slides over the result. The minimal-spread group of
/// a fixed size is always contiguous in sorted order, so the scan is exact.
/// Returns `None` when the pool holds fewer than ten players.
pub fn select_candidates(players: &[Player]) -> Option<Vec<Player>> {
    if players.len() < MATCH_SIZE {
        return None;
    }

    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| a.rating.total_cmp(&b.rating));

    let ratings: Vec<f64> = sorted.iter().map(|p| p.rating).collect();
    let (start, _) = min_spread_window(&ratings, MATCH_SIZE)?;

    Some(
        sorted[start..start + MATCH_SIZE]
            .iter()
            .map(|&p| p.clone())
            .collect(),
    )
}

/// Shuffle the selected players and split them into two teams of five.
/// Team strength is not balanced beyond the homogeneity of the selection.
pub fn split_teams(mut selected: Vec<Player>, rng: &mut impl Rng) -> TeamPair<Vec<Player>> {
    selected.shuffle(rng);
    let team_b = selected.split_off(selected.len().min(TEAM_SIZE));
    TeamPair::new(selected, team_b)
}

/// Run selection and team split in one step
pub fn start_match(players: &[Player], rng: &mut impl Rng) -> Option<MatchSetup> {
    let selected = select_candidates(players)?;

    let (min, max) = selected
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.rating), hi.max(p.rating)));
    let mean_rating = selected.iter().map(|p| p.rating).sum::<f64>() / selected.len() as f64;

    Some(MatchSetup {
        teams: split_teams(selected, rng),
        rating_spread: max - min,
        mean_rating,
    })
}
