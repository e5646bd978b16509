use crate::familiarity;
use crate::types::{round_to, GameMap, Player};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The growing collection of players and their ratings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerPool {
    players: Vec<Player>,
    /// Next sequential id; ids are never reused
    next_player_id: usize,
}

impl PlayerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Owned copy of every record, for stages that work on values
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Whether any player has practice hours (and so familiarity) set
    pub fn has_practice_data(&self) -> bool {
        self.players.iter().any(|p| p.practice_hours.is_some())
    }

    /// Append `count` players with fresh sequential ids and a uniform rating
    /// rounded to 3 decimals. Existing players are untouched.
    pub fn add_players(&mut self, count: usize, rng: &mut impl Rng) -> &[Player] {
        let start = self.players.len();
        self.players.reserve(count);
        for _ in 0..count {
            self.next_player_id += 1;
            let rating = round_to(rng.gen_range(0.0..=1.0), 3);
            self.players
                .push(Player::new(format!("P{}", self.next_player_id), rating));
        }
        &self.players[start..]
    }

    /// Resample every player's practice hours in `[0, max_hours]` per map,
    /// then recompute familiarity for the whole pool.
    pub fn generate_practice_hours(&mut self, max_hours: u32, rng: &mut impl Rng) {
        for player in &mut self.players {
            let hours: BTreeMap<GameMap, u32> = GameMap::ALL
                .iter()
                .map(|&map| (map, rng.gen_range(0..=max_hours)))
                .collect();
            player.practice_hours = Some(hours);
        }
        self.recompute_familiarity();
    }

    pub fn recompute_familiarity(&mut self) {
        self.players = familiarity::compute(&self.players);
    }

    /// Commit new canonical ratings by player id. Returns how many matched.
    pub fn commit_ratings<'a>(&mut self, updates: impl IntoIterator<Item = (&'a str, f64)>) -> usize {
        let mut applied = 0;
        for (id, rating) in updates {
            if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
                player.apply_rating(rating);
                applied += 1;
            }
        }
        applied
    }

    /// Players ordered by rating, highest first
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        ranked
    }
}
