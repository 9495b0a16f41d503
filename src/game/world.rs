//! World generation - buildings, coins, spawn points

use std::collections::HashMap;

use glam::Vec3;
use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ws::protocol::{Building, Coin};

/// Buildings are scattered over this square around the origin
const BUILDING_HALF_SPREAD: f32 = 500.0;
/// Players spawn over this square around the origin
const SPAWN_HALF_SPREAD: f32 = 250.0;
/// Fixed spawn altitude, well above any terrain
pub const SPAWN_ALTITUDE: f32 = 200.0;
/// Coins are scattered over this square around the origin
const COIN_HALF_SPREAD: f32 = 900.0;
/// Coins float in this altitude band so they sit above the hills
const COIN_MIN_ALTITUDE: f32 = 40.0;
const COIN_MAX_ALTITUDE: f32 = 340.0;
const COIN_ID_LEN: usize = 10;

/// Seeded source of every random placement in the arena
pub struct WorldGenerator {
    rng: ChaCha8Rng,
}

impl WorldGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate the static building set (done once per process)
    pub fn buildings(&mut self, count: usize) -> Vec<Building> {
        (0..count)
            .map(|_| Building {
                x: self.rng.gen_range(-BUILDING_HALF_SPREAD..BUILDING_HALF_SPREAD),
                z: self.rng.gen_range(-BUILDING_HALF_SPREAD..BUILDING_HALF_SPREAD),
                w: self.rng.gen_range(30.0..80.0),
                h: self.rng.gen_range(50.0..200.0),
                d: self.rng.gen_range(30.0..80.0),
            })
            .collect()
    }

    /// Random spawn point at fixed altitude
    pub fn spawn_point(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-SPAWN_HALF_SPREAD..SPAWN_HALF_SPREAD),
            SPAWN_ALTITUDE,
            self.rng.gen_range(-SPAWN_HALF_SPREAD..SPAWN_HALF_SPREAD),
        )
    }

    /// Random cosmetic jet colour (0xRRGGBB)
    pub fn jet_color(&mut self) -> u32 {
        self.rng.gen_range(0..=0xFF_FFFF)
    }

    /// Create a coin whose id does not collide with any live coin
    pub fn coin(&mut self, live: &HashMap<String, Coin>) -> Coin {
        let id = loop {
            let candidate: String = (&mut self.rng)
                .sample_iter(&Alphanumeric)
                .take(COIN_ID_LEN)
                .map(char::from)
                .collect();
            if !live.contains_key(&candidate) {
                break candidate;
            }
        };

        Coin {
            id,
            x: self.rng.gen_range(-COIN_HALF_SPREAD..COIN_HALF_SPREAD),
            y: self.rng.gen_range(COIN_MIN_ALTITUDE..=COIN_MAX_ALTITUDE),
            z: self.rng.gen_range(-COIN_HALF_SPREAD..COIN_HALF_SPREAD),
        }
    }

    /// Fill `live` with a fresh batch of coins, returning the new ones
    pub fn coin_batch(&mut self, live: &mut HashMap<String, Coin>, count: usize) -> Vec<Coin> {
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let coin = self.coin(live);
            live.insert(coin.id.clone(), coin.clone());
            batch.push(coin);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_buildings() {
        let a = WorldGenerator::new(7).buildings(50);
        let b = WorldGenerator::new(7).buildings(50);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
    }

    #[test]
    fn buildings_respect_size_ranges() {
        for b in WorldGenerator::new(1).buildings(200) {
            assert!(b.x.abs() <= BUILDING_HALF_SPREAD && b.z.abs() <= BUILDING_HALF_SPREAD);
            assert!((30.0..80.0).contains(&b.w));
            assert!((30.0..80.0).contains(&b.d));
            assert!((50.0..200.0).contains(&b.h));
        }
    }

    #[test]
    fn spawn_is_at_fixed_altitude() {
        let mut gen = WorldGenerator::new(3);
        for _ in 0..100 {
            let p = gen.spawn_point();
            assert_eq!(p.y, SPAWN_ALTITUDE);
            assert!(p.x.abs() <= SPAWN_HALF_SPREAD && p.z.abs() <= SPAWN_HALF_SPREAD);
        }
    }

    #[test]
    fn coin_batch_has_unique_ids() {
        let mut gen = WorldGenerator::new(11);
        let mut live = HashMap::new();
        let batch = gen.coin_batch(&mut live, 64);
        assert_eq!(batch.len(), 64);
        assert_eq!(live.len(), 64);
        for coin in &batch {
            assert_eq!(coin.id.len(), COIN_ID_LEN);
            assert!((COIN_MIN_ALTITUDE..=COIN_MAX_ALTITUDE).contains(&coin.y));
        }
    }
}
