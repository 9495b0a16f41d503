//! Authoritative arena state - players, coins and buildings

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::config::ArenaConfig;
use crate::ws::protocol::{Building, Coin, LeaderboardEntry, PlayerRecord};

use super::combat::MAX_HEALTH;
use super::leaderboard;
use super::world::WorldGenerator;
use super::ConnId;

/// Display name used when a join carries none
pub const DEFAULT_NAME: &str = "Pilot";
const MAX_NAME_CHARS: usize = 24;

/// Where a player is in the death/respawn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Alive,
    /// Dead and waiting for the scheduled respawn
    Dying,
}

/// Player state in the arena (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnId,
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
    pub health: i32,
    pub score: u32,
    pub color: u32,
    pub life: LifeState,
    /// Monotonic join order, breaks leaderboard ties
    pub join_seq: u64,
}

impl Player {
    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    /// Project to the wire record
    pub fn record(&self) -> PlayerRecord {
        PlayerRecord {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            z: self.position.z,
            quaternion: self.orientation.into(),
            health: self.health,
            score: self.score,
            color: self.color,
        }
    }

    /// Full health, identity orientation, new position
    fn revive_at(&mut self, spawn: Vec3) {
        self.health = MAX_HEALTH;
        self.position = spawn;
        self.orientation = Quat::IDENTITY;
        self.life = LifeState::Alive;
    }
}

/// Trim and bound a client-supplied display name
pub fn sanitize_name(name: Option<&str>) -> String {
    let trimmed: String = name
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_CHARS)
        .collect();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed
    }
}

/// Owned state store; only the arena task touches it
pub struct ArenaState {
    players: HashMap<ConnId, Player>,
    coins: HashMap<String, Coin>,
    buildings: Vec<Building>,
    world: WorldGenerator,
    coin_count: usize,
    next_join_seq: u64,
    reset_pending: bool,
}

impl ArenaState {
    pub fn new(config: &ArenaConfig) -> Self {
        let mut world = WorldGenerator::new(config.seed);
        let buildings = world.buildings(config.building_count);
        let mut coins = HashMap::with_capacity(config.coin_count);
        world.coin_batch(&mut coins, config.coin_count);

        Self {
            players: HashMap::new(),
            coins,
            buildings,
            world,
            coin_count: config.coin_count,
            next_join_seq: 0,
            reset_pending: false,
        }
    }

    // ---- players ----

    /// Create a player at a random spawn point with full health and no score
    pub fn add_player(&mut self, id: ConnId, name: String) -> &Player {
        let spawn = self.world.spawn_point();
        let color = self.world.jet_color();
        let join_seq = self.next_join_seq;
        self.next_join_seq += 1;

        self.players.entry(id).or_insert(Player {
            id,
            name,
            position: spawn,
            orientation: Quat::IDENTITY,
            health: MAX_HEALTH,
            score: 0,
            color,
            life: LifeState::Alive,
            join_seq,
        })
    }

    pub fn contains_player(&self, id: &ConnId) -> bool {
        self.players.contains_key(id)
    }

    pub fn player(&self, id: &ConnId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &ConnId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn remove_player(&mut self, id: &ConnId) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Revive a player at a new spawn point; `None` if it no longer exists
    pub fn respawn(&mut self, id: &ConnId) -> Option<PlayerRecord> {
        let spawn = self.world.spawn_point();
        let player = self.players.get_mut(id)?;
        player.revive_at(spawn);
        Some(player.record())
    }

    /// Zero every score and revive everyone at new spawn points
    pub fn reset_players(&mut self) -> Vec<PlayerRecord> {
        let mut ids: Vec<(u64, ConnId)> = self
            .players
            .values()
            .map(|p| (p.join_seq, p.id))
            .collect();
        ids.sort_unstable();

        let mut records = Vec::with_capacity(ids.len());
        for (_, id) in ids {
            let spawn = self.world.spawn_point();
            if let Some(player) = self.players.get_mut(&id) {
                player.score = 0;
                player.revive_at(spawn);
                records.push(player.record());
            }
        }
        records
    }

    /// Wire view of every player keyed by id
    pub fn player_records(&self) -> HashMap<ConnId, PlayerRecord> {
        self.players
            .iter()
            .map(|(id, p)| (*id, p.record()))
            .collect()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::standings(self.players.values())
    }

    // ---- coins ----

    pub fn coins(&self) -> &HashMap<String, Coin> {
        &self.coins
    }

    pub fn coin_count(&self) -> usize {
        self.coins.len()
    }

    /// Remove a coin; `None` if it was already taken
    pub fn take_coin(&mut self, id: &str) -> Option<Coin> {
        self.coins.remove(id)
    }

    /// Spawn one replacement coin
    pub fn spawn_coin(&mut self) -> Coin {
        let coin = self.world.coin(&self.coins);
        self.coins.insert(coin.id.clone(), coin.clone());
        coin
    }

    /// Clear every coin and spawn a full batch
    pub fn reset_coins(&mut self) -> Vec<Coin> {
        self.coins.clear();
        self.world.coin_batch(&mut self.coins, self.coin_count)
    }

    // ---- world ----

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    // ---- round ----

    /// A win was announced and the reset has not run yet
    pub fn reset_pending(&self) -> bool {
        self.reset_pending
    }

    pub fn set_reset_pending(&mut self, pending: bool) {
        self.reset_pending = pending;
    }
}
