//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position or direction on the wire (`{x, y, z}`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Orientation on the wire (`{x, y, z, w}`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for WireQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl WireQuat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl From<Quat> for WireQuat {
    fn from(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl From<WireQuat> for Quat {
    fn from(q: WireQuat) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Enter the arena under a display name
    Join {
        #[serde(default)]
        name: Option<String>,
    },

    /// Own transform, sent every rendered frame
    Movement {
        x: f32,
        y: f32,
        z: f32,
        quaternion: WireQuat,
    },

    /// Cannon fired from the given muzzle transform
    Shoot {
        position: WireVec3,
        quaternion: WireQuat,
    },

    /// Homing missile launched
    FireMissile {
        position: WireVec3,
        quaternion: WireQuat,
    },

    /// Decoy flare released
    DeployFlare { position: WireVec3 },

    /// Own bullet struck another player
    BulletHit { target_id: Uuid },

    /// Own missile struck another player
    MissileHit { target_id: Uuid },

    /// Self-reported crash (ground, terrain, bounds or building)
    Crash,

    /// Flew through a coin
    CollectCoin { coin_id: String },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { id: Uuid, server_time: u64 },

    /// Full world state, sent to a connection once it joins
    WorldSnapshot {
        players: HashMap<Uuid, PlayerRecord>,
        buildings: Vec<Building>,
        coins: HashMap<String, Coin>,
    },

    /// Another pilot joined
    NewPlayer { player: PlayerRecord },

    /// Another pilot's reported transform
    PlayerMoved { player: PlayerRecord },

    PlayerShot {
        owner_id: Uuid,
        position: WireVec3,
        quaternion: WireQuat,
    },

    MissileFired {
        owner_id: Uuid,
        position: WireVec3,
        quaternion: WireQuat,
    },

    FlareDeployed { owner_id: Uuid, position: WireVec3 },

    UpdateHealth { id: Uuid, health: i32 },

    /// Private death notice for the owning connection
    YouDied,

    /// Public death notice
    PlayerDied { id: Uuid },

    Respawn { player: PlayerRecord },

    CoinRemoved { id: String },

    CoinAdded { coin: Coin },

    /// Someone reached the winning score
    GameOver { winner: String },

    /// Every player after a full round reset
    GameReset { players: Vec<PlayerRecord> },

    /// Replacement coin batch after a round reset
    CoinsReset { coins: Vec<Coin> },

    Leaderboard { entries: Vec<LeaderboardEntry> },

    PlayerDisconnected { id: Uuid },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Player state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub quaternion: WireQuat,
    /// Health (0-100)
    pub health: i32,
    pub score: u32,
    /// Cosmetic jet colour, 0xRRGGBB
    pub color: u32,
}

impl PlayerRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Static obstacle footprint; the box stands on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub x: f32,
    pub z: f32,
    /// Width along X
    pub w: f32,
    /// Height
    pub h: f32,
    /// Depth along Z
    pub d: f32,
}

/// Collectible coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Coin {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}
