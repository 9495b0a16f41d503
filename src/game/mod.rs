//! Authoritative arena: state store, event relay and timed transitions

pub mod arena;
pub mod combat;
pub mod leaderboard;
pub mod policy;
pub mod relay;
pub mod scheduler;
pub mod store;
pub mod terrain;
pub mod world;

pub use arena::{Arena, ArenaCommand, ArenaError, ArenaHandle};
pub use relay::{Audience, SessionRegistry};

use crate::ws::protocol::ClientMsg;
use uuid::Uuid;

/// Server-assigned identity of one WebSocket session
pub type ConnId = Uuid;

/// Message received from a WebSocket session
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub conn_id: ConnId,
    pub msg: ClientMsg,
}
