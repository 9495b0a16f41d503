//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{Arena, ArenaHandle, SessionRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: ArenaHandle,
}

impl AppState {
    /// Build the state and the arena task that still has to be spawned
    pub fn new(config: Config) -> (Self, Arena) {
        let config = Arc::new(config);

        // Initialize session registry and arena
        let sessions = Arc::new(SessionRegistry::new());
        let (arena, handle) = Arena::new(config.arena.clone(), sessions);

        (
            Self {
                config,
                arena: handle,
            },
            arena,
        )
    }
}
