//! Combat rules - weapon damage and who hears about weapon fire

use crate::config::RelayOptions;

use super::relay::Audience;
use super::ConnId;

/// Full health on join and respawn
pub const MAX_HEALTH: i32 = 100;

/// Weapons whose hits are reported by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weapon {
    Bullet,
    Missile,
}

impl Weapon {
    /// Damage per confirmed hit
    pub fn damage(self) -> i32 {
        match self {
            Weapon::Bullet => 10,
            Weapon::Missile => 25,
        }
    }
}

/// Combat actions that are relayed rather than simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireKind {
    Shot,
    Missile,
    Flare,
}

/// Combat system for damage and fire relays
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_dead).
    /// Health never drops below zero.
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = current_health.saturating_sub(damage).max(0);
        (new_health, new_health <= 0)
    }

    /// Who receives the broadcast for a fire event from `sender`
    pub fn fire_audience(kind: FireKind, sender: ConnId, relay: &RelayOptions) -> Audience {
        let echo = match kind {
            FireKind::Shot => relay.echo_shots_to_sender,
            FireKind::Missile => relay.echo_missiles_to_sender,
            FireKind::Flare => relay.echo_flares_to_sender,
        };
        if echo {
            Audience::All
        } else {
            Audience::AllExcept(sender)
        }
    }
}
