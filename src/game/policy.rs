//! Acceptance policy for client-reported actions
//!
//! Clients are authoritative for their own transform, crashes and hits.
//! Every report goes through an [`ActionPolicy`] before it mutates the
//! store, so server-side authority checks can be added without changing
//! the wire protocol.

use glam::{Quat, Vec3};

use super::combat::Weapon;
use super::store::Player;
use super::terrain::{ARENA_HALF_EXTENT, SKY_LIMIT};
use super::ConnId;

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(&'static str),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

pub trait ActionPolicy: Send + Sync {
    fn movement(&self, player: &Player, position: Vec3, orientation: Quat) -> Verdict;

    fn hit(&self, shooter: ConnId, target: &Player, weapon: Weapon) -> Verdict;

    fn crash(&self, player: &Player) -> Verdict;

    fn collect(&self, player: &Player, coin_position: Vec3) -> Verdict;
}

/// Accepts every report verbatim.
///
/// This is the historical behaviour and an open anti-cheat gap: a client
/// can teleport, self-report hits on anyone, or collect any coin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustClient;

impl ActionPolicy for TrustClient {
    fn movement(&self, _player: &Player, _position: Vec3, _orientation: Quat) -> Verdict {
        Verdict::Accept
    }

    fn hit(&self, _shooter: ConnId, _target: &Player, _weapon: Weapon) -> Verdict {
        Verdict::Accept
    }

    fn crash(&self, _player: &Player) -> Verdict {
        Verdict::Accept
    }

    fn collect(&self, _player: &Player, _coin_position: Vec3) -> Verdict {
        Verdict::Accept
    }
}

/// Rejects reports that cannot be produced by an honest client
#[derive(Debug, Clone, Copy)]
pub struct SanityCheck {
    /// Slack allowed past the kill box before a transform is considered bogus
    pub bounds_slack: f32,
    /// Max distance between collector and coin
    pub max_collect_distance: f32,
}

impl Default for SanityCheck {
    fn default() -> Self {
        Self {
            bounds_slack: 50.0,
            max_collect_distance: 40.0,
        }
    }
}

impl ActionPolicy for SanityCheck {
    fn movement(&self, _player: &Player, position: Vec3, orientation: Quat) -> Verdict {
        if !position.is_finite() || !orientation.is_finite() {
            return Verdict::Reject("non-finite transform");
        }
        let limit = ARENA_HALF_EXTENT + self.bounds_slack;
        if position.x.abs() > limit
            || position.z.abs() > limit
            || position.y > SKY_LIMIT + self.bounds_slack
            || position.y < -self.bounds_slack
        {
            return Verdict::Reject("position outside arena");
        }
        if (orientation.length() - 1.0).abs() > 1e-2 {
            return Verdict::Reject("orientation is not a unit quaternion");
        }
        Verdict::Accept
    }

    fn hit(&self, shooter: ConnId, target: &Player, _weapon: Weapon) -> Verdict {
        if shooter == target.id {
            return Verdict::Reject("self hit");
        }
        Verdict::Accept
    }

    fn crash(&self, _player: &Player) -> Verdict {
        Verdict::Accept
    }

    fn collect(&self, player: &Player, coin_position: Vec3) -> Verdict {
        if player.position.distance(coin_position) > self.max_collect_distance {
            return Verdict::Reject("coin out of reach");
        }
        Verdict::Accept
    }
}

/// Policy selected by configuration
pub fn from_config(validate_input: bool) -> Box<dyn ActionPolicy> {
    if validate_input {
        Box::new(SanityCheck::default())
    } else {
        Box::new(TrustClient)
    }
}
