//! Bullets, homing missiles and decoy flares
//!
//! Ordnance exists only on clients. Every client advances every projectile
//! it knows about and drops it on hit, ground contact or expiry; only the
//! owner turns a hit into a report to the server.

use glam::{Quat, Vec3};
use uuid::Uuid;

use crate::game::terrain;

pub const BULLET_SPEED: f32 = 5.0;
pub const BULLET_LIFE: u32 = 100;
pub const BULLET_HIT_RADIUS: f32 = 5.0;

pub const MISSILE_SPEED: f32 = 4.0;
pub const MISSILE_LIFE: u32 = 300;
pub const MISSILE_HIT_RADIUS: f32 = 6.0;
/// Slerp fraction toward the target heading per frame
pub const MISSILE_TURN: f32 = 0.06;
pub const SCAN_RADIUS_START: f32 = 400.0;
pub const SCAN_RADIUS_MIN: f32 = 60.0;
pub const SCAN_RADIUS_SHRINK: f32 = 1.5;
/// Flares closer than this pull a missile off its target
pub const FLARE_DISTRACTION_RADIUS: f32 = 120.0;

pub const FLARE_LIFE: u32 = 180;
pub const FLARE_SINK: f32 = 0.4;

/// A jet that ordnance can hit: id and current position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: Uuid,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    /// Still flying
    None,
    /// Struck a jet
    Jet(Uuid),
    /// Detonated on a decoy flare
    Flare,
    /// Ran into the terrain
    Ground,
    /// Life ran out
    Expired,
}

impl Impact {
    pub fn is_spent(&self) -> bool {
        !matches!(self, Impact::None)
    }
}

fn nearest_contact(position: Vec3, owner: Uuid, jets: &[Contact], radius: f32) -> Option<&Contact> {
    jets.iter()
        .filter(|c| c.id != owner)
        .map(|c| (c, c.position.distance(position)))
        .filter(|(_, d)| *d < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub owner: Uuid,
    pub position: Vec3,
    pub orientation: Quat,
    pub life: u32,
}

impl Bullet {
    pub fn new(owner: Uuid, position: Vec3, orientation: Quat) -> Self {
        Self {
            owner,
            position,
            orientation,
            life: BULLET_LIFE,
        }
    }

    /// Advance one frame and test against every jet but the owner's, then
    /// the ground
    pub fn step(&mut self, jets: &[Contact]) -> Impact {
        self.position += self.orientation * Vec3::NEG_Z * BULLET_SPEED;
        self.life = self.life.saturating_sub(1);

        if let Some(hit) = nearest_contact(self.position, self.owner, jets, BULLET_HIT_RADIUS) {
            return Impact::Jet(hit.id);
        }
        if terrain::below_terrain(self.position.x, self.position.y, self.position.z) {
            return Impact::Ground;
        }
        if self.life == 0 {
            return Impact::Expired;
        }
        Impact::None
    }
}

#[derive(Debug, Clone)]
pub struct Flare {
    pub owner: Uuid,
    pub position: Vec3,
    pub life: u32,
}

impl Flare {
    pub fn new(owner: Uuid, position: Vec3) -> Self {
        Self {
            owner,
            position,
            life: FLARE_LIFE,
        }
    }

    /// Sink one frame; returns false once burnt out or on the ground
    pub fn step(&mut self) -> bool {
        self.position.y -= FLARE_SINK;
        self.life = self.life.saturating_sub(1);
        self.life > 0 && !terrain::below_terrain(self.position.x, self.position.y, self.position.z)
    }
}

/// What a missile is currently chasing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lock {
    Flare(Vec3),
    Jet(Contact),
}

impl Lock {
    fn position(&self) -> Vec3 {
        match self {
            Lock::Flare(p) => *p,
            Lock::Jet(c) => c.position,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Missile {
    pub owner: Uuid,
    pub position: Vec3,
    pub orientation: Quat,
    pub life: u32,
    /// Jets beyond this are ignored; shrinks every frame
    pub scan_radius: f32,
}

impl Missile {
    pub fn new(owner: Uuid, position: Vec3, orientation: Quat) -> Self {
        Self {
            owner,
            position,
            orientation,
            life: MISSILE_LIFE,
            scan_radius: SCAN_RADIUS_START,
        }
    }

    /// Nearest of: flares (any owner but ours) in distraction range and jets
    /// (anyone but the owner) in scan range
    pub fn acquire(&self, flares: &[Flare], jets: &[Contact]) -> Option<Lock> {
        let flare = flares
            .iter()
            .filter(|f| f.owner != self.owner)
            .map(|f| (f.position, f.position.distance(self.position)))
            .filter(|(_, d)| *d < FLARE_DISTRACTION_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let jet = nearest_contact(self.position, self.owner, jets, self.scan_radius)
            .map(|c| (*c, c.position.distance(self.position)));

        match (flare, jet) {
            (Some((f, fd)), Some((_, jd))) if fd <= jd => Some(Lock::Flare(f)),
            (_, Some((c, _))) => Some(Lock::Jet(c)),
            (Some((f, _)), None) => Some(Lock::Flare(f)),
            (None, None) => None,
        }
    }

    /// Steer toward the best lock, advance, then resolve impacts
    pub fn step(&mut self, flares: &[Flare], jets: &[Contact]) -> Impact {
        let lock = self.acquire(flares, jets);

        if let Some(lock) = lock {
            let to_target = lock.position() - self.position;
            if to_target.length_squared() > 1e-6 {
                let desired = Quat::from_rotation_arc(Vec3::NEG_Z, to_target.normalize());
                self.orientation = self.orientation.slerp(desired, MISSILE_TURN).normalize();
            }
        }

        self.position += self.orientation * Vec3::NEG_Z * MISSILE_SPEED;
        self.life = self.life.saturating_sub(1);
        self.scan_radius = (self.scan_radius - SCAN_RADIUS_SHRINK).max(SCAN_RADIUS_MIN);

        if let Some(Lock::Flare(p)) = lock {
            if p.distance(self.position) < MISSILE_HIT_RADIUS {
                return Impact::Flare;
            }
        }
        if let Some(hit) = nearest_contact(self.position, self.owner, jets, MISSILE_HIT_RADIUS) {
            return Impact::Jet(hit.id);
        }
        if terrain::below_terrain(self.position.x, self.position.y, self.position.z) {
            return Impact::Ground;
        }
        if self.life == 0 {
            return Impact::Expired;
        }
        Impact::None
    }
}
