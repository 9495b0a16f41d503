//! Local crash and pickup detection
//!
//! These checks run on the client against its mirror of the world. The
//! server acts on whatever they report.

use glam::Vec3;

use crate::game::terrain;
use crate::ws::protocol::Building;

/// Half extents of the jet's bounding box
pub const JET_HALF_EXTENTS: Vec3 = Vec3::new(2.0, 0.6, 2.0);
/// Coins closer than this are collected
pub const COIN_CAPTURE_RADIUS: f32 = 8.0;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn around(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Box of a building standing on the ground plane
    pub fn from_building(b: &Building) -> Self {
        Self {
            min: Vec3::new(b.x - b.w / 2.0, 0.0, b.z - b.d / 2.0),
            max: Vec3::new(b.x + b.w / 2.0, b.h, b.z + b.d / 2.0),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}

/// Why the local jet crashed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashCause {
    Terrain,
    OutOfBounds,
    Building,
}

/// First crash condition met by a jet at `position`, checked in the order
/// terrain, kill box, buildings
pub fn crash_check(position: Vec3, obstacles: &[Aabb]) -> Option<CrashCause> {
    if terrain::below_terrain(position.x, position.y, position.z) {
        return Some(CrashCause::Terrain);
    }

    if !terrain::in_bounds(position.x, position.y, position.z) {
        return Some(CrashCause::OutOfBounds);
    }

    let jet_box = Aabb::around(position, JET_HALF_EXTENTS);
    if obstacles.iter().any(|b| jet_box.intersects(b)) {
        return Some(CrashCause::Building);
    }

    None
}

/// Ids of coins within capture radius of `position`
pub fn coins_in_reach<'a, I>(position: Vec3, coins: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a String, &'a Vec3)>,
{
    coins
        .into_iter()
        .filter(|(_, coin)| coin.distance(position) < COIN_CAPTURE_RADIUS)
        .map(|(id, _)| id.clone())
        .collect()
}
