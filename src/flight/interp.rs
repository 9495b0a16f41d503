//! Smoothing of remote jets toward their last reported transform

use glam::{Quat, Vec3};
use uuid::Uuid;

use crate::ws::protocol::PlayerRecord;

/// Fraction of the remaining distance covered per frame
pub const POSITION_BLEND: f32 = 0.2;
/// Slerp fraction toward the reported orientation per frame
pub const ORIENTATION_BLEND: f32 = 0.5;

/// A remote player as rendered locally
#[derive(Debug, Clone)]
pub struct RemoteJet {
    pub id: Uuid,
    pub name: String,
    pub color: u32,
    pub health: i32,
    /// Hidden between a death notice and the respawn
    pub visible: bool,
    pub position: Vec3,
    pub orientation: Quat,
    target_position: Vec3,
    target_orientation: Quat,
}

impl RemoteJet {
    pub fn from_record(record: &PlayerRecord) -> Self {
        let position = record.position();
        let orientation = Quat::from(record.quaternion).normalize();
        Self {
            id: record.id,
            name: record.name.clone(),
            color: record.color,
            health: record.health,
            visible: true,
            position,
            orientation,
            target_position: position,
            target_orientation: orientation,
        }
    }

    /// New network sample; the rendered transform eases toward it
    pub fn observe(&mut self, record: &PlayerRecord) {
        self.target_position = record.position();
        self.target_orientation = Quat::from(record.quaternion).normalize();
    }

    /// Jump straight to a record (respawn or round reset)
    pub fn snap(&mut self, record: &PlayerRecord) {
        *self = Self::from_record(record);
    }

    /// Ease one frame toward the target
    pub fn step(&mut self) {
        self.position = self.position.lerp(self.target_position, POSITION_BLEND);
        self.orientation = self
            .orientation
            .slerp(self.target_orientation, ORIENTATION_BLEND)
            .normalize();
    }

    /// Distance between rendered and reported position
    pub fn lag(&self) -> f32 {
        self.position.distance(self.target_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::WireQuat;

    fn record(x: f32, y: f32, z: f32, q: Quat) -> PlayerRecord {
        PlayerRecord {
            id: Uuid::nil(),
            name: "Bandit".into(),
            x,
            y,
            z,
            quaternion: q.into(),
            health: 100,
            score: 0,
            color: 0xff0000,
        }
    }

    #[test]
    fn position_lag_decays_geometrically() {
        let mut jet = RemoteJet::from_record(&record(0.0, 100.0, 0.0, Quat::IDENTITY));
        jet.observe(&record(100.0, 100.0, 0.0, Quat::IDENTITY));
        assert!((jet.lag() - 100.0).abs() < 1e-4);

        jet.step();
        assert!((jet.position.x - 20.0).abs() < 1e-4);
        assert!((jet.lag() - 80.0).abs() < 1e-3);

        for _ in 0..60 {
            jet.step();
        }
        assert!(jet.lag() < 0.01);
    }

    #[test]
    fn orientation_converges() {
        let target = Quat::from_rotation_y(1.0);
        let mut jet = RemoteJet::from_record(&record(0.0, 0.0, 0.0, Quat::IDENTITY));
        jet.observe(&record(0.0, 0.0, 0.0, target));
        for _ in 0..20 {
            jet.step();
        }
        assert!(jet.orientation.angle_between(target) < 1e-2);
    }

    #[test]
    fn snap_restores_visibility_and_transform() {
        let mut jet = RemoteJet::from_record(&record(0.0, 0.0, 0.0, Quat::IDENTITY));
        jet.visible = false;
        jet.snap(&record(5.0, 200.0, 5.0, Quat::IDENTITY));
        assert!(jet.visible);
        assert_eq!(jet.position, Vec3::new(5.0, 200.0, 5.0));
        assert_eq!(jet.lag(), 0.0);
    }

    #[test]
    fn default_wire_quaternion_is_identity() {
        assert_eq!(Quat::from(WireQuat::default()), Quat::IDENTITY);
    }
}
