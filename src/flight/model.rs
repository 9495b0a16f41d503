//! Local jet dead reckoning
//!
//! The local jet is advanced open-loop once per rendered frame; the server
//! never corrects it.

use glam::{Quat, Vec3};

pub const SPEED_MIN: f32 = 0.5;
pub const SPEED_MAX: f32 = 5.0;
pub const SPEED_STEP: f32 = 0.05;
pub const INITIAL_SPEED: f32 = 1.0;

/// Stick forward, radians per frame
pub const NOSE_DOWN_RATE: f32 = 0.02;
/// Stick back, radians per frame
pub const NOSE_UP_RATE: f32 = 0.005;
pub const ROLL_RATE: f32 = 0.04;
pub const YAW_RATE: f32 = 0.02;

/// Control state sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlInput {
    pub throttle_up: bool,
    pub throttle_down: bool,
    pub nose_down: bool,
    pub nose_up: bool,
    pub roll_left: bool,
    pub roll_right: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
    pub fire_gun: bool,
    pub fire_missile: bool,
    pub deploy_flare: bool,
}

/// Transform and airspeed of the local jet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightModel {
    pub position: Vec3,
    pub orientation: Quat,
    /// Distance covered per frame
    pub speed: f32,
}

impl FlightModel {
    /// Fresh jet at a spawn point, level and at initial speed
    pub fn spawn(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            speed: INITIAL_SPEED,
        }
    }

    /// Nose direction in world space (local -Z)
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Advance one frame
    pub fn step(&mut self, input: &ControlInput) {
        if input.throttle_up {
            self.speed = (self.speed + SPEED_STEP).min(SPEED_MAX);
        }
        if input.throttle_down {
            self.speed = (self.speed - SPEED_STEP).max(SPEED_MIN);
        }

        if input.nose_down {
            self.rotate_local(Quat::from_rotation_x(-NOSE_DOWN_RATE));
        }
        if input.nose_up {
            self.rotate_local(Quat::from_rotation_x(NOSE_UP_RATE));
        }
        if input.roll_left {
            self.rotate_local(Quat::from_rotation_z(ROLL_RATE));
        }
        if input.roll_right {
            self.rotate_local(Quat::from_rotation_z(-ROLL_RATE));
        }
        if input.yaw_left {
            self.rotate_local(Quat::from_rotation_y(YAW_RATE));
        }
        if input.yaw_right {
            self.rotate_local(Quat::from_rotation_y(-YAW_RATE));
        }

        self.position += self.forward() * self.speed;
    }

    fn rotate_local(&mut self, delta: Quat) {
        self.orientation = (self.orientation * delta).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn level_flight_moves_along_negative_z() {
        let mut jet = FlightModel::spawn(Vec3::new(0.0, 200.0, 0.0));
        jet.step(&ControlInput::default());
        assert!(approx(jet.position, Vec3::new(0.0, 200.0, -1.0)));
    }

    #[test]
    fn speed_is_clamped() {
        let mut jet = FlightModel::spawn(Vec3::ZERO);
        let up = ControlInput {
            throttle_up: true,
            ..ControlInput::default()
        };
        for _ in 0..500 {
            jet.step(&up);
        }
        assert_eq!(jet.speed, SPEED_MAX);

        let down = ControlInput {
            throttle_down: true,
            ..ControlInput::default()
        };
        for _ in 0..500 {
            jet.step(&down);
        }
        assert_eq!(jet.speed, SPEED_MIN);
    }

    #[test]
    fn stick_back_climbs_and_stick_forward_dives() {
        let mut climber = FlightModel::spawn(Vec3::new(0.0, 200.0, 0.0));
        let back = ControlInput {
            nose_up: true,
            ..ControlInput::default()
        };
        for _ in 0..60 {
            climber.step(&back);
        }
        assert!(climber.position.y > 200.0);

        let mut diver = FlightModel::spawn(Vec3::new(0.0, 200.0, 0.0));
        let forward = ControlInput {
            nose_down: true,
            ..ControlInput::default()
        };
        for _ in 0..60 {
            diver.step(&forward);
        }
        assert!(diver.position.y < 200.0);
    }

    #[test]
    fn yaw_turns_heading_left() {
        let mut jet = FlightModel::spawn(Vec3::ZERO);
        let left = ControlInput {
            yaw_left: true,
            ..ControlInput::default()
        };
        for _ in 0..20 {
            jet.step(&left);
        }
        assert!(jet.position.x < 0.0);
        assert!((jet.orientation.length() - 1.0).abs() < 1e-5);
    }
}
