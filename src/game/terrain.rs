//! Arena geometry: procedural terrain height and the kill box

/// Half of the square arena's side; |x| or |z| beyond this is out of bounds
pub const ARENA_HALF_EXTENT: f32 = 1000.0;
/// Altitude ceiling
pub const SKY_LIMIT: f32 = 800.0;
/// Minimum clearance above the terrain before a crash is reported
pub const GROUND_CLEARANCE: f32 = 2.0;

/// Radius around the origin kept flat as the spawn and building area
const FLAT_RADIUS: f32 = 150.0;
/// Distance over which hills ramp up to full height past `FLAT_RADIUS`
const RAMP_WIDTH: f32 = 350.0;

/// Deterministic terrain height at a horizontal coordinate.
///
/// Every client evaluates this locally, so it must not depend on any
/// per-process state.
pub fn height_at(x: f32, z: f32) -> f32 {
    let r = (x * x + z * z).sqrt();
    let damp = ((r - FLAT_RADIUS) / RAMP_WIDTH).clamp(0.0, 1.0);

    let hills = 35.0 * (x * 0.011).sin() * (z * 0.013).cos()
        + 18.0 * (x * 0.027 + 1.3).sin() * (z * 0.021 + 0.7).sin()
        + 30.0;

    damp * hills
}

/// Whether a point is inside the kill box (horizontal extent and ceiling)
pub fn in_bounds(x: f32, y: f32, z: f32) -> bool {
    x.abs() <= ARENA_HALF_EXTENT && z.abs() <= ARENA_HALF_EXTENT && y <= SKY_LIMIT
}

/// Whether a point is too close to (or under) the terrain surface
pub fn below_terrain(x: f32, y: f32, z: f32) -> bool {
    y < height_at(x, z) + GROUND_CLEARANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_near_origin() {
        assert_eq!(height_at(0.0, 0.0), 0.0);
        assert_eq!(height_at(100.0, -100.0), 0.0);
    }

    #[test]
    fn hills_stay_below_spawn_altitude() {
        for i in -20..=20 {
            for j in -20..=20 {
                let h = height_at(i as f32 * 50.0, j as f32 * 50.0);
                assert!(h > -30.0, "terrain too deep at {i},{j}");
                assert!(h < 200.0, "terrain reaches spawn altitude at {i},{j}");
            }
        }
    }

    #[test]
    fn full_height_hills_past_the_ramp() {
        // r > 500, so damping is 1 and the raw sum applies, dips included
        let (x, z) = (-714.0_f32, 0.0_f32);
        let expected = 35.0 * (x * 0.011).sin() * (z * 0.013).cos()
            + 18.0 * (x * 0.027 + 1.3).sin() * (z * 0.021 + 0.7).sin()
            + 30.0;
        assert!((height_at(x, z) - expected).abs() < 1e-4);
    }

    #[test]
    fn valleys_dip_below_zero_past_the_ramp() {
        let deepest = (-20..=20)
            .flat_map(|i| (-20..=20).map(move |j| height_at(i as f32 * 25.0, j as f32 * 25.0)))
            .fold(f32::MAX, f32::min);
        assert!(deepest < 0.0);
        assert!(deepest >= -23.0 - 1e-3);
    }

    #[test]
    fn height_is_deterministic() {
        assert_eq!(height_at(612.5, -733.0), height_at(612.5, -733.0));
    }

    #[test]
    fn kill_box_edges() {
        assert!(in_bounds(1000.0, 800.0, -1000.0));
        assert!(!in_bounds(1000.1, 100.0, 0.0));
        assert!(!in_bounds(0.0, 100.0, -1000.1));
        assert!(!in_bounds(0.0, 800.5, 0.0));
    }

    #[test]
    fn ground_clearance_near_origin() {
        assert!(below_terrain(0.0, 1.9, 0.0));
        assert!(!below_terrain(0.0, 2.0, 0.0));
    }
}
