// Deterministic photo layouts. Every position is a pure function of the entity index
// (and the frame clock for the animated ones), so re-renders never reshuffle the field.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Hash-style pseudo random value in `[0, 1)` for a seed. Pure: same seed, same value.
pub fn seeded_random(seed: f64) -> f64 {
    let x = (seed * 9999.0).sin() * 10000.0;
    x - x.floor()
}

/// Resting layout of one entity in the starfield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatLayout {
    pub base: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub float_speed: f32,
    pub float_offset: f32,
}

impl FloatLayout {
    /// Layout for entity `index` of `total`.
    pub fn for_index(index: usize, total: usize) -> Self {
        let seed = index as f64 * 12345.0;
        let r = |k: f64| seeded_random(seed + k) as f32;
        let angle = index as f32 / total.max(1) as f32 * std::f32::consts::TAU;
        let radius = 40.0 + r(0.0) * 50.0;

        FloatLayout {
            base: Vec3::new(
                angle.cos() * radius + (r(1.0) - 0.5) * 40.0,
                (r(2.0) - 0.5) * 50.0,
                -80.0 + r(3.0) * 160.0,
            ),
            rotation: Vec3::new((r(4.0) - 0.5) * 0.15, (r(5.0) - 0.5) * 0.15, (r(6.0) - 0.5) * 0.1),
            scale: 0.5 + r(7.0) * 0.6,
            float_speed: 0.15 + r(8.0) * 0.25,
            float_offset: r(9.0) * std::f32::consts::TAU,
        }
    }

    /// Small orbital bob around the base position at clock `t` seconds.
    pub fn bob(&self, t: f32) -> Vec3 {
        let phase = t * self.float_speed + self.float_offset;
        let orbit_x = phase.cos() * 3.0;
        let orbit_y = (t * self.float_speed * 0.8 + self.float_offset).sin() * 2.0;
        self.base + Vec3::new(orbit_x, orbit_y, 0.0)
    }

    /// Flattened background plane used while the stories play.
    pub fn backdrop(&self) -> Vec3 {
        Vec3::new(self.base.x * 2.0, self.base.y * 2.0, -80.0)
    }
}

/// Memory tunnel: one slide per index, walking away from the viewer.
pub const SPIRAL_SPACING: f32 = 30.0;
const SPIRAL_RADIUS: f32 = 25.0;
const SPIRAL_STEP: f32 = 0.8;
const SPIRAL_START: f32 = 70.0;

/// Position and roll of entity `index` in the memory tunnel.
pub fn spiral(index: usize) -> (Vec3, f32) {
    let angle = index as f32 * SPIRAL_STEP;
    let z = SPIRAL_START - index as f32 * SPIRAL_SPACING;
    (Vec3::new(angle.cos() * SPIRAL_RADIUS, angle.sin() * SPIRAL_RADIUS, z), angle)
}

/// Slowly rotating ring beside the letter while reading.
pub fn reading_ring(index: usize, total: usize, t: f32) -> Vec3 {
    let radius = 40.0;
    let angle = index as f32 / total.max(1) as f32 * std::f32::consts::TAU;
    let rot = angle + t * 0.02;
    Vec3::new(
        rot.cos() * radius - 70.0,
        (index as f32 * 0.6 + t * 0.015).sin() * 18.0,
        rot.sin() * radius - 10.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn seeded_random_is_in_unit_range() {
        for seed in 0..1_000 {
            let v = seeded_random(seed as f64 * 12345.0 + 3.0);
            assert!((0.0..1.0).contains(&v), "seed {seed} gave {v}");
        }
    }

    #[test]
    fn spiral_walks_back_by_fixed_spacing() {
        let (first, _) = spiral(0);
        let (second, roll) = spiral(1);
        assert_eq!(first.z, 70.0);
        assert_eq!(first.z - second.z, SPIRAL_SPACING);
        assert!((roll - 0.8).abs() < 1e-6);
        assert!((second.truncate().length() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn layout_stays_in_envelope() {
        for i in 0..200 {
            let layout = FloatLayout::for_index(i, 200);
            assert!(layout.base.z >= -80.0 && layout.base.z <= 80.0);
            assert!(layout.scale >= 0.5 && layout.scale <= 1.1);
        }
    }

    #[test]
    fn ring_sits_left_of_letter() {
        let p = reading_ring(0, 10, 0.0);
        assert!((p - Vec3::new(-30.0, 0.0, -10.0)).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn layout_is_index_stable(index in 0usize..500, total in 1usize..500) {
            prop_assert_eq!(FloatLayout::for_index(index, total), FloatLayout::for_index(index, total));
        }
    }
}
