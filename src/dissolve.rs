// Dissolve particles: short-lived points thrown off the photo field as it disappears.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Per-frame velocity damping.
const DAMPING: f32 = 0.97;
/// Opacity lost per second; the cloud is gone after five seconds.
const FADE_PER_SEC: f32 = 0.2;

/// Seedable pseudo-random number generator (xorshift64).
/// Jitter only; layouts use [`crate::layout::seeded_random`].
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform value in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform value in [-0.5, 0.5).
    fn centered(&mut self) -> f32 {
        self.next_f32() - 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    position: Vec3,
    velocity: Vec3,
}

/// What the shell draws for the cloud this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleFrame {
    /// Flat xyz triples.
    pub positions: Vec<f32>,
    pub opacity: f32,
}

/// Additive point cloud emitted from the last known entity positions.
#[derive(Debug, Clone)]
pub struct DissolveCloud {
    budget: usize,
    rng: Rng,
    particles: Vec<Particle>,
    started: Option<Timestamp>,
    opacity: f32,
}

impl DissolveCloud {
    pub fn new(budget: usize, seed: u64) -> Self {
        DissolveCloud {
            budget,
            rng: Rng::new(seed),
            particles: Vec::new(),
            started: None,
            opacity: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started.is_some()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spread the budget evenly over `sources`. Entities that never left the origin
    /// were never placed and emit nothing.
    pub fn ignite(&mut self, sources: &[Vec3], now: Timestamp) {
        self.particles.clear();
        self.started = None;
        if sources.is_empty() {
            return;
        }
        let per_source = self.budget / sources.len();
        for source in sources.iter().filter(|p| **p != Vec3::ZERO) {
            for _ in 0..per_source {
                if self.particles.len() >= self.budget {
                    break;
                }
                let position = *source
                    + Vec3::new(self.rng.centered() * 10.0, self.rng.centered() * 8.0, self.rng.centered() * 2.0);
                let angle = self.rng.next_f32() * std::f32::consts::TAU;
                let speed = 0.08 + self.rng.next_f32() * 0.12;
                let velocity = Vec3::new(
                    angle.cos() * speed,
                    angle.sin() * speed * 0.5 + 0.03,
                    self.rng.centered() * speed * 0.5,
                );
                self.particles.push(Particle { position, velocity });
            }
        }
        self.started = Some(now);
        self.opacity = 1.0;
    }

    /// Advance one frame.
    pub fn tick(&mut self, now: Timestamp) {
        let Some(started) = self.started else {
            return;
        };
        for p in &mut self.particles {
            p.position += p.velocity;
            p.velocity *= DAMPING;
        }
        let elapsed = now.since(started) as f32 / 1_000_000.0;
        self.opacity = (1.0 - elapsed * FADE_PER_SEC).max(0.0);
    }

    pub fn reset(&mut self) {
        self.particles.clear();
        self.started = None;
        self.opacity = 0.0;
    }

    pub fn frame(&self) -> Option<ParticleFrame> {
        self.started?;
        let positions = self
            .particles
            .iter()
            .flat_map(|p| p.position.to_array())
            .collect();
        Some(ParticleFrame {
            positions,
            opacity: self.opacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_deterministic() {
        let mut rng1 = Rng::new(42);
        let mut rng2 = Rng::new(42);
        for _ in 0..10 {
            assert_eq!(rng1.next_f32(), rng2.next_f32());
        }
    }

    #[test]
    fn rng_zero_seed_handled() {
        let mut rng = Rng::new(0);
        let v = rng.next_f32();
        assert!((0.0..1.0).contains(&v));
    }

    #[test]
    fn budget_is_shared_across_sources() {
        let mut cloud = DissolveCloud::new(100, 7);
        let sources = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO];
        cloud.ignite(&sources, Timestamp::from_millis(0));
        // 100 / 3 = 33 each, origin skipped.
        assert_eq!(cloud.len(), 66);
        assert!(cloud.is_active());
    }

    #[test]
    fn fades_out_over_five_seconds() {
        let mut cloud = DissolveCloud::new(10, 7);
        cloud.ignite(&[Vec3::ONE], Timestamp::from_millis(1_000));
        cloud.tick(Timestamp::from_millis(3_500));
        let half = cloud.frame().unwrap();
        assert!((half.opacity - 0.5).abs() < 1e-4);
        cloud.tick(Timestamp::from_millis(7_000));
        assert_eq!(cloud.frame().unwrap().opacity, 0.0);
    }

    #[test]
    fn particles_drift_and_slow() {
        let mut cloud = DissolveCloud::new(1, 3);
        cloud.ignite(&[Vec3::new(5.0, 5.0, 5.0)], Timestamp::from_millis(0));
        let before = cloud.particles[0];
        cloud.tick(Timestamp::from_millis(16));
        let after = cloud.particles[0];
        assert_eq!(after.position, before.position + before.velocity);
        assert!(after.velocity.length() < before.velocity.length());
    }

    #[test]
    fn no_sources_no_cloud() {
        let mut cloud = DissolveCloud::new(10, 1);
        cloud.ignite(&[], Timestamp::from_millis(0));
        assert!(!cloud.is_active());
        assert!(cloud.frame().is_none());
    }
}
