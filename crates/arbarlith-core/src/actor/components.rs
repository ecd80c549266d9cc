//! Plain component structs shared by every actor.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Position, facing and collision footprint.
///
/// Collision geometry is a vertical cylinder; all separation math happens on
/// the XZ plane (the simulation's ground plane, Y is up).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub pos: Vec3,
    /// Facing angle in radians around Y.
    pub yaw: f32,
    /// Collision-cylinder radius in meters.
    pub radius: f32,
}

impl Transform {
    /// Creates a transform at `pos` facing +Z with the given radius.
    #[must_use]
    pub const fn at(pos: Vec3, radius: f32) -> Self {
        Self {
            pos,
            yaw: 0.0,
            radius,
        }
    }

    /// Horizontal (XZ) center-to-center distance to another transform.
    #[must_use]
    pub fn ground_distance(&self, other: &Transform) -> f32 {
        Vec2::new(other.pos.x - self.pos.x, other.pos.z - self.pos.z).length()
    }

    /// Points the transform at a world position (XZ only).
    pub fn face(&mut self, at: Vec3) {
        let dx = at.x - self.pos.x;
        let dz = at.z - self.pos.z;
        if dx * dx + dz * dz > 1e-8 {
            self.yaw = dx.atan2(dz);
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO, 0.5)
    }
}

/// Hit points with a fixed maximum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max: i32,
}

impl Health {
    /// Full health at the given maximum.
    #[must_use]
    pub const fn full(max: i32) -> Self {
        Self { hp: max, max }
    }

    /// True while any hit points remain.
    #[must_use]
    pub const fn alive(&self) -> bool {
        self.hp > 0
    }

    /// Current health as a fraction of maximum, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            self.hp as f32 / self.max as f32
        }
    }

    /// Applies a hit (or, with negative `amount`, a heal), clamped to `[0, max]`.
    pub fn apply(&mut self, amount: i32) {
        self.hp = (self.hp - amount).clamp(0, self.max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::full(30)
    }
}

/// Melee swing parameters for creatures that fight hand-to-hand.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeleeAttack {
    /// Hit points removed per landed swing.
    pub damage: i32,
    /// Seconds between swings.
    pub cooldown_s: f32,
    /// Seconds until the next swing is allowed.
    pub ready_in_s: f32,
}

impl MeleeAttack {
    /// A swing that starts off cooldown, immediately ready.
    #[must_use]
    pub const fn new(damage: i32, cooldown_s: f32) -> Self {
        Self {
            damage,
            cooldown_s,
            ready_in_s: 0.0,
        }
    }

    /// True when the cooldown has fully elapsed.
    #[must_use]
    pub const fn ready(&self) -> bool {
        self.ready_in_s <= 0.0
    }

    /// Advances the cooldown timer.
    pub fn tick(&mut self, dt: f32) {
        self.ready_in_s = (self.ready_in_s - dt).max(0.0);
    }

    /// Restarts the cooldown after a landed swing.
    pub fn reset(&mut self) {
        self.ready_in_s = self.cooldown_s.max(0.05);
    }
}

impl Default for MeleeAttack {
    fn default() -> Self {
        Self::new(5, 1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_distance_ignores_height() {
        let a = Transform::at(Vec3::new(0.0, 0.0, 0.0), 0.5);
        let b = Transform::at(Vec3::new(3.0, 10.0, 4.0), 0.5);
        assert!((a.ground_distance(&b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn face_points_along_xz() {
        let mut t = Transform::default();
        t.face(Vec3::new(0.0, 0.0, 1.0));
        assert!(t.yaw.abs() < 1e-5);
        t.face(Vec3::new(1.0, 0.0, 0.0));
        assert!((t.yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn face_toward_own_position_keeps_yaw() {
        let mut t = Transform::default();
        t.yaw = 1.25;
        t.face(t.pos);
        assert!((t.yaw - 1.25).abs() < 1e-6);
    }

    #[test]
    fn health_apply_clamps_both_ways() {
        let mut h = Health::full(30);
        h.apply(100);
        assert_eq!(h.hp, 0);
        assert!(!h.alive());
        h.apply(-100);
        assert_eq!(h.hp, 30);
    }

    #[test]
    fn health_fraction() {
        let mut h = Health::full(40);
        h.apply(10);
        assert!((h.fraction() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn melee_cooldown_cycle() {
        let mut m = MeleeAttack::new(5, 1.0);
        assert!(m.ready());
        m.reset();
        assert!(!m.ready());
        m.tick(0.6);
        assert!(!m.ready());
        m.tick(0.6);
        assert!(m.ready());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn health_never_leaves_its_range(
                max in 1..500_i32,
                hits in proptest::collection::vec(-200..200_i32, 0..32),
            ) {
                let mut h = Health::full(max);
                for hit in hits {
                    h.apply(hit);
                    prop_assert!(h.hp >= 0);
                    prop_assert!(h.hp <= h.max);
                }
            }

            #[test]
            fn ground_distance_is_symmetric(
                ax in -100.0_f32..100.0, az in -100.0_f32..100.0,
                bx in -100.0_f32..100.0, bz in -100.0_f32..100.0,
            ) {
                let a = Transform::at(Vec3::new(ax, 0.0, az), 0.5);
                let b = Transform::at(Vec3::new(bx, 0.0, bz), 0.5);
                prop_assert!((a.ground_distance(&b) - b.ground_distance(&a)).abs() < 1e-4);
            }
        }
    }
}
