//! Actors and their intrinsic state.
//!
//! An [`Actor`] is one simulated object: a player character, a monster or an
//! inert prop. Actors own their components directly rather than living in a
//! component store; the registry in [`crate::set`] owns the actors and drives
//! them once per frame.

use bitflags::bitflags;
use glam::{Vec2, Vec3};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ai::Mind;
use crate::command::OrderQueue;
use crate::events::TickEvents;
use crate::set::ActorSet;
use crate::spell::Spell;

mod components;

pub use components::{Health, MeleeAttack, Transform};

// ============================================================================
// Identity
// ============================================================================

/// Unique identity of an actor within one simulation run.
///
/// Ids are handed out monotonically by the registry and never reused, so a
/// stale id held across a despawn can never alias a newer actor. The ordering
/// of ids is the iteration order of every registry query, which keeps runs
/// with the same seed byte-for-byte reproducible.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ActorId(u64);

impl ActorId {
    /// Wraps a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Broad classification used by queries and targeting rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// A player-controlled character.
    Player,
    /// An AI-driven creature.
    Monster,
    /// Scenery with no mind: crates, doors, corpse markers.
    Prop,
}

impl ActorKind {
    /// True for kinds that fight and take damage.
    #[must_use]
    pub const fn is_creature(self) -> bool {
        matches!(self, Self::Player | Self::Monster)
    }
}

bitflags! {
    /// Per-actor status bits.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ActorFlags: u8 {
        /// Marked for removal at the end of the current frame.
        const ZOMBIE = 1 << 0;
        /// Excluded from collision detection and response.
        const GHOST = 1 << 1;
    }
}

// ============================================================================
// Actor
// ============================================================================

/// One simulated object.
pub struct Actor {
    pub(crate) id: ActorId,
    kind: ActorKind,
    template: String,
    pub(crate) flags: ActorFlags,
    /// Position, facing and footprint.
    pub transform: Transform,
    /// Hit points.
    pub health: Health,
    /// Ground speed in meters per second.
    pub speed_mps: f32,
    /// Home position; wandering and respawn anchor here.
    pub spawn_point: Vec3,
    /// Pending orders, executed front to back.
    pub orders: OrderQueue,
    /// Melee capability, if any.
    pub melee: Option<MeleeAttack>,
    /// Castable spell, if any.
    pub spell: Option<Spell>,
    pub(crate) mind: Option<Mind>,
    pub(crate) contacts: Vec<ActorId>,
}

impl Actor {
    /// Builds an actor with no id. The registry assigns the id on insertion.
    #[must_use]
    pub fn new(kind: ActorKind, template: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(0),
            kind,
            template: template.into(),
            flags: ActorFlags::empty(),
            transform: Transform::default(),
            health: Health::default(),
            speed_mps: 2.0,
            spawn_point: Vec3::ZERO,
            orders: OrderQueue::new(),
            melee: None,
            spell: None,
            mind: None,
            contacts: Vec::new(),
        }
    }

    /// This actor's id. Zero until the registry has registered it.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Broad classification.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Name of the template this actor was created from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// True once the actor has been marked for removal.
    #[must_use]
    pub const fn is_zombie(&self) -> bool {
        self.flags.contains(ActorFlags::ZOMBIE)
    }

    /// True if the actor is excluded from collision.
    #[must_use]
    pub const fn is_ghost(&self) -> bool {
        self.flags.contains(ActorFlags::GHOST)
    }

    /// True while hit points remain and the actor is not a zombie.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health.alive() && !self.is_zombie()
    }

    /// World position.
    #[must_use]
    pub const fn pos(&self) -> Vec3 {
        self.transform.pos
    }

    /// The actor's mind, if it has one.
    #[must_use]
    pub fn mind(&self) -> Option<&Mind> {
        self.mind.as_ref()
    }

    pub(crate) fn set_mind(&mut self, mind: Mind) {
        self.mind = Some(mind);
    }

    /// Marks the actor for removal. It stops participating in updates and
    /// is reclaimed at the end of the current frame.
    pub fn kill(&mut self) {
        self.flags.insert(ActorFlags::ZOMBIE);
    }

    /// Turns to face a world position.
    pub fn face(&mut self, at: Vec3) {
        self.transform.face(at);
    }

    /// Surface-to-surface distance on the ground plane.
    ///
    /// Center distance minus both cylinder radii; negative while the two
    /// cylinders interpenetrate.
    #[must_use]
    pub fn separation(&self, other: &Actor) -> f32 {
        self.transform.ground_distance(&other.transform)
            - self.transform.radius
            - other.transform.radius
    }

    /// Contact ids recorded by the most recent collision-detection pass.
    #[must_use]
    pub fn contacts(&self) -> &[ActorId] {
        &self.contacts
    }

    // ------------------------------------------------------------------------
    // Per-frame behavior
    // ------------------------------------------------------------------------

    /// Advances timers, the spell, the order queue and the mind by `dt`.
    ///
    /// `set` is the registry with this actor temporarily removed; lookups of
    /// this actor's own id against it fail, which is what the mind and order
    /// code expect.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        set: &ActorSet,
        rng: &mut ChaCha8Rng,
        events: &mut TickEvents,
    ) {
        if let Some(melee) = self.melee.as_mut() {
            melee.tick(dt);
        }

        if let Some(mut spell) = self.spell.take() {
            if spell.tick(dt) {
                for target in spell.affected(self, set) {
                    events.damage.push(crate::events::DamageEvent {
                        source: Some(self.id),
                        target,
                        amount: spell.effect_amount(),
                    });
                }
            }
            self.spell = Some(spell);
        }

        self.advance_orders(dt, set, events);

        if let Some(mut mind) = self.mind.take() {
            mind.think(self, set, rng, events);
            self.mind = Some(mind);
        }
    }

    /// Ids of live, non-ghost actors whose cylinder overlaps this one's.
    pub(crate) fn detect_contacts(&self, set: &ActorSet) -> Vec<ActorId> {
        if self.is_zombie() || self.is_ghost() {
            return Vec::new();
        }
        set.iter()
            .filter(|other| {
                other.id != self.id
                    && !other.is_zombie()
                    && !other.is_ghost()
                    && self.separation(other) < 0.0
            })
            .map(|other| other.id)
            .collect()
    }

    /// Displacement that moves this actor out of its recorded contacts.
    ///
    /// Overlap with a prop pushes this actor the full penetration depth;
    /// overlap with another creature splits the correction between the pair,
    /// each side moving half.
    pub(crate) fn collision_push(&self, set: &ActorSet) -> Vec3 {
        let mut push = Vec3::ZERO;
        for &other_id in &self.contacts {
            let Some(other) = set.get_opt(other_id) else {
                continue;
            };
            let overlap = -self.separation(other);
            if overlap <= 0.0 {
                continue;
            }
            let away = Vec2::new(
                self.transform.pos.x - other.transform.pos.x,
                self.transform.pos.z - other.transform.pos.z,
            );
            let dir = if away.length_squared() > 1e-8 {
                away.normalize()
            } else {
                // Exactly coincident centers; pick an arbitrary fixed axis.
                Vec2::X
            };
            let share = if other.kind() == ActorKind::Prop {
                overlap
            } else {
                overlap * 0.5
            };
            push += Vec3::new(dir.x * share, 0.0, dir.y * share);
        }
        push
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Captures the placement of this actor for a map save.
    #[must_use]
    pub fn save(&self) -> propbag::Bag {
        let mut bag = propbag::Bag::new();
        bag.add_text("template", self.template.clone());
        bag.add_number("x", f64::from(self.transform.pos.x));
        bag.add_number("y", f64::from(self.transform.pos.y));
        bag.add_number("z", f64::from(self.transform.pos.z));
        bag.add_number("yaw", f64::from(self.transform.yaw));
        bag
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("template", &self.template)
            .field("flags", &self.flags)
            .field("pos", &self.transform.pos)
            .field("hp", &self.health.hp)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(pos: Vec3, radius: f32) -> Actor {
        let mut a = Actor::new(ActorKind::Monster, "test");
        a.transform = Transform::at(pos, radius);
        a
    }

    #[test]
    fn id_ordering_and_display() {
        let a = ActorId::new(3);
        let b = ActorId::new(12);
        assert!(a < b);
        assert_eq!(format!("{a}"), "#3");
    }

    #[test]
    fn kind_creature_split() {
        assert!(ActorKind::Player.is_creature());
        assert!(ActorKind::Monster.is_creature());
        assert!(!ActorKind::Prop.is_creature());
    }

    #[test]
    fn separation_is_surface_to_surface() {
        let a = at(Vec3::ZERO, 0.5);
        let b = at(Vec3::new(3.0, 0.0, 0.0), 0.5);
        assert!((a.separation(&b) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn separation_negative_on_overlap() {
        let a = at(Vec3::ZERO, 0.5);
        let b = at(Vec3::new(0.6, 0.0, 0.0), 0.5);
        assert!(a.separation(&b) < 0.0);
    }

    #[test]
    fn separation_ignores_height() {
        let a = at(Vec3::ZERO, 0.5);
        let b = at(Vec3::new(0.0, 50.0, 3.0), 0.5);
        assert!((a.separation(&b) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn kill_sets_zombie() {
        let mut a = at(Vec3::ZERO, 0.5);
        assert!(a.is_alive());
        a.kill();
        assert!(a.is_zombie());
        assert!(!a.is_alive());
    }

    #[test]
    fn save_records_placement() {
        let mut a = at(Vec3::new(1.0, 0.0, 2.0), 0.5);
        a.transform.yaw = 0.5;
        let bag = a.save();
        assert_eq!(bag.text("template").unwrap(), "test");
        assert!((bag.number("x").unwrap() - 1.0).abs() < 1e-6);
        assert!((bag.number("z").unwrap() - 2.0).abs() < 1e-6);
    }
}
