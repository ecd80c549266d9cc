//! Actor simulation core: a registry of game objects, the four-state
//! creature mind that drives monsters, and the frame loop that ties behavior,
//! damage, collision and lifecycle together.
//!
//! The entry point is [`ActorSet`]. Register actors (usually stamped from an
//! [`ActorTemplate`] by the world's factory), then call [`ActorSet::update`]
//! once per frame:
//!
//! ```
//! use arbarlith_core::{ActorKind, ActorSet, ActorTemplate, TemplateFactory, World};
//! use glam::Vec3;
//!
//! let mut factory = TemplateFactory::new();
//! factory.register("barrel", ActorTemplate::of_kind(ActorKind::Prop));
//! let world = World::new(Box::new(factory));
//!
//! let mut set = ActorSet::new(42);
//! let id = set.create("barrel", &world).unwrap();
//! set.get_mut(id).unwrap().transform.pos = Vec3::new(3.0, 0.0, 1.0);
//!
//! let events = set.update(0.1, &world);
//! assert!(events.damage.is_empty());
//! ```
//!
//! Determinism is a design property, not an accident: actors live in an
//! ordered map, every query breaks ties on the lowest id, and all randomness
//! flows from the seed handed to [`ActorSet::new`]. Two runs with the same
//! seed and the same call sequence produce identical worlds.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod actor;
pub mod ai;
pub mod command;
pub mod error;
pub mod events;
pub mod set;
pub mod spell;
pub mod world;

#[cfg(test)]
mod tests;

pub use actor::{Actor, ActorFlags, ActorId, ActorKind, Health, MeleeAttack, Transform};
pub use ai::{AiState, Mind, Msg, Style, Tuning};
pub use command::{Order, OrderQueue, ARRIVE_EPS, MELEE_REACH_PAD};
pub use error::CoreError;
pub use events::{DamageEvent, SoundCue, SoundEvent, TickEvents};
pub use set::{ActorSet, SetView, MAX_STEP_SECONDS};
pub use spell::{Polarity, Spell, SpellPhase, MAX_SPELL_TARGETS};
pub use world::{ActorFactory, ActorTemplate, TemplateFactory, World};
