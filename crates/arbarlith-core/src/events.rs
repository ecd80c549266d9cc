//! Per-tick event buses.
//!
//! Anything that happens *to* an actor mid-tick (damage, heals, audio cues)
//! is queued on a [`TickEvents`] bus instead of mutating the registry in
//! place. The registry drains the damage bus between the advance phase and
//! the collision phases, which is what guarantees message delivery never
//! re-enters the actor map while it is being iterated.

use crate::actor::ActorId;

/// A pending hit (or heal) against one actor.
///
/// Positive `amount` is damage and triggers retaliation messaging on the
/// victim's mind; negative `amount` is a heal and is applied silently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DamageEvent {
    /// Who inflicted the hit, if anyone did. Environmental damage has no source.
    pub source: Option<ActorId>,
    /// Who takes the hit.
    pub target: ActorId,
    /// Hit points removed (negative values heal).
    pub amount: i32,
}

/// Audio cues the core asks the (external) sound system to play.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SoundCue {
    /// A monster noticed a target or broke into a flee.
    MonsterAlert,
}

/// A sound cue attributed to the actor that caused it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SoundEvent {
    /// The actor the cue originates from.
    pub actor: ActorId,
    /// Which cue to play.
    pub cue: SoundCue,
}

/// Everything one simulation tick produced for external consumers.
///
/// Returned by [`ActorSet::update`](crate::set::ActorSet::update). The
/// damage list is the record of hits already applied during the tick; the
/// sound and spawn lists are for the audio and presentation layers.
#[derive(Debug, Default)]
pub struct TickEvents {
    /// Hits and heals resolved this tick.
    pub damage: Vec<DamageEvent>,
    /// Sound cues emitted this tick.
    pub sounds: Vec<SoundEvent>,
    /// Actors materialized from deferred spawn requests this tick.
    pub spawned: Vec<ActorId>,
}

impl TickEvents {
    /// Creates an empty event record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
