//! Creature minds.
//!
//! A [`Mind`] is a small finite-state machine that drives its body by
//! queueing orders. Four states cover every creature: wandering near home,
//! a short pause when prey is first sighted, chasing and attacking, and
//! fleeing when badly hurt. Melee and caster creatures share the machine;
//! only the attack action differs (see [`Style`]).

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId, ActorKind};
use crate::command::Order;
use crate::events::{SoundCue, SoundEvent, TickEvents};
use crate::set::ActorSet;

mod caster;
mod monster;

/// How long one flee order runs before the mind re-evaluates.
pub(crate) const FLEE_ORDER_SECS: f32 = 1.5;

/// The four mind states.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    /// Idling near the spawn point, scanning for prey.
    Wander,
    /// Prey sighted; standing still for a beat before engaging.
    PauseBeforeAttack,
    /// Chasing and attacking the current target.
    Attack,
    /// Running from the current target.
    Flee,
}

/// Messages delivered to a mind from outside its own think step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    /// The body just took a hit from a known attacker.
    Attacked {
        /// Who dealt the damage.
        attacker: ActorId,
    },
}

/// How a mind prosecutes its attack.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    /// Close to melee reach and swing.
    Melee,
    /// Close to cast range and discharge the body's spell.
    Caster,
}

/// Per-template behavior knobs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Separation at which wandering prey is noticed.
    pub gain_radius: f32,
    /// Separation beyond which an engaged target is dropped. Kept larger
    /// than the gain radius so the boundary does not oscillate.
    pub lose_radius: f32,
    /// How far from the spawn point wander waypoints may land.
    pub wander_radius: f32,
    /// Length of the pause before the first attack.
    pub pause_s: f32,
    /// Lower bound of the health fraction below which the mind flees.
    pub flee_fraction_min: f32,
    /// Upper bound of the same; each mind rolls its threshold once.
    pub flee_fraction_max: f32,
    /// Separation within which a caster discharges instead of closing.
    pub cast_range: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gain_radius: 8.0,
            lose_radius: 10.0,
            wander_radius: 6.0,
            pause_s: 0.75,
            flee_fraction_min: 0.05,
            flee_fraction_max: 0.20,
            cast_range: 7.0,
        }
    }
}

/// One creature's brain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mind {
    state: AiState,
    style: Style,
    target: Option<ActorId>,
    tuning: Tuning,
    flee_threshold: f32,
}

impl Mind {
    /// A wandering mind with the midpoint flee threshold. The registry rolls
    /// the real threshold when the body is registered.
    #[must_use]
    pub fn new(style: Style, tuning: Tuning) -> Self {
        Self {
            state: AiState::Wander,
            style,
            target: None,
            tuning,
            flee_threshold: (tuning.flee_fraction_min + tuning.flee_fraction_max) * 0.5,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Current target, if engaged with one.
    #[must_use]
    pub const fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Attack style.
    #[must_use]
    pub const fn style(&self) -> Style {
        self.style
    }

    /// Behavior knobs.
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Health fraction below which this mind runs.
    #[must_use]
    pub const fn flee_threshold(&self) -> f32 {
        self.flee_threshold
    }

    /// Rolls this mind's flee threshold within its tuning band. Called once
    /// per body so a pack of the same template does not break in lockstep.
    pub(crate) fn roll_variance(&mut self, rng: &mut ChaCha8Rng) {
        let min = self.tuning.flee_fraction_min;
        let max = self.tuning.flee_fraction_max;
        self.flee_threshold = if min >= max {
            min
        } else {
            rng.gen_range(min..max)
        };
    }

    /// One frame of thought. Dispatches to the per-state update.
    pub(crate) fn think(
        &mut self,
        owner: &mut Actor,
        set: &ActorSet,
        rng: &mut ChaCha8Rng,
        events: &mut TickEvents,
    ) {
        match self.state {
            AiState::Wander => self.update_wander(owner, set, rng, events),
            AiState::PauseBeforeAttack => self.update_pause(owner, set, events),
            AiState::Attack => self.update_attack(owner, set, events),
            AiState::Flee => self.update_flee(owner, set, events),
        }
    }

    /// Reacts to a message. Unhandled combinations are ignored.
    pub(crate) fn on_msg(
        &mut self,
        msg: Msg,
        owner: &mut Actor,
        set: &ActorSet,
        events: &mut TickEvents,
    ) {
        let Msg::Attacked { attacker } = msg;
        if !is_valid_target(attacker, set) {
            return;
        }
        match self.state {
            // Jump straight to retaliation; no sighting pause for an ambush.
            AiState::Wander => {
                self.target = Some(attacker);
                self.transition(AiState::Attack, owner, set, events);
            }
            // Already engaged or running: switch attention to the new threat.
            AiState::Attack | AiState::Flee => {
                if self.target != Some(attacker) {
                    self.target = Some(attacker);
                    let state = self.state;
                    self.transition(state, owner, set, events);
                }
            }
            AiState::PauseBeforeAttack => {}
        }
    }

    /// Switches state and runs the destination state's enter action.
    /// Re-entering the current state replays the enter action.
    pub(crate) fn transition(
        &mut self,
        to: AiState,
        owner: &mut Actor,
        set: &ActorSet,
        events: &mut TickEvents,
    ) {
        tracing::debug!(actor = %owner.id(), from = ?self.state, state = ?to, "mind transition");
        self.state = to;
        owner.orders.cancel_all();
        match to {
            AiState::Wander => {
                self.target = None;
            }
            AiState::PauseBeforeAttack => {
                if let Some(target) = self.target.and_then(|id| set.get_opt(id)) {
                    owner.face(target.pos());
                }
                owner.orders.queue(Order::Freeze {
                    remaining: self.tuning.pause_s,
                    facing: self.target,
                });
            }
            AiState::Attack | AiState::Flee => {
                events.sounds.push(SoundEvent {
                    actor: owner.id(),
                    cue: SoundCue::MonsterAlert,
                });
            }
        }
    }

    /// The current target, provided it is still a live creature in the set.
    pub(crate) fn valid_target(&self, set: &ActorSet) -> Option<ActorId> {
        self.target.filter(|&id| is_valid_target(id, set))
    }
}

/// True when `id` names a live, non-zombie creature in the set.
fn is_valid_target(id: ActorId, set: &ActorSet) -> bool {
    set.get_opt(id).is_some_and(|actor| {
        actor.kind().is_creature() && !actor.is_zombie() && actor.health.alive()
    })
}

/// The nearest live, non-ghost player within `radius` of `owner`.
/// Ties break on the lowest id.
fn closest_player_target(owner: &Actor, set: &ActorSet, radius: f32) -> Option<ActorId> {
    set.iter()
        .filter(|other| {
            other.id() != owner.id()
                && other.kind() == ActorKind::Player
                && !other.is_zombie()
                && !other.is_ghost()
                && other.health.alive()
        })
        .filter_map(|other| {
            let sep = owner.separation(other);
            (sep <= radius).then_some((sep, other.id()))
        })
        .min_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        })
        .map(|(_, id)| id)
}
