//! Castable area spells.
//!
//! A spell cycles `Ready -> Casting -> Cooling -> Ready`. The effect lands
//! once, at the instant the casting timer expires; who it lands on depends on
//! the caster's kind and the spell's polarity (see [`Spell::affected`]).

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId, ActorKind};
use crate::set::ActorSet;

/// Cap on how many actors one discharge can touch.
pub const MAX_SPELL_TARGETS: usize = 6;

/// Where a spell is in its cast cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellPhase {
    /// Idle and castable.
    Ready,
    /// Wind-up in progress; the effect lands when the timer expires.
    Casting,
    /// Recently discharged; waiting out the cooldown.
    Cooling,
}

/// Whether a spell hurts or heals.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Removes hit points from victims.
    Damage,
    /// Restores hit points to beneficiaries.
    Heal,
}

/// One castable area effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    /// Hurts or heals.
    pub polarity: Polarity,
    /// Hit points moved per affected actor.
    pub power: i32,
    /// Effect radius, measured surface to surface from the caster.
    pub radius: f32,
    /// Wind-up seconds before the effect lands.
    pub cast_time: f32,
    /// Seconds of cooldown after a discharge.
    pub cooldown: f32,
    /// False disables the spell entirely (not yet learned, silenced).
    pub available: bool,
    timer: f32,
    phase: SpellPhase,
}

impl Spell {
    /// A ready spell with the given shape.
    #[must_use]
    pub fn new(polarity: Polarity, power: i32, radius: f32, cast_time: f32, cooldown: f32) -> Self {
        Self {
            polarity,
            power,
            radius,
            cast_time,
            cooldown,
            available: true,
            timer: 0.0,
            phase: SpellPhase::Ready,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SpellPhase {
        self.phase
    }

    /// True when available and idle, so a cast may begin.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.available && self.phase == SpellPhase::Ready
    }

    /// Starts the wind-up. Returns false (and does nothing) unless ready.
    pub fn begin_cast(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.phase = SpellPhase::Casting;
        self.timer = self.cast_time;
        true
    }

    /// Advances the cast cycle. Returns true on the frame the effect lands.
    pub fn tick(&mut self, dt: f32) -> bool {
        match self.phase {
            SpellPhase::Ready => false,
            SpellPhase::Casting => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.phase = SpellPhase::Cooling;
                    self.timer = self.cooldown;
                    true
                } else {
                    false
                }
            }
            SpellPhase::Cooling => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.phase = SpellPhase::Ready;
                    self.timer = 0.0;
                }
                false
            }
        }
    }

    /// Signed amount carried on the damage bus by this spell's discharge.
    /// Positive hurts; heals ride the same bus as negative damage.
    #[must_use]
    pub const fn effect_amount(&self) -> i32 {
        match self.polarity {
            Polarity::Damage => self.power,
            Polarity::Heal => -self.power,
        }
    }

    /// Who this spell lands on if discharged by `caster` right now.
    ///
    /// The eligible pool depends on the caster and polarity:
    /// a player's damage spell hits every other creature, and their heal
    /// reaches players including themselves; a monster's damage spell hits
    /// players only, never fellow monsters, while a monster's heal reaches
    /// any creature. Zombies, ghosts and the dead are never candidates.
    /// Candidates in radius are ordered nearest first, ties by lowest id,
    /// and capped at [`MAX_SPELL_TARGETS`].
    #[must_use]
    pub fn affected(&self, caster: &Actor, set: &ActorSet) -> Vec<ActorId> {
        let eligible = |other: &Actor| -> bool {
            if other.is_zombie() || other.is_ghost() || !other.health.alive() {
                return false;
            }
            match (caster.kind(), self.polarity) {
                (ActorKind::Player, Polarity::Damage) => {
                    other.kind().is_creature() && other.id() != caster.id()
                }
                (ActorKind::Player, Polarity::Heal) => other.kind() == ActorKind::Player,
                (ActorKind::Monster, Polarity::Damage) => other.kind() == ActorKind::Player,
                (ActorKind::Monster, Polarity::Heal) => other.kind().is_creature(),
                (ActorKind::Prop, _) => false,
            }
        };

        let mut hits: Vec<(f32, ActorId)> = set
            .iter()
            .filter(|other| eligible(other))
            .filter_map(|other| {
                let sep = caster.separation(other);
                (sep <= self.radius).then_some((sep, other.id()))
            })
            .collect();
        // Self-heal: the caster is not a member of `set` during its own
        // advance, so add it back explicitly.
        if self.polarity == Polarity::Heal
            && caster.kind().is_creature()
            && caster.health.alive()
            && !caster.is_zombie()
            && set.get_opt(caster.id()).is_none()
        {
            hits.push((0.0, caster.id()));
        }
        hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1)));
        hits.truncate(MAX_SPELL_TARGETS);
        hits.into_iter().map(|(_, id)| id).collect()
    }
}
