//! Per-state updates for the creature mind.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::actor::Actor;
use crate::command::Order;
use crate::events::TickEvents;
use crate::set::ActorSet;

use super::{closest_player_target, AiState, Mind, Style, FLEE_ORDER_SECS};

impl Mind {
    /// Wander: scan for prey, otherwise amble near the spawn point.
    pub(super) fn update_wander(
        &mut self,
        owner: &mut Actor,
        set: &ActorSet,
        rng: &mut ChaCha8Rng,
        events: &mut TickEvents,
    ) {
        if let Some(prey) = closest_player_target(owner, set, self.tuning.gain_radius) {
            self.target = Some(prey);
            self.transition(AiState::PauseBeforeAttack, owner, set, events);
            return;
        }
        if !owner.orders.has_orders() {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let dist = rng.gen_range(0.0..self.tuning.wander_radius.max(0.01));
            let dest = owner.spawn_point
                + glam::Vec3::new(angle.cos() * dist, 0.0, angle.sin() * dist);
            owner.orders.queue(Order::MoveTo { dest });
        }
    }

    /// Pause: hold until the sighting freeze expires, then engage.
    pub(super) fn update_pause(
        &mut self,
        owner: &mut Actor,
        set: &ActorSet,
        events: &mut TickEvents,
    ) {
        if !owner.orders.has_orders() {
            self.transition(AiState::Attack, owner, set, events);
        }
    }

    /// Attack: chase and hit the target; break off when it escapes or the
    /// body gets badly hurt.
    pub(super) fn update_attack(
        &mut self,
        owner: &mut Actor,
        set: &ActorSet,
        events: &mut TickEvents,
    ) {
        let Some(target_id) = self.valid_target(set) else {
            self.transition(AiState::Wander, owner, set, events);
            return;
        };
        let target = match set.get_opt(target_id) {
            Some(t) => t,
            None => {
                self.transition(AiState::Wander, owner, set, events);
                return;
            }
        };
        if owner.separation(target) > self.tuning.lose_radius {
            self.transition(AiState::Wander, owner, set, events);
            return;
        }
        if owner.health.fraction() < self.flee_threshold {
            self.transition(AiState::Flee, owner, set, events);
            return;
        }
        if owner.orders.has_orders() {
            return;
        }
        match self.style {
            Style::Melee => {
                owner.orders.queue(Order::AttackTarget { target: target_id });
            }
            Style::Caster => self.caster_attack(owner, target_id, set),
        }
    }

    /// Flee: keep running until the threat is shaken or health recovers.
    pub(super) fn update_flee(
        &mut self,
        owner: &mut Actor,
        set: &ActorSet,
        events: &mut TickEvents,
    ) {
        let Some(target_id) = self.valid_target(set) else {
            self.transition(AiState::Wander, owner, set, events);
            return;
        };
        let target = match set.get_opt(target_id) {
            Some(t) => t,
            None => {
                self.transition(AiState::Wander, owner, set, events);
                return;
            }
        };
        if owner.separation(target) > self.tuning.lose_radius {
            self.transition(AiState::Wander, owner, set, events);
            return;
        }
        if owner.health.fraction() >= self.flee_threshold {
            self.transition(AiState::Attack, owner, set, events);
            return;
        }
        if !owner.orders.has_orders() {
            owner.orders.queue(Order::FleeFrom {
                target: target_id,
                remaining: FLEE_ORDER_SECS,
            });
        }
    }
}
