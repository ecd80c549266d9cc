//! The caster style's attack action.
//!
//! Casters reuse the whole state machine; only what happens when the mind is
//! idle in the attack state differs. Where a melee mind queues an attack
//! order, a caster closes to cast range and discharges the body's spell.

use crate::actor::{Actor, ActorId};
use crate::command::Order;
use crate::set::ActorSet;

use super::Mind;

impl Mind {
    /// Closes to cast range and begins a cast, or walks toward the target.
    pub(super) fn caster_attack(&mut self, owner: &mut Actor, target_id: ActorId, set: &ActorSet) {
        let Some(target) = set.get_opt(target_id) else {
            return;
        };
        if owner.separation(target) <= self.tuning.cast_range {
            owner.face(target.pos());
            match owner.spell.as_mut() {
                Some(spell) => {
                    // False just means mid-cooldown; stand and wait it out.
                    let _ = spell.begin_cast();
                }
                None => {
                    tracing::error!(actor = %owner.id(), "caster mind on a body with no spell");
                }
            }
        } else {
            owner.orders.queue(Order::MoveTo { dest: target.pos() });
        }
    }
}
