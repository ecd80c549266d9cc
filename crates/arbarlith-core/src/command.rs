//! Orders: small units of scripted motion and combat.
//!
//! Every actor carries an [`OrderQueue`]. Each frame the front order runs for
//! one slice of time; when it reports completion it is discarded and the next
//! order starts on the following frame. Minds drive their bodies exclusively
//! by queueing orders, so scripted sequences and AI behavior share one code
//! path.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::actor::{Actor, ActorId};
use crate::events::{DamageEvent, TickEvents};
use crate::set::ActorSet;

/// Distance at which a move order counts as arrived.
pub const ARRIVE_EPS: f32 = 0.05;

/// Extra reach beyond touching cylinders within which a melee swing lands.
pub const MELEE_REACH_PAD: f32 = 0.35;

/// One queued instruction for an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Order {
    /// Walk in a straight line to a world position.
    MoveTo {
        /// Destination on the ground plane.
        dest: Vec3,
    },
    /// Stand still for a duration, optionally tracking a target with the gaze.
    Freeze {
        /// Seconds left to hold.
        remaining: f32,
        /// Actor to keep facing while frozen.
        facing: Option<ActorId>,
    },
    /// Close with a target and swing at it until one hit lands.
    AttackTarget {
        /// The victim.
        target: ActorId,
    },
    /// Run directly away from a target for a duration.
    FleeFrom {
        /// The threat.
        target: ActorId,
        /// Seconds left to run.
        remaining: f32,
    },
}

/// FIFO of pending orders.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrderQueue {
    orders: VecDeque<Order>,
}

impl OrderQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an order behind everything already queued.
    pub fn queue(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Drops every pending order.
    pub fn cancel_all(&mut self) {
        self.orders.clear();
    }

    /// True while at least one order is pending.
    #[must_use]
    pub fn has_orders(&self) -> bool {
        !self.orders.is_empty()
    }

    /// Number of pending orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    pub(crate) fn push_front(&mut self, order: Order) {
        self.orders.push_front(order);
    }
}

impl Actor {
    /// Runs the front order for one time slice.
    pub(crate) fn advance_orders(&mut self, dt: f32, set: &ActorSet, events: &mut TickEvents) {
        let Some(mut order) = self.orders.pop_front() else {
            return;
        };
        let done = match &mut order {
            Order::MoveTo { dest } => self.run_move_to(*dest, dt),
            Order::Freeze { remaining, facing } => {
                if let Some(target) = facing.and_then(|id| set.get_opt(id)) {
                    self.face(target.pos());
                }
                *remaining -= dt;
                *remaining <= 0.0
            }
            Order::AttackTarget { target } => self.run_attack(*target, dt, set, events),
            Order::FleeFrom { target, remaining } => {
                *remaining -= dt;
                if let Some(threat) = set.get_opt(*target) {
                    let away = self.pos() + (self.pos() - threat.pos());
                    self.step_toward(away, dt);
                    *remaining <= 0.0
                } else {
                    true
                }
            }
        };
        if !done {
            self.orders.push_front(order);
        }
    }

    /// Walks toward `dest`, clamping the final step. Returns true on arrival.
    fn run_move_to(&mut self, dest: Vec3, dt: f32) -> bool {
        self.face(dest);
        self.step_toward(dest, dt);
        let remaining = Vec2::new(dest.x - self.pos().x, dest.z - self.pos().z).length();
        remaining <= ARRIVE_EPS
    }

    /// One slice of an attack order. Returns true when the order is finished.
    fn run_attack(
        &mut self,
        target: ActorId,
        dt: f32,
        set: &ActorSet,
        events: &mut TickEvents,
    ) -> bool {
        let Some(victim) = set.get_opt(target) else {
            return true;
        };
        if !victim.is_alive() {
            return true;
        }
        self.face(victim.pos());
        if self.separation(victim) > MELEE_REACH_PAD {
            self.step_toward(victim.pos(), dt);
            return false;
        }
        let Some(melee) = self.melee.as_mut() else {
            tracing::error!(actor = %self.id(), "attack order on an actor with no melee attack");
            return true;
        };
        if melee.ready() {
            events.damage.push(DamageEvent {
                source: Some(self.id),
                target,
                amount: melee.damage,
            });
            melee.reset();
            return true;
        }
        // In reach but still cooling down; hold position until the swing.
        false
    }

    /// Moves up to one frame's worth of distance toward `dest` (XZ only).
    fn step_toward(&mut self, dest: Vec3, dt: f32) {
        let delta = Vec2::new(dest.x - self.pos().x, dest.z - self.pos().z);
        let dist = delta.length();
        if dist <= 1e-6 {
            return;
        }
        let step = (self.speed_mps * dt).min(dist);
        let dir = delta / dist;
        self.transform.pos.x += dir.x * step;
        self.transform.pos.z += dir.y * step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorKind;

    fn walker() -> Actor {
        let mut a = Actor::new(ActorKind::Monster, "walker");
        a.speed_mps = 1.0;
        a
    }

    #[test]
    fn queue_fifo_and_cancel() {
        let mut q = OrderQueue::new();
        assert!(!q.has_orders());
        q.queue(Order::MoveTo { dest: Vec3::ZERO });
        q.queue(Order::Freeze {
            remaining: 1.0,
            facing: None,
        });
        assert_eq!(q.len(), 2);
        assert!(matches!(q.pop_front(), Some(Order::MoveTo { .. })));
        q.cancel_all();
        assert!(q.is_empty());
    }

    #[test]
    fn move_to_steps_at_speed_and_arrives() {
        let set = ActorSet::new(1);
        let mut events = TickEvents::new();
        let mut a = walker();
        a.orders.queue(Order::MoveTo {
            dest: Vec3::new(2.0, 0.0, 0.0),
        });

        a.advance_orders(1.0, &set, &mut events);
        assert!((a.pos().x - 1.0).abs() < 1e-5);
        assert!(a.orders.has_orders());

        a.advance_orders(1.0, &set, &mut events);
        assert!((a.pos().x - 2.0).abs() < 1e-5);
        assert!(!a.orders.has_orders());
    }

    #[test]
    fn move_to_clamps_overshoot() {
        let set = ActorSet::new(1);
        let mut events = TickEvents::new();
        let mut a = walker();
        a.speed_mps = 10.0;
        a.orders.queue(Order::MoveTo {
            dest: Vec3::new(0.5, 0.0, 0.0),
        });
        a.advance_orders(1.0, &set, &mut events);
        assert!((a.pos().x - 0.5).abs() < 1e-5);
        assert!(!a.orders.has_orders());
    }

    #[test]
    fn freeze_counts_down() {
        let set = ActorSet::new(1);
        let mut events = TickEvents::new();
        let mut a = walker();
        a.orders.queue(Order::Freeze {
            remaining: 0.3,
            facing: None,
        });
        a.advance_orders(0.2, &set, &mut events);
        assert!(a.orders.has_orders());
        a.advance_orders(0.2, &set, &mut events);
        assert!(!a.orders.has_orders());
    }

    #[test]
    fn attack_on_missing_target_completes() {
        let set = ActorSet::new(1);
        let mut events = TickEvents::new();
        let mut a = walker();
        a.melee = Some(crate::actor::MeleeAttack::new(5, 1.0));
        a.orders.queue(Order::AttackTarget {
            target: ActorId::new(999),
        });
        a.advance_orders(0.1, &set, &mut events);
        assert!(!a.orders.has_orders());
        assert!(events.damage.is_empty());
    }

    #[test]
    fn flee_without_threat_completes() {
        let set = ActorSet::new(1);
        let mut events = TickEvents::new();
        let mut a = walker();
        a.orders.queue(Order::FleeFrom {
            target: ActorId::new(999),
            remaining: 2.0,
        });
        a.advance_orders(0.1, &set, &mut events);
        assert!(!a.orders.has_orders());
    }
}
