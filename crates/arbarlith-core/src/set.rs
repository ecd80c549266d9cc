//! The actor registry and its frame loop.
//!
//! An [`ActorSet`] owns every live actor in one zone and drives the whole
//! frame: behavior, damage delivery, collision, deferred spawns and removal
//! of the dead, in that order, every call to [`ActorSet::update`].
//!
//! Actors live in a `BTreeMap` keyed by [`ActorId`], so every iteration the
//! registry performs happens in ascending id order. Combined with the seeded
//! generator handed out per frame, two runs built from the same seed and the
//! same call sequence stay identical.

use std::collections::BTreeMap;
use std::path::PathBuf;

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::actor::{Actor, ActorId, ActorKind};
use crate::ai::Msg;
use crate::error::CoreError;
use crate::events::{DamageEvent, TickEvents};
use crate::world::World;

/// Longest time slice a single update accepts. Longer frames are clamped so
/// a stall never turns into a teleport.
pub const MAX_STEP_SECONDS: f32 = 0.2;

/// A spawn delivered at the end of the frame that requested it.
#[derive(Clone, Debug)]
struct SpawnRequest {
    data_file: PathBuf,
    pos: Vec3,
}

/// The registry of every live actor in a zone.
pub struct ActorSet {
    next_id: u64,
    actors: BTreeMap<ActorId, Actor>,
    pending_spawns: Vec<SpawnRequest>,
    rng: ChaCha8Rng,
}

impl ActorSet {
    /// An empty registry. All randomness downstream of the set derives from
    /// `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            next_id: 1,
            actors: BTreeMap::new(),
            pending_spawns: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    // ------------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------------

    /// Builds an actor of the named kind through the world's factory and
    /// registers it.
    ///
    /// # Errors
    /// [`CoreError::UnknownKind`] when the factory does not know the name.
    pub fn create(&mut self, kind_name: &str, world: &World) -> Result<ActorId, CoreError> {
        let actor = world.factory().create(kind_name).map_err(|err| {
            warn!(kind = kind_name, %err, "actor creation failed");
            err
        })?;
        Ok(self.register(actor))
    }

    /// Registers an actor, assigning it the next id. Ids are never reused
    /// within one registry's lifetime.
    pub fn register(&mut self, mut actor: Actor) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;
        actor.id = id;
        if let Some(mut mind) = actor.mind.take() {
            mind.roll_variance(&mut self.rng);
            actor.mind = Some(mind);
        }
        self.actors.insert(id, actor);
        id
    }

    /// Looks up an actor.
    ///
    /// # Errors
    /// [`CoreError::NotAMember`] when the id is not in this set.
    pub fn get(&self, id: ActorId) -> Result<&Actor, CoreError> {
        self.actors.get(&id).ok_or(CoreError::NotAMember(id))
    }

    /// Looks up an actor mutably.
    ///
    /// # Errors
    /// [`CoreError::NotAMember`] when the id is not in this set.
    pub fn get_mut(&mut self, id: ActorId) -> Result<&mut Actor, CoreError> {
        self.actors.get_mut(&id).ok_or(CoreError::NotAMember(id))
    }

    /// Looks up an actor, returning `None` for non-members.
    #[must_use]
    pub fn get_opt(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Mutable variant of [`ActorSet::get_opt`].
    pub fn get_opt_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// True when the id names a current member.
    #[must_use]
    pub fn is_member(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Number of members, zombies included until the frame ends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// True when no actors remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// All members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// All member ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    // ------------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------------

    /// Runs one frame.
    ///
    /// Phases, in order: every non-zombie actor advances (timers, spell,
    /// orders, mind); damage raised during the advance is delivered;
    /// collision contacts are detected against post-advance positions and
    /// then resolved; spawns requested this frame materialize; zombies are
    /// reclaimed. Actors advance in ascending id order, and an actor never
    /// observes itself as a member while it is advancing.
    ///
    /// A non-positive `dt` skips the time-driven phases, but pending spawns
    /// still materialize and zombies are still reclaimed.
    pub fn update(&mut self, dt: f32, world: &World) -> TickEvents {
        let mut events = TickEvents::new();
        let dt = dt.min(MAX_STEP_SECONDS);
        if dt > 0.0 {
            self.run_simulation_phases(dt, &mut events);
        }

        // Materialize spawns requested during the frame.
        let requests = std::mem::take(&mut self.pending_spawns);
        for request in requests {
            match world.factory().load(&request.data_file) {
                Ok(mut actor) => {
                    actor.transform.pos = request.pos;
                    actor.spawn_point = request.pos;
                    let id = self.register(actor);
                    events.spawned.push(id);
                }
                Err(err) => {
                    warn!(file = %request.data_file.display(), %err, "deferred spawn failed");
                }
            }
        }

        self.garbage_collect(world);
        events
    }

    /// The time-driven phases of one frame: advance, damage delivery,
    /// collision detection, collision response.
    fn run_simulation_phases(&mut self, dt: f32, events: &mut TickEvents) {
        // Advance. Each actor is lifted out of the map so it can read the
        // rest of the set while mutating itself.
        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        let mut rng = self.rng.clone();
        for id in ids {
            let Some(mut actor) = self.actors.remove(&id) else {
                continue;
            };
            if !actor.is_zombie() {
                actor.advance(dt, &*self, &mut rng, events);
            }
            self.actors.insert(id, actor);
        }
        self.rng = rng;

        // Deliver this frame's damage before collision runs.
        let pending = std::mem::take(&mut events.damage);
        self.deliver_damage(&pending, events);
        events.damage = pending;

        // Detect contacts against settled positions.
        let contact_lists: Vec<(ActorId, Vec<ActorId>)> = self
            .actors
            .values()
            .map(|actor| (actor.id, actor.detect_contacts(self)))
            .collect();
        for (id, contacts) in contact_lists {
            if let Some(actor) = self.actors.get_mut(&id) {
                actor.contacts = contacts;
            }
        }

        // Resolve. Props never move; creatures shove each other apart.
        let pushes: Vec<(ActorId, Vec3)> = self
            .actors
            .values()
            .filter(|actor| {
                !actor.is_zombie() && !actor.is_ghost() && actor.kind() != ActorKind::Prop
            })
            .map(|actor| (actor.id, actor.collision_push(self)))
            .collect();
        for (id, push) in pushes {
            if let Some(actor) = self.actors.get_mut(&id) {
                actor.transform.pos += push;
            }
        }
    }

    /// Delivers damage raised outside the frame loop (player input, scripts,
    /// traps) with the same rules the frame loop uses.
    pub fn apply_damage(&mut self, hits: &[DamageEvent]) -> TickEvents {
        let mut events = TickEvents::new();
        self.deliver_damage(hits, &mut events);
        events
    }

    /// Applies each hit to its victim. Kills mark the victim a zombie;
    /// survivors with a known attacker are told about it.
    fn deliver_damage(&mut self, hits: &[DamageEvent], events: &mut TickEvents) {
        for hit in hits {
            let Some(mut victim) = self.actors.remove(&hit.target) else {
                continue;
            };
            if victim.is_zombie() {
                self.actors.insert(hit.target, victim);
                continue;
            }
            victim.health.apply(hit.amount);
            if !victim.health.alive() {
                debug!(actor = %hit.target, "actor died");
                victim.kill();
            } else if hit.amount > 0 {
                if let Some(attacker) = hit.source.filter(|&src| src != hit.target) {
                    if let Some(mut mind) = victim.mind.take() {
                        mind.on_msg(Msg::Attacked { attacker }, &mut victim, &*self, events);
                        victim.mind = Some(mind);
                    }
                }
            }
            self.actors.insert(hit.target, victim);
        }
    }

    /// Removes every zombie and hands it to the factory for reclamation.
    /// Harmless to call with nothing to collect.
    pub fn garbage_collect(&mut self, world: &World) {
        let dead: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|(_, actor)| actor.is_zombie())
            .map(|(&id, _)| id)
            .collect();
        for id in dead {
            if let Some(actor) = self.actors.remove(&id) {
                debug!(actor = %id, template = actor.template(), "reclaimed");
                world.factory().reclaim(actor);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Spawning and removal
    // ------------------------------------------------------------------------

    /// Requests a spawn from a data file. The actor materializes at the end
    /// of the current frame's update, never mid-iteration.
    pub fn spawn(&mut self, data_file: impl Into<PathBuf>, pos: Vec3) {
        self.pending_spawns.push(SpawnRequest {
            data_file: data_file.into(),
            pos,
        });
    }

    /// Spawns from a data file immediately. Only safe from outside the frame
    /// loop; during a frame, use [`ActorSet::spawn`].
    ///
    /// # Errors
    /// Whatever the factory's load returns.
    pub fn spawn_now(
        &mut self,
        data_file: impl Into<PathBuf>,
        pos: Vec3,
        world: &World,
    ) -> Result<ActorId, CoreError> {
        let mut actor = world.factory().load(&data_file.into())?;
        actor.transform.pos = pos;
        actor.spawn_point = pos;
        Ok(self.register(actor))
    }

    /// Removes an actor immediately and hands it to the factory. Returns
    /// false if the id was not a member.
    pub fn remove_now(&mut self, id: ActorId, world: &World) -> bool {
        match self.actors.remove(&id) {
            Some(actor) => {
                world.factory().reclaim(actor);
                true
            }
            None => false,
        }
    }

    /// Transfers one actor into another set, keeping its id.
    ///
    /// # Errors
    /// [`CoreError::NotAMember`] if it is not here,
    /// [`CoreError::AlreadyMember`] if the destination already has that id.
    pub fn move_object(&mut self, id: ActorId, dest: &mut ActorSet) -> Result<(), CoreError> {
        if dest.is_member(id) {
            return Err(CoreError::AlreadyMember(id));
        }
        let actor = self.actors.remove(&id).ok_or(CoreError::NotAMember(id))?;
        dest.next_id = dest.next_id.max(id.as_u64() + 1);
        dest.actors.insert(id, actor);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Members of one kind, ascending id order.
    pub fn of_kind(&self, kind: ActorKind) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(move |a| a.kind() == kind)
    }

    /// The nearest member of `kind` to a point, by ground-plane center
    /// distance, within `max_radius`. Ties break on the lowest id.
    #[must_use]
    pub fn closest(&self, kind: ActorKind, point: Vec3, max_radius: f32) -> Option<ActorId> {
        self.closest_where(point, max_radius, |a| a.kind() == kind)
    }

    /// Up to `max_count` members of `kind` within `max_radius` of a point,
    /// nearest first.
    #[must_use]
    pub fn closest_several(
        &self,
        kind: ActorKind,
        point: Vec3,
        max_count: usize,
        max_radius: f32,
    ) -> Vec<ActorId> {
        let mut found: Vec<(f32, ActorId)> = self
            .actors
            .values()
            .filter(|a| a.kind() == kind && !a.is_zombie())
            .filter_map(|a| {
                let d = ground_distance(point, a.pos());
                (d <= max_radius).then_some((d, a.id()))
            })
            .collect();
        found.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        found.truncate(max_count);
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// The nearest non-zombie member satisfying `pred`, within `max_radius`
    /// of a point. Ties break on the lowest id.
    pub fn closest_where(
        &self,
        point: Vec3,
        max_radius: f32,
        pred: impl Fn(&Actor) -> bool,
    ) -> Option<ActorId> {
        self.actors
            .values()
            .filter(|a| !a.is_zombie() && pred(a))
            .filter_map(|a| {
                let d = ground_distance(point, a.pos());
                (d <= max_radius).then_some((d, a.id()))
            })
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            })
            .map(|(_, id)| id)
    }

    /// A filtered view over this set's current members.
    #[must_use]
    pub fn view(&self, pred: impl Fn(&Actor) -> bool) -> SetView<'_> {
        SetView {
            set: self,
            ids: self
                .actors
                .values()
                .filter(|a| pred(a))
                .map(Actor::id)
                .collect(),
        }
    }

    /// A view of every member except one. The usual way an actor queries its
    /// neighbors without seeing itself.
    #[must_use]
    pub fn exclude(&self, id: ActorId) -> SetView<'_> {
        self.view(|a| a.id() != id)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Captures prop placements for a map save. Creatures are owned by their
    /// own spawn logic and zombies are already gone, so neither is recorded.
    #[must_use]
    pub fn save(&self) -> propbag::Bag {
        let mut bag = propbag::Bag::new();
        for actor in self.actors.values() {
            if actor.kind() != ActorKind::Prop || actor.is_zombie() {
                continue;
            }
            bag.add_bag("object", actor.save());
        }
        bag
    }

    /// Restores saved placements, registering a fresh actor per record. Ids
    /// are newly assigned; saved files never pin ids. Records whose template
    /// the factory no longer knows are skipped with a warning.
    ///
    /// # Errors
    /// [`propbag::BagError`] on a structurally bad record.
    pub fn load(&mut self, bag: &propbag::Bag, world: &World) -> Result<(), CoreError> {
        for i in 0..bag.num_instances("object") {
            let record = bag.bag_at("object", i)?;
            let template = record.text("template")?;
            let mut actor = match world.factory().create(template) {
                Ok(actor) => actor,
                Err(CoreError::UnknownKind(name)) => {
                    warn!(template = name, "skipping saved object of unknown kind");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let pos = Vec3::new(
                record.number("x")? as f32,
                record.number("y")? as f32,
                record.number("z")? as f32,
            );
            actor.transform.pos = pos;
            actor.transform.yaw = record.number("yaw")? as f32;
            actor.spawn_point = pos;
            self.register(actor);
        }
        Ok(())
    }
}

/// A borrowed, filtered slice of a set. Dropping ids from a view never
/// touches the underlying registry.
pub struct SetView<'a> {
    set: &'a ActorSet,
    ids: Vec<ActorId>,
}

impl SetView<'_> {
    /// Members of the view, in the order the view holds them.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.ids.iter().filter_map(|&id| self.set.get_opt(id))
    }

    /// True when the view still contains the id.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.ids.contains(&id)
    }

    /// Drops an id from the view only.
    pub fn remove(&mut self, id: ActorId) {
        self.ids.retain(|&other| other != id);
    }

    /// Number of ids in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The nearest view member to a point by ground-plane center distance.
    #[must_use]
    pub fn closest(&self, point: Vec3) -> Option<ActorId> {
        self.iter()
            .map(|a| (ground_distance(point, a.pos()), a.id()))
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            })
            .map(|(_, id)| id)
    }
}

fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(b.x - a.x, b.z - a.z).length()
}
