//! Shared fixtures: a template catalogue and world builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec3;

use crate::actor::{Actor, ActorId, ActorKind, MeleeAttack};
use crate::ai::{Style, Tuning};
use crate::error::CoreError;
use crate::set::ActorSet;
use crate::spell::{Polarity, Spell};
use crate::world::{ActorFactory, ActorTemplate, TemplateFactory, World};

/// Installs a test-writer subscriber so failing scenarios show their mind
/// transitions. Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Tight tuning so scenarios resolve in a handful of 0.1 s frames.
pub fn test_tuning() -> Tuning {
    Tuning {
        gain_radius: 4.0,
        lose_radius: 6.0,
        wander_radius: 5.0,
        pause_s: 0.15,
        flee_fraction_min: 0.05,
        flee_fraction_max: 0.20,
        cast_range: 5.0,
    }
}

/// The standard test catalogue.
pub fn catalogue() -> TemplateFactory {
    let mut factory = TemplateFactory::new();

    let mut hero = ActorTemplate::of_kind(ActorKind::Player);
    hero.max_hp = 100;
    hero.speed = 3.0;
    hero.melee = Some(MeleeAttack::new(10, 0.5));
    factory.register("hero", hero);

    let mut grue = ActorTemplate::of_kind(ActorKind::Monster);
    grue.max_hp = 30;
    grue.melee = Some(MeleeAttack::new(5, 1.0));
    grue.mind = Some((Style::Melee, test_tuning()));
    factory.register("grue", grue);

    // Like a grue but with a fixed flee threshold at half health.
    let mut craven = ActorTemplate::of_kind(ActorKind::Monster);
    craven.max_hp = 30;
    craven.melee = Some(MeleeAttack::new(5, 1.0));
    craven.mind = Some((
        Style::Melee,
        Tuning {
            flee_fraction_min: 0.5,
            flee_fraction_max: 0.5,
            ..test_tuning()
        },
    ));
    factory.register("craven", craven);

    let mut warlock = ActorTemplate::of_kind(ActorKind::Monster);
    warlock.max_hp = 30;
    warlock.mind = Some((Style::Caster, test_tuning()));
    warlock.spell = Some(Spell::new(Polarity::Damage, 8, 6.0, 0.3, 5.0));
    factory.register("warlock", warlock);

    // A mindless creature for scripted-order scenarios.
    let mut golem = ActorTemplate::of_kind(ActorKind::Monster);
    golem.max_hp = 50;
    golem.melee = Some(MeleeAttack::new(6, 1.0));
    factory.register("golem", golem);

    factory.register("crate", ActorTemplate::of_kind(ActorKind::Prop));

    let mut wisp = ActorTemplate::of_kind(ActorKind::Prop);
    wisp.ghost = true;
    factory.register("wisp", wisp);

    factory
}

/// A world over the standard catalogue.
pub fn test_world() -> World {
    World::new(Box::new(catalogue()))
}

struct CountingFactory {
    inner: TemplateFactory,
    reclaimed: Arc<AtomicUsize>,
}

impl ActorFactory for CountingFactory {
    fn create(&self, kind_name: &str) -> Result<Actor, CoreError> {
        self.inner.create(kind_name)
    }

    fn reclaim(&self, _actor: Actor) {
        self.reclaimed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A world whose factory counts every reclaimed actor.
pub fn counting_world() -> (World, Arc<AtomicUsize>) {
    let reclaimed = Arc::new(AtomicUsize::new(0));
    let world = World::new(Box::new(CountingFactory {
        inner: catalogue(),
        reclaimed: Arc::clone(&reclaimed),
    }));
    (world, reclaimed)
}

/// Creates a catalogue actor and places it.
pub fn create_at(set: &mut ActorSet, world: &World, name: &str, pos: Vec3) -> ActorId {
    let id = set.create(name, world).unwrap();
    let actor = set.get_mut(id).unwrap();
    actor.transform.pos = pos;
    actor.spawn_point = pos;
    id
}
