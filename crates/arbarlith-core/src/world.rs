//! The world context: the actor factory and template catalogue.
//!
//! The registry never constructs actors itself; it asks the world's
//! [`ActorFactory`] to build them from a kind name or a data file. The
//! built-in [`TemplateFactory`] serves actors stamped from an in-memory
//! catalogue of [`ActorTemplate`]s, which themselves round-trip through
//! property bags so catalogues can live on disk.

use std::collections::BTreeMap;
use std::path::Path;

use propbag::Bag;

use crate::actor::{Actor, ActorKind, Health, MeleeAttack, Transform};
use crate::ai::{Mind, Style, Tuning};
use crate::error::CoreError;
use crate::spell::{Polarity, Spell};

/// Builds and reclaims actors on behalf of the registry.
pub trait ActorFactory {
    /// Builds a fresh actor of the named kind.
    ///
    /// # Errors
    /// [`CoreError::UnknownKind`] when the name matches nothing.
    fn create(&self, kind_name: &str) -> Result<Actor, CoreError>;

    /// Builds an actor from a data file path. The default maps the file stem
    /// to a kind name, so `data/monsters/grue.xml` builds a `grue`.
    ///
    /// # Errors
    /// [`CoreError::LoadFailed`] on an unusable path, otherwise whatever
    /// [`ActorFactory::create`] returns.
    fn load(&self, data_file: &Path) -> Result<Actor, CoreError> {
        let stem = data_file
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CoreError::LoadFailed {
                path: data_file.display().to_string(),
                reason: "path has no usable file stem".into(),
            })?;
        self.create(stem)
    }

    /// Takes back an actor removed from the registry. The default drops it.
    fn reclaim(&self, _actor: Actor) {}
}

// ============================================================================
// Templates
// ============================================================================

/// A reusable actor blueprint.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorTemplate {
    /// Classification of actors stamped from this template.
    pub kind: ActorKind,
    /// Collision-cylinder radius.
    pub radius: f32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Ground speed in meters per second.
    pub speed: f32,
    /// True to exclude from collision.
    pub ghost: bool,
    /// Melee capability.
    pub melee: Option<MeleeAttack>,
    /// Mind style and tuning for AI-driven creatures.
    pub mind: Option<(Style, Tuning)>,
    /// Castable spell.
    pub spell: Option<Spell>,
}

impl ActorTemplate {
    /// A minimal template of the given kind.
    #[must_use]
    pub fn of_kind(kind: ActorKind) -> Self {
        Self {
            kind,
            radius: 0.5,
            max_hp: 30,
            speed: 2.0,
            ghost: false,
            melee: None,
            mind: None,
            spell: None,
        }
    }

    /// Stamps out an actor named after the template.
    #[must_use]
    pub fn instantiate(&self, template_name: &str) -> Actor {
        let mut actor = Actor::new(self.kind, template_name);
        actor.transform = Transform::at(glam::Vec3::ZERO, self.radius);
        actor.health = Health::full(self.max_hp);
        actor.speed_mps = self.speed;
        if self.ghost {
            actor.flags.insert(crate::actor::ActorFlags::GHOST);
        }
        actor.melee = self.melee;
        actor.spell = self.spell.clone();
        if let Some((style, tuning)) = self.mind {
            actor.set_mind(Mind::new(style, tuning));
        }
        actor
    }

    /// Serializes the template into a property bag.
    #[must_use]
    pub fn to_bag(&self) -> Bag {
        let mut bag = Bag::new();
        let kind = match self.kind {
            ActorKind::Player => "player",
            ActorKind::Monster => "monster",
            ActorKind::Prop => "prop",
        };
        bag.add_text("kind", kind);
        bag.add_number("radius", f64::from(self.radius));
        bag.add_number("maxHp", f64::from(self.max_hp));
        bag.add_number("speed", f64::from(self.speed));
        bag.add_flag("ghost", self.ghost);
        if let Some(melee) = &self.melee {
            let mut sub = Bag::new();
            sub.add_number("damage", f64::from(melee.damage));
            sub.add_number("cooldown", f64::from(melee.cooldown_s));
            bag.add_bag("melee", sub);
        }
        if let Some((style, tuning)) = &self.mind {
            let mut sub = Bag::new();
            sub.add_text(
                "style",
                match style {
                    Style::Melee => "melee",
                    Style::Caster => "caster",
                },
            );
            sub.add_number("gainRadius", f64::from(tuning.gain_radius));
            sub.add_number("loseRadius", f64::from(tuning.lose_radius));
            sub.add_number("wanderRadius", f64::from(tuning.wander_radius));
            sub.add_number("pause", f64::from(tuning.pause_s));
            sub.add_number("fleeMin", f64::from(tuning.flee_fraction_min));
            sub.add_number("fleeMax", f64::from(tuning.flee_fraction_max));
            sub.add_number("castRange", f64::from(tuning.cast_range));
            bag.add_bag("mind", sub);
        }
        if let Some(spell) = &self.spell {
            let mut sub = Bag::new();
            sub.add_text(
                "polarity",
                match spell.polarity {
                    Polarity::Damage => "damage",
                    Polarity::Heal => "heal",
                },
            );
            sub.add_number("power", f64::from(spell.power));
            sub.add_number("radius", f64::from(spell.radius));
            sub.add_number("castTime", f64::from(spell.cast_time));
            sub.add_number("cooldown", f64::from(spell.cooldown));
            bag.add_bag("spell", sub);
        }
        bag
    }

    /// Reads a template back out of a property bag.
    ///
    /// # Errors
    /// [`propbag::BagError`] when a required key is missing or mistyped;
    /// [`CoreError::LoadFailed`] on an unrecognized kind, style or polarity.
    pub fn from_bag(bag: &Bag) -> Result<Self, CoreError> {
        let kind = match bag.text("kind")? {
            "player" => ActorKind::Player,
            "monster" => ActorKind::Monster,
            "prop" => ActorKind::Prop,
            other => {
                return Err(CoreError::LoadFailed {
                    path: String::new(),
                    reason: format!("unrecognized kind {other:?}"),
                })
            }
        };
        let mut template = Self::of_kind(kind);
        template.radius = bag.number("radius")? as f32;
        template.max_hp = bag.number("maxHp")? as i32;
        template.speed = bag.number("speed")? as f32;
        template.ghost = bag.flag("ghost")?;
        if let Ok(sub) = bag.bag("melee") {
            template.melee = Some(MeleeAttack::new(
                sub.number("damage")? as i32,
                sub.number("cooldown")? as f32,
            ));
        }
        if let Ok(sub) = bag.bag("mind") {
            let style = match sub.text("style")? {
                "melee" => Style::Melee,
                "caster" => Style::Caster,
                other => {
                    return Err(CoreError::LoadFailed {
                        path: String::new(),
                        reason: format!("unrecognized mind style {other:?}"),
                    })
                }
            };
            let tuning = Tuning {
                gain_radius: sub.number("gainRadius")? as f32,
                lose_radius: sub.number("loseRadius")? as f32,
                wander_radius: sub.number("wanderRadius")? as f32,
                pause_s: sub.number("pause")? as f32,
                flee_fraction_min: sub.number("fleeMin")? as f32,
                flee_fraction_max: sub.number("fleeMax")? as f32,
                cast_range: sub.number("castRange")? as f32,
            };
            template.mind = Some((style, tuning));
        }
        if let Ok(sub) = bag.bag("spell") {
            let polarity = match sub.text("polarity")? {
                "damage" => Polarity::Damage,
                "heal" => Polarity::Heal,
                other => {
                    return Err(CoreError::LoadFailed {
                        path: String::new(),
                        reason: format!("unrecognized spell polarity {other:?}"),
                    })
                }
            };
            template.spell = Some(Spell::new(
                polarity,
                sub.number("power")? as i32,
                sub.number("radius")? as f32,
                sub.number("castTime")? as f32,
                sub.number("cooldown")? as f32,
            ));
        }
        Ok(template)
    }
}

/// A factory backed by a catalogue of named templates.
#[derive(Default)]
pub struct TemplateFactory {
    templates: BTreeMap<String, ActorTemplate>,
}

impl TemplateFactory {
    /// An empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a named template.
    pub fn register(&mut self, name: impl Into<String>, template: ActorTemplate) {
        self.templates.insert(name.into(), template);
    }

    /// Looks up a template by name.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&ActorTemplate> {
        self.templates.get(name)
    }
}

impl ActorFactory for TemplateFactory {
    fn create(&self, kind_name: &str) -> Result<Actor, CoreError> {
        self.templates
            .get(kind_name)
            .map(|template| template.instantiate(kind_name))
            .ok_or_else(|| CoreError::UnknownKind(kind_name.to_string()))
    }
}

// ============================================================================
// World
// ============================================================================

/// Everything outside the registry that the simulation needs: for now, the
/// factory that builds actors.
pub struct World {
    factory: Box<dyn ActorFactory>,
}

impl World {
    /// Wraps a factory.
    #[must_use]
    pub fn new(factory: Box<dyn ActorFactory>) -> Self {
        Self { factory }
    }

    /// The actor factory.
    #[must_use]
    pub fn factory(&self) -> &dyn ActorFactory {
        self.factory.as_ref()
    }
}
