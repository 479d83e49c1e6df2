use engine::Vec2;
use thiserror::Error;
use tracing::{debug, warn};

use crate::actor::Actor;
use crate::config::Tuning;
use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("unknown actor type '{type_tag}'")]
    UnknownActorType { type_tag: String },
    #[error("no live actor with id {0:?}")]
    UnknownActorId(ActorId),
}

pub type BuildActor = fn(Vec2, &Tuning) -> Actor;

#[derive(Debug, Default)]
struct ActorIdAllocator {
    next: u64,
}

impl ActorIdAllocator {
    fn allocate(&mut self) -> ActorId {
        let id = ActorId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Registry of live actors: spawn/kill lifecycle and the per-frame update
/// driver. Kills are queued and applied only once a full update pass has
/// finished, so iteration is never invalidated.
pub struct ActorController {
    builders: Vec<(&'static str, BuildActor)>,
    actors: Vec<(ActorId, Actor)>,
    pending_kills: Vec<ActorId>,
    allocator: ActorIdAllocator,
    tuning: Tuning,
}

impl ActorController {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            builders: Vec::new(),
            actors: Vec::new(),
            pending_kills: Vec::new(),
            allocator: ActorIdAllocator::default(),
            tuning,
        }
    }

    pub fn register(&mut self, type_tag: &'static str, builder: BuildActor) {
        self.builders.push((type_tag, builder));
    }

    pub fn spawn(&mut self, type_tag: &str, position: Vec2) -> Result<ActorId, ControllerError> {
        let builder = self
            .builders
            .iter()
            .find(|(tag, _)| *tag == type_tag)
            .map(|(_, builder)| *builder)
            .ok_or_else(|| ControllerError::UnknownActorType {
                type_tag: type_tag.to_string(),
            })?;
        let actor = builder(position, &self.tuning);
        let id = self.allocator.allocate();
        debug!(
            actor = type_tag,
            id = id.0,
            x = position.x,
            y = position.y,
            "actor_spawned"
        );
        self.actors.push((id, actor));
        Ok(id)
    }

    /// Queue removal; the actor stays live until the next update pass
    /// completes. Duplicate kills coalesce.
    pub fn kill(&mut self, id: ActorId) -> Result<(), ControllerError> {
        if !self.is_live(id) {
            return Err(ControllerError::UnknownActorId(id));
        }
        if !self.pending_kills.contains(&id) {
            self.pending_kills.push(id);
        }
        Ok(())
    }

    /// One simulation frame: update every live actor in insertion order, then
    /// apply queued removals. A failing actor is logged and skipped for this
    /// frame; the rest of the simulation carries on.
    pub fn update(&mut self, ctx: &mut Context<'_>) {
        for (id, actor) in &mut self.actors {
            if let Err(error) = actor.update(ctx) {
                warn!(id = id.0, error = %error, "actor_frame_failed");
            }
        }
        self.apply_pending_kills();
    }

    fn apply_pending_kills(&mut self) {
        if self.pending_kills.is_empty() {
            return;
        }
        self.pending_kills.sort();
        self.pending_kills.dedup();
        let pending = &self.pending_kills;
        self.actors.retain(|(id, _)| pending.binary_search(id).is_err());
        for id in pending {
            debug!(id = id.0, "actor_removed");
        }
        self.pending_kills.clear();
    }

    pub fn is_live(&self, id: ActorId) -> bool {
        self.actors.iter().any(|(actor_id, _)| *actor_id == id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn actor(&self, id: ActorId) -> Result<&Actor, ControllerError> {
        self.actors
            .iter()
            .find(|(actor_id, _)| *actor_id == id)
            .map(|(_, actor)| actor)
            .ok_or(ControllerError::UnknownActorId(id))
    }

    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.iter().map(|(id, _)| *id)
    }

    /// Broad-phase rect overlap of one actor against every other live actor.
    /// Actors queued for removal still count until the pass completes.
    pub fn get_colliding_actors(&self, id: ActorId) -> Result<Vec<ActorId>, ControllerError> {
        let rect = self.actor(id)?.rect();
        Ok(self
            .actors
            .iter()
            .filter(|(other_id, other)| *other_id != id && other.rect().intersects(&rect))
            .map(|(other_id, _)| *other_id)
            .collect())
    }
}
