use engine::{Graphics, InputState, KeyEdge, KeySet, MapData, World, WorldError};
use thiserror::Error;
use tracing::info;

use crate::actors::register_default_actors;
use crate::config::Tuning;
use crate::context::Context;
use crate::controller::{ActorController, ActorId, ControllerError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Owns the frame loop's moving parts: the world, the input ring and the
/// actor registry. One `step` call is one simulation frame; pacing is the
/// caller's business.
pub struct Session {
    world: World,
    input: InputState,
    controller: ActorController,
    graphics: Box<dyn Graphics>,
    frame: u64,
}

impl Session {
    pub fn new(world: World, tuning: Tuning, graphics: Box<dyn Graphics>) -> Self {
        let mut controller = ActorController::new(tuning);
        register_default_actors(&mut controller);
        Self {
            world,
            input: InputState::new(),
            controller,
            graphics,
            frame: 0,
        }
    }

    /// Build the world from loader output and spawn every map object. A
    /// spawn failure aborts construction: the frame loop never starts on a
    /// partial world.
    pub fn from_map(
        map: &MapData,
        tuning: Tuning,
        graphics: Box<dyn Graphics>,
    ) -> Result<Self, SessionError> {
        let world = World::from_map(map)?;
        let mut session = Self::new(world, tuning, graphics);
        for spawn in &map.spawns {
            session.controller.spawn(&spawn.name, spawn.position)?;
        }
        info!(
            actors = session.controller.actor_count(),
            layers = session.world.layer_count(),
            "session_loaded"
        );
        Ok(session)
    }

    pub fn spawn(&mut self, type_tag: &str, position: engine::Vec2) -> Result<ActorId, ControllerError> {
        self.controller.spawn(type_tag, position)
    }

    /// One simulation frame: fold the raw poll into the input ring, tick the
    /// tile animations, run the actor pass.
    pub fn step(&mut self, held: KeySet, edges: Vec<KeyEdge>) {
        let snapshot = self.input.advance(held, edges);
        self.world.update();
        let mut ctx = Context::new(&self.world, &snapshot, self.graphics.as_mut());
        self.controller.update(&mut ctx);
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn controller(&self) -> &ActorController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ActorController {
        &mut self.controller
    }
}
