use engine::{Rect, Vec2};

use crate::actor::Actor;
use crate::components::{
    ApplyVelocityComponent, GravityComponent, PatrolLookComponent, PatrolMoveComponent,
    PatrolStatesComponent, PlayerLookComponent, PlayerMoveComponent, PlayerStatesComponent,
    SolidCollisionComponent,
};
use crate::config::Tuning;
use crate::controller::ActorController;

pub const PLAYER_TYPE: &str = "player";
pub const SPEARHEAD_TYPE: &str = "spearhead";

const PLAYER_SIZE: (f32, f32) = (20.0, 30.0);
const SPEARHEAD_SIZE: (f32, f32) = (24.0, 16.0);

/// Collision happens against the main tile layer for every archetype.
const COLLISION_LAYER: &str = "main";

/// The player: gravity, sprite look, the behavior FSM, state-driven
/// movement, tile collision, then the velocity commit. Component order is
/// load-bearing: the collision correction must land before the commit.
pub fn build_player(position: Vec2, tuning: &Tuning) -> Actor {
    Actor::new(Rect::new(position.x, position.y, PLAYER_SIZE.0, PLAYER_SIZE.1))
        .with_component(Box::new(GravityComponent::new(
            tuning.gravity,
            tuning.max_fall_speed,
        )))
        .with_component(Box::new(PlayerLookComponent::new()))
        .with_component(Box::new(PlayerStatesComponent::new(tuning)))
        .with_component(Box::new(PlayerMoveComponent::new(tuning)))
        .with_component(Box::new(SolidCollisionComponent::new(COLLISION_LAYER)))
        .with_component(Box::new(ApplyVelocityComponent::new()))
}

/// The ledge-walker enemy, same spine with the patrol behavior family.
pub fn build_spearhead(position: Vec2, tuning: &Tuning) -> Actor {
    Actor::new(Rect::new(
        position.x,
        position.y,
        SPEARHEAD_SIZE.0,
        SPEARHEAD_SIZE.1,
    ))
    .with_component(Box::new(GravityComponent::new(
        tuning.gravity,
        tuning.max_fall_speed,
    )))
    .with_component(Box::new(PatrolLookComponent::new()))
    .with_component(Box::new(PatrolStatesComponent::new(COLLISION_LAYER)))
    .with_component(Box::new(PatrolMoveComponent::new(tuning)))
    .with_component(Box::new(SolidCollisionComponent::new(COLLISION_LAYER)))
    .with_component(Box::new(ApplyVelocityComponent::new()))
}

pub fn register_default_actors(controller: &mut ActorController) {
    controller.register(PLAYER_TYPE, build_player);
    controller.register(SPEARHEAD_TYPE, build_spearhead);
}
