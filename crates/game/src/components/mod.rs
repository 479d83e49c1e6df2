pub mod general;
pub mod patrol;
pub mod player;

pub use general::{
    ApplyVelocityComponent, GravityComponent, SolidCollisionComponent, BLOCKING_GROUPS,
};
pub use patrol::{PatrolLookComponent, PatrolMoveComponent, PatrolStatesComponent};
pub use player::{PlayerLookComponent, PlayerMoveComponent, PlayerStatesComponent};
