pub mod actor;
pub mod actors;
pub mod components;
pub mod config;
pub mod context;
pub mod controller;
pub mod message;
pub mod session;
pub mod states;

pub use actor::{Actor, Component, ComponentError};
pub use actors::{build_player, build_spearhead, register_default_actors};
pub use config::{load_tuning, parse_tuning, Tuning};
pub use context::Context;
pub use controller::{ActorController, ActorId, BuildActor, ControllerError};
pub use message::{
    LookDirection, Message, PatrolStateTracker, PlayerStateTracker, Side, SideSet, StateHistory,
    VelocityTracker,
};
pub use session::{Session, SessionError};
pub use states::{PatrolState, PlayerState};
