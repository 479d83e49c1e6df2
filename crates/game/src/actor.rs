use engine::{AnimationError, Rect, WorldError};
use thiserror::Error;

use crate::context::Context;
use crate::message::Message;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Animation(#[from] AnimationError),
    #[error("no animation registered for key '{key}'")]
    MissingAnimation { key: &'static str },
}

/// One behavior unit owned by exactly one actor. Components keep all their
/// state private and coordinate only through the message broadcast.
pub trait Component {
    fn update(&mut self, actor: &mut Actor, ctx: &mut Context<'_>) -> Result<(), ComponentError>;

    fn receive_message(&mut self, _message: &Message) {}
}

type PostUpdateFn = fn(&mut Actor, &mut Context<'_>);

/// Bounding box plus an ordered component list. The box size is fixed at
/// construction; only the position mutates during simulation.
pub struct Actor {
    rect: Rect,
    /// Slots so the updating component can be lifted out, guaranteeing a
    /// broadcast never reaches its sender.
    components: Vec<Option<Box<dyn Component>>>,
    post_update: Option<PostUpdateFn>,
}

impl Actor {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            components: Vec::new(),
            post_update: None,
        }
    }

    pub fn with_component(mut self, component: Box<dyn Component>) -> Self {
        self.components.push(Some(component));
        self
    }

    pub fn with_post_update(mut self, hook: PostUpdateFn) -> Self {
        self.post_update = Some(hook);
        self
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// One frame: every component in declared order, then the post-update
    /// hook. A failing component aborts this actor's frame; the caller
    /// decides what to do with the error.
    pub fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        for index in 0..self.components.len() {
            let Some(mut component) = self.components[index].take() else {
                continue;
            };
            let result = component.update(self, ctx);
            self.components[index] = Some(component);
            result?;
        }
        if let Some(hook) = self.post_update {
            hook(self, ctx);
        }
        Ok(())
    }

    /// Deliver to every component except the one currently updating (its slot
    /// is empty while it runs). Synchronous: not-yet-updated components see
    /// the message within the same pass.
    pub fn send_message(&mut self, message: &Message) {
        for slot in &mut self.components {
            if let Some(component) = slot {
                component.receive_message(message);
            }
        }
    }
}
