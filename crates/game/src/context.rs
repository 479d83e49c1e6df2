use engine::{Graphics, InputSnapshot, World};

/// Per-frame view of the shared collaborators, passed by reference into every
/// component update. Nothing here is ambient or global; tests build one from
/// fakes.
pub struct Context<'a> {
    pub world: &'a World,
    pub input: &'a InputSnapshot,
    pub graphics: &'a mut dyn Graphics,
}

impl<'a> Context<'a> {
    pub fn new(
        world: &'a World,
        input: &'a InputSnapshot,
        graphics: &'a mut dyn Graphics,
    ) -> Self {
        Self {
            world,
            input,
            graphics,
        }
    }
}
