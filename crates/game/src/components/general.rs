use engine::{MaterialGroup, Rect, Vec2};

use crate::actor::{Actor, Component, ComponentError};
use crate::context::Context;
use crate::message::{Message, Side, SideSet, VelocityTracker};

/// Default blocking set: everything an actor cannot pass through.
pub const BLOCKING_GROUPS: [MaterialGroup; 5] = [
    MaterialGroup::Solid,
    MaterialGroup::SoftBreak,
    MaterialGroup::HardBreak,
    MaterialGroup::ShotBreak,
    MaterialGroup::FireBreak,
];

/// Accelerates the actor downward until the configured fall cap. The cap is
/// one-sided: it stops further acceleration but leaves an externally larger
/// velocity alone.
pub struct GravityComponent {
    velocity: VelocityTracker,
    g: f32,
    max_fall_speed: f32,
}

impl GravityComponent {
    pub fn new(g: f32, max_fall_speed: f32) -> Self {
        Self {
            velocity: VelocityTracker::default(),
            g,
            max_fall_speed,
        }
    }
}

impl Component for GravityComponent {
    fn update(&mut self, actor: &mut Actor, _ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        if self.velocity.velocity.y <= self.max_fall_speed {
            self.velocity.velocity.y += self.g;
            actor.send_message(&Message::Velocity(self.velocity.velocity));
        }
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.velocity.observe(message);
    }
}

/// Commits the broadcast velocity to the actor's rect. The rect only ever
/// moves by whole units per frame; the fractional part accumulates in a
/// private remainder per axis and carries a whole unit once its magnitude
/// reaches one, so a constant 1.5 units/frame steps 1,2,1,2,...
pub struct ApplyVelocityComponent {
    velocity: VelocityTracker,
    remainder: Vec2,
}

impl ApplyVelocityComponent {
    pub fn new() -> Self {
        Self {
            velocity: VelocityTracker::default(),
            remainder: Vec2::ZERO,
        }
    }

    fn step_axis(remainder: &mut f32, velocity: f32) -> f32 {
        let mut step = velocity.trunc();
        *remainder += velocity - step;
        if remainder.abs() >= 1.0 {
            let carry = remainder.signum();
            step += carry;
            *remainder -= carry;
        }
        step
    }
}

impl Default for ApplyVelocityComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ApplyVelocityComponent {
    fn update(&mut self, actor: &mut Actor, _ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let step = Vec2::new(
            Self::step_axis(&mut self.remainder.x, self.velocity.velocity.x),
            Self::step_axis(&mut self.remainder.y, self.velocity.velocity.y),
        );
        actor.rect_mut().shift(step);
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.velocity.observe(message);
    }
}

/// Resolves tile contacts for the actor's swept box: classifies which side
/// each overlapping blocking tile touches, suppresses interior ghost faces,
/// zeroes the blocked velocity axes and broadcasts the corrected velocity
/// plus the colliding-side set.
pub struct SolidCollisionComponent {
    velocity: VelocityTracker,
    layer_name: &'static str,
    blocking: Vec<MaterialGroup>,
    debug_draw: bool,
}

impl SolidCollisionComponent {
    pub fn new(layer_name: &'static str) -> Self {
        Self {
            velocity: VelocityTracker::default(),
            layer_name,
            blocking: BLOCKING_GROUPS.to_vec(),
            debug_draw: false,
        }
    }

    pub fn with_blocking(mut self, blocking: Vec<MaterialGroup>) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn with_debug_draw(mut self, debug_draw: bool) -> Self {
        self.debug_draw = debug_draw;
        self
    }

    /// Vector from the tile corner facing against the travel direction to the
    /// swept box's leading corner. Its slope against the velocity's slope
    /// decides wall-versus-floor for diagonal sweeps.
    fn collision_vector(tile: Rect, swept: Rect, velocity: Vec2) -> Vec2 {
        let sign = |value: f32| if value >= 0.0 { 1.0 } else { -1.0 };
        let tile_corner = Vec2::new(
            tile.center().x - tile.w / 2.0 * sign(velocity.x),
            tile.center().y - tile.h / 2.0 * sign(velocity.y),
        );
        let leading_corner = Vec2::new(
            swept.center().x + swept.w / 2.0 * sign(velocity.x),
            swept.center().y + swept.h / 2.0 * sign(velocity.y),
        );
        Vec2::new(
            leading_corner.x - tile_corner.x,
            leading_corner.y - tile_corner.y,
        )
    }

    fn classify_side(velocity: Vec2, tile: Rect, swept: Rect) -> Side {
        if velocity.x == 0.0 {
            return if velocity.y > 0.0 { Side::Bottom } else { Side::Top };
        }
        if velocity.y == 0.0 {
            return if velocity.x > 0.0 { Side::Right } else { Side::Left };
        }
        // Both axes nonzero from here on; the ratios cannot divide by a zero
        // velocity component.
        debug_assert!(velocity.x != 0.0 && velocity.y != 0.0);
        let collision_vector = Self::collision_vector(tile, swept, velocity);
        let velocity_ratio = (velocity.x / velocity.y).abs();
        let contact_ratio = (collision_vector.x / collision_vector.y).abs();
        if velocity_ratio > contact_ratio {
            if velocity.x > 0.0 {
                Side::Right
            } else {
                Side::Left
            }
        } else if velocity.y > 0.0 {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    /// Offset of the cell adjacent to the contacted face, on the actor's
    /// side. A face covered by another blocking tile is interior and cannot
    /// be the first point of contact.
    fn face_neighbor_offset(side: Side) -> (i32, i32) {
        match side {
            Side::Top => (0, 1),
            Side::Bottom => (0, -1),
            Side::Right => (-1, 0),
            Side::Left => (1, 0),
        }
    }
}

impl Component for SolidCollisionComponent {
    fn update(&mut self, actor: &mut Actor, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        // Pre-clear so downstream components default to "not colliding"
        // unless this pass finds contacts.
        let mut sides = SideSet::empty();
        actor.send_message(&Message::CollidingSides(sides));

        let velocity = self.velocity.velocity;
        if velocity == Vec2::ZERO {
            actor.send_message(&Message::Velocity(velocity));
            return Ok(());
        }

        let layer = ctx.world.layer_id(self.layer_name)?;
        let swept = actor.rect().translated(velocity);
        let overlaps = ctx.world.colliding_rects(layer, &self.blocking, swept)?;

        let mut multiplier = Vec2::new(1.0, 1.0);
        for tile in overlaps {
            let side = Self::classify_side(velocity, tile, swept);
            if self.debug_draw {
                ctx.graphics
                    .draw_rect(tile, engine::Color::rgb(43, 192, 225), 2);
            }
            let neighbor =
                ctx.world
                    .tile_relative_to(layer, tile, Self::face_neighbor_offset(side))?;
            if self.blocking.contains(&neighbor.material_group) {
                continue;
            }
            match side {
                Side::Top | Side::Bottom => multiplier.y = 0.0,
                Side::Left | Side::Right => multiplier.x = 0.0,
            }
            sides.insert(side);
        }

        self.velocity.velocity = Vec2::new(velocity.x * multiplier.x, velocity.y * multiplier.y);
        actor.send_message(&Message::Velocity(self.velocity.velocity));
        actor.send_message(&Message::CollidingSides(sides));
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.velocity.observe(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{
        sheet_frames, Animation, InputSnapshot, LayerId, NullGraphics, TileTemplate,
        TileTemplateId, World,
    };

    fn solid_template() -> TileTemplate {
        TileTemplate::new(
            MaterialGroup::Solid,
            Animation::uniform(sheet_frames(0, 1), (16, 16), 10),
        )
    }

    fn world_with_tiles(cells: &[(u32, u32)]) -> (World, LayerId) {
        let mut world = World::new((8, 8), (16, 16), vec![solid_template()]);
        let main = world.add_layer("main");
        for (col, row) in cells {
            world
                .create_tile(
                    main,
                    Vec2::new((col * 16) as f32, (row * 16) as f32),
                    TileTemplateId(0),
                )
                .expect("tile placement");
        }
        (world, main)
    }

    fn run_collision(
        world: &World,
        actor_rect: Rect,
        velocity: Vec2,
    ) -> (Vec2, SideSet, Vec<Message>) {
        struct Recorder {
            log: std::rc::Rc<std::cell::RefCell<Vec<Message>>>,
        }
        impl Component for Recorder {
            fn update(
                &mut self,
                _actor: &mut Actor,
                _ctx: &mut Context<'_>,
            ) -> Result<(), ComponentError> {
                Ok(())
            }
            fn receive_message(&mut self, message: &Message) {
                self.log.borrow_mut().push(*message);
            }
        }

        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut component = SolidCollisionComponent::new("main");
        component.receive_message(&Message::Velocity(velocity));
        let mut actor = Actor::new(actor_rect).with_component(Box::new(Recorder {
            log: std::rc::Rc::clone(&log),
        }));

        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(world, &input, &mut graphics);
        component.update(&mut actor, &mut ctx).expect("update");

        let messages = log.borrow().clone();
        let mut final_velocity = velocity;
        let mut final_sides = SideSet::empty();
        for message in &messages {
            match message {
                Message::Velocity(value) => final_velocity = *value,
                Message::CollidingSides(value) => final_sides = *value,
                _ => {}
            }
        }
        (final_velocity, final_sides, messages)
    }

    #[test]
    fn falling_onto_a_lone_tile_blocks_bottom_only() {
        // One solid tile below the actor, nothing around it.
        let (world, _) = world_with_tiles(&[(2, 4)]);
        let actor_rect = Rect::new(32.0, 34.0, 16.0, 28.0); // bottom at 62, tile top at 64
        let (velocity, sides, _) = run_collision(&world, actor_rect, Vec2::new(0.0, 3.0));
        assert_eq!(velocity, Vec2::new(0.0, 0.0));
        assert!(sides.contains(Side::Bottom));
        assert!(!sides.contains(Side::Left));
        assert!(!sides.contains(Side::Right));
        assert!(!sides.contains(Side::Top));
    }

    #[test]
    fn horizontal_velocity_survives_a_floor_contact() {
        // Diagonal sweep onto a floor run: the slope comparison classifies
        // both overlaps as bottom contacts, so only the vertical axis zeroes.
        let (world, _) = world_with_tiles(&[(2, 4), (3, 4)]);
        let actor_rect = Rect::new(36.0, 34.0, 16.0, 28.0);
        let (velocity, sides, _) = run_collision(&world, actor_rect, Vec2::new(1.0, 3.0));
        assert_eq!(velocity, Vec2::new(1.0, 0.0));
        assert!(sides.contains(Side::Bottom));
        assert!(!sides.contains(Side::Right));
    }

    #[test]
    fn running_into_a_wall_blocks_horizontal_axis() {
        let (world, _) = world_with_tiles(&[(4, 2)]);
        let actor_rect = Rect::new(46.0, 32.0, 16.0, 16.0); // right edge at 62, wall left face at 64
        let (velocity, sides, _) = run_collision(&world, actor_rect, Vec2::new(3.0, 0.0));
        assert_eq!(velocity, Vec2::new(0.0, 0.0));
        assert!(sides.contains(Side::Right));
    }

    #[test]
    fn interior_face_under_a_floor_run_is_suppressed() {
        // Running right along a two-tile floor, sinking one unit under
        // gravity. The slope comparison calls the second tile a wall hit,
        // but its left face is covered by the first tile: the contact is a
        // ghost corner and must not block the horizontal axis.
        let (world, _) = world_with_tiles(&[(2, 4), (3, 4)]);
        let actor_rect = Rect::new(31.0, 36.0, 16.0, 28.0);
        let (velocity, sides, _) = run_collision(&world, actor_rect, Vec2::new(2.0, 1.0));
        assert!(sides.contains(Side::Bottom));
        assert!(!sides.contains(Side::Right));
        assert_eq!(velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn exposed_wall_face_is_not_suppressed() {
        // Same slope comparison, but the wall tile's left face is open:
        // the contact counts and the horizontal axis zeroes.
        let (world, _) = world_with_tiles(&[(4, 2)]);
        let actor_rect = Rect::new(46.0, 30.0, 16.0, 16.0);
        let (velocity, sides, _) = run_collision(&world, actor_rect, Vec2::new(3.0, 2.0));
        assert!(sides.contains(Side::Right));
        assert_eq!(velocity, Vec2::new(0.0, 2.0));
    }

    #[test]
    fn pre_clear_broadcast_precedes_the_final_side_set() {
        let (world, _) = world_with_tiles(&[(2, 4)]);
        let actor_rect = Rect::new(32.0, 34.0, 16.0, 28.0);
        let (_, _, messages) = run_collision(&world, actor_rect, Vec2::new(0.0, 3.0));
        let side_messages: Vec<&Message> = messages
            .iter()
            .filter(|message| matches!(message, Message::CollidingSides(_)))
            .collect();
        assert_eq!(side_messages.len(), 2);
        assert_eq!(
            *side_messages[0],
            Message::CollidingSides(SideSet::empty())
        );
    }

    #[test]
    fn missing_layer_fails_fast() {
        let world = World::new((4, 4), (16, 16), vec![solid_template()]);
        let mut component = SolidCollisionComponent::new("main");
        component.receive_message(&Message::Velocity(Vec2::new(0.0, 1.0)));
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 16.0, 16.0));
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let result = component.update(&mut actor, &mut ctx);
        assert!(matches!(result, Err(ComponentError::World(_))));
    }

    #[test]
    fn gravity_accumulates_then_stops_at_the_cap() {
        let mut gravity = GravityComponent::new(1.0, 2.0);
        let world = World::new((4, 4), (16, 16), Vec::new());
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 16.0, 16.0));

        for _ in 0..10 {
            gravity.update(&mut actor, &mut ctx).expect("update");
        }
        // 0 -> 1 -> 2 -> 3; at 3 the guard (3 <= 2) stops further adds.
        assert_eq!(gravity.velocity.velocity.y, 3.0);
    }

    #[test]
    fn gravity_clamp_is_one_sided() {
        let mut gravity = GravityComponent::new(1.0, 2.0);
        gravity.receive_message(&Message::Velocity(Vec2::new(0.0, 9.0)));
        let world = World::new((4, 4), (16, 16), Vec::new());
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 16.0, 16.0));
        gravity.update(&mut actor, &mut ctx).expect("update");
        // Externally set above the cap: left alone, never clamped down.
        assert_eq!(gravity.velocity.velocity.y, 9.0);
    }

    fn apply_frames(component: &mut ApplyVelocityComponent, velocity: Vec2, frames: u32) -> Rect {
        let world = World::new((4, 4), (16, 16), Vec::new());
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0));
        component.receive_message(&Message::Velocity(velocity));
        for _ in 0..frames {
            component.update(&mut actor, &mut ctx).expect("update");
        }
        actor.rect()
    }

    #[test]
    fn fractional_carry_alternates_whole_steps() {
        let world = World::new((4, 4), (16, 16), Vec::new());
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut component = ApplyVelocityComponent::new();
        component.receive_message(&Message::Velocity(Vec2::new(1.5, 0.0)));
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0));

        let mut steps = Vec::new();
        let mut last_x = 0.0;
        for _ in 0..6 {
            component.update(&mut actor, &mut ctx).expect("update");
            steps.push(actor.rect().x - last_x);
            last_x = actor.rect().x;
        }
        assert_eq!(steps, vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn long_run_displacement_converges_to_the_true_rate() {
        let mut component = ApplyVelocityComponent::new();
        let rect = apply_frames(&mut component, Vec2::new(1.5, 0.0), 1000);
        assert!((rect.x - 1500.0).abs() <= 1.0, "total was {}", rect.x);
    }

    #[test]
    fn negative_velocity_carries_toward_negative() {
        let mut component = ApplyVelocityComponent::new();
        let rect = apply_frames(&mut component, Vec2::new(-0.5, -1.25), 8);
        assert_eq!(rect.x, -4.0);
        assert_eq!(rect.y, -10.0);
    }

    #[test]
    fn rect_only_moves_by_whole_units() {
        let mut component = ApplyVelocityComponent::new();
        let rect = apply_frames(&mut component, Vec2::new(0.3, 0.7), 5);
        assert_eq!(rect.x.fract(), 0.0);
        assert_eq!(rect.y.fract(), 0.0);
        assert_eq!(rect.x, 1.0); // 1.5 accumulated -> one whole step
        assert_eq!(rect.y, 3.0); // 3.5 accumulated -> three whole steps
    }

    proptest::proptest! {
        #[test]
        fn average_step_converges_for_sub_unit_velocities(
            vx in -0.99f32..0.99,
            vy in -0.99f32..0.99,
        ) {
            let mut component = ApplyVelocityComponent::new();
            let frames = 1000u32;
            let rect = apply_frames(&mut component, Vec2::new(vx, vy), frames);
            let expected_x = vx * frames as f32;
            let expected_y = vy * frames as f32;
            proptest::prop_assert!((rect.x - expected_x).abs() <= 1.5);
            proptest::prop_assert!((rect.y - expected_y).abs() <= 1.5);
        }
    }
}
