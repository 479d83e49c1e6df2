use std::collections::HashMap;

use engine::{Animation, MaterialGroup, Rect, Vec2};

use crate::actor::{Actor, Component, ComponentError};
use crate::components::general::BLOCKING_GROUPS;
use crate::config::Tuning;
use crate::context::Context;
use crate::message::{LookDirection, Message, PatrolStateTracker, Side, StateHistory, VelocityTracker};
use crate::states::PatrolState;

const SHEET_PATROL_WALK: u16 = 16;
const SHEET_PATROL_TURN: u16 = 17;
const PATROL_FRAME_SIZE: (u32, u32) = (24, 16);

/// Sensor boxes hang one step past the actor's bottom corners and "feel" for
/// ground ahead.
const SENSOR_SIZE: f32 = 10.0;

/// Walks along a platform, turning at cliff edges and side collisions, and
/// standing while airborne.
pub struct PatrolStatesComponent {
    tracker: PatrolStateTracker,
    history: StateHistory<PatrolState>,
    layer_name: &'static str,
    blocking: Vec<MaterialGroup>,
}

impl PatrolStatesComponent {
    pub fn new(layer_name: &'static str) -> Self {
        Self {
            tracker: PatrolStateTracker::default(),
            history: StateHistory::new(PatrolState::Move),
            layer_name,
            blocking: BLOCKING_GROUPS.to_vec(),
        }
    }

    pub fn state(&self) -> PatrolState {
        self.tracker.state
    }

    pub fn look_direction(&self) -> LookDirection {
        self.tracker.look_direction
    }

    fn leading_sensor(&self, rect: Rect) -> Rect {
        match self.tracker.look_direction {
            LookDirection::Right => {
                Rect::new(rect.right(), rect.bottom(), SENSOR_SIZE, SENSOR_SIZE)
            }
            LookDirection::Left => Rect::new(
                rect.left() - SENSOR_SIZE,
                rect.bottom(),
                SENSOR_SIZE,
                SENSOR_SIZE,
            ),
        }
    }
}

impl Component for PatrolStatesComponent {
    fn update(&mut self, actor: &mut Actor, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let sides = self.tracker.colliding_sides;
        let mut state = self.tracker.state;

        match state {
            PatrolState::Move => {
                let layer = ctx.world.layer_id(self.layer_name)?;
                let sensor = self.leading_sensor(actor.rect());
                let ground_ahead = ctx
                    .world
                    .colliding_rect(layer, &self.blocking, sensor)?
                    .is_some();
                if !ground_ahead {
                    state = PatrolState::Turn;
                }
                if sides.contains(Side::Left) || sides.contains(Side::Right) {
                    state = PatrolState::Turn;
                } else if !sides.contains(Side::Bottom) {
                    state = PatrolState::Stay;
                }
            }
            PatrolState::Stay => {
                if sides.contains(Side::Bottom) {
                    state = PatrolState::Move;
                }
            }
            PatrolState::Turn => {
                // Finished by the look component at the end of the turn
                // animation.
            }
        }

        self.tracker.state = state;
        self.history.push(state);
        actor.send_message(&Message::PatrolState(state));
        actor.send_message(&Message::PatrolHistory(self.history));
        actor.send_message(&Message::PatrolLook(self.tracker.look_direction));
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.tracker.observe(message);
    }
}

/// Velocity from the patrol state: walk in the look direction, hold still
/// while standing or turning.
pub struct PatrolMoveComponent {
    tracker: PatrolStateTracker,
    velocity: VelocityTracker,
    walk_speed: f32,
}

impl PatrolMoveComponent {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tracker: PatrolStateTracker::default(),
            velocity: VelocityTracker::default(),
            walk_speed: tuning.patrol_speed,
        }
    }
}

impl Component for PatrolMoveComponent {
    fn update(&mut self, actor: &mut Actor, _ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let mut velocity = self.velocity.velocity;
        match self.tracker.state {
            PatrolState::Move => {
                velocity.x = match self.tracker.look_direction {
                    LookDirection::Right => self.walk_speed,
                    LookDirection::Left => -self.walk_speed,
                };
            }
            PatrolState::Stay | PatrolState::Turn => {
                velocity.x = 0.0;
            }
        }
        self.velocity.velocity = velocity;
        actor.send_message(&Message::Velocity(velocity));
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.tracker.observe(message);
        self.velocity.observe(message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PatrolAnim {
    Walk,
    Stand,
    Turn,
}

impl PatrolAnim {
    fn label(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Stand => "stand",
            Self::Turn => "turn",
        }
    }
}

/// Walk/stand/turn sprites; completes the turn by flipping the look
/// direction at the turn animation's last frame and resuming the walk.
pub struct PatrolLookComponent {
    tracker: PatrolStateTracker,
    animations: HashMap<(PatrolAnim, LookDirection), Animation>,
    current: (PatrolAnim, LookDirection),
}

impl PatrolLookComponent {
    pub fn new() -> Self {
        let mut animations = HashMap::new();

        let walk_frames = engine::sheet_frames(SHEET_PATROL_WALK, 3);
        let walk = Animation::sequenced(
            walk_frames.clone(),
            PATROL_FRAME_SIZE,
            &[(2, 15), (0, 15), (1, 15), (0, 15)],
        )
        .expect("patrol walk animation table is valid");
        animations.insert((PatrolAnim::Walk, LookDirection::Left), walk.flipped_horizontally());
        animations.insert((PatrolAnim::Walk, LookDirection::Right), walk);

        let stand = Animation::sequenced(walk_frames, PATROL_FRAME_SIZE, &[(0, 600)])
            .expect("patrol stand animation table is valid");
        animations.insert(
            (PatrolAnim::Stand, LookDirection::Left),
            stand.flipped_horizontally(),
        );
        animations.insert((PatrolAnim::Stand, LookDirection::Right), stand);

        let turn = Animation::sequenced(
            engine::sheet_frames(SHEET_PATROL_TURN, 6),
            PATROL_FRAME_SIZE,
            &[
                (0, 8),
                (1, 4),
                (0, 8),
                (1, 4),
                (0, 15),
                (1, 2),
                (0, 8),
                (2, 8),
                (3, 8),
                (4, 8),
                (5, 30),
                (5, 1),
            ],
        )
        .expect("patrol turn animation table is valid");
        animations.insert((PatrolAnim::Turn, LookDirection::Right), turn.flipped_horizontally());
        animations.insert((PatrolAnim::Turn, LookDirection::Left), turn);

        Self {
            tracker: PatrolStateTracker::default(),
            animations,
            current: (PatrolAnim::Stand, LookDirection::Right),
        }
    }

    fn play(
        &mut self,
        animation: PatrolAnim,
        direction: LookDirection,
    ) -> Result<(), ComponentError> {
        let key = (animation, direction);
        if self.current != key {
            let entry = self
                .animations
                .get_mut(&key)
                .ok_or(ComponentError::MissingAnimation {
                    key: animation.label(),
                })?;
            entry.reset();
            self.current = key;
        }
        Ok(())
    }

    fn current_animation(&mut self) -> Result<&mut Animation, ComponentError> {
        let key = self.current;
        self.animations
            .get_mut(&key)
            .ok_or(ComponentError::MissingAnimation { key: key.0.label() })
    }
}

impl Default for PatrolLookComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for PatrolLookComponent {
    fn update(&mut self, actor: &mut Actor, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let look = self.tracker.look_direction;
        match self.tracker.state {
            PatrolState::Move => self.play(PatrolAnim::Walk, look)?,
            PatrolState::Stay => self.play(PatrolAnim::Stand, look)?,
            PatrolState::Turn => {
                // The turn plays toward the side being turned away from.
                self.play(PatrolAnim::Turn, look.opposite())?;
                let finished = {
                    let animation = self.current_animation()?;
                    animation.current_frame_index() + 1 == animation.sequence_len()
                };
                if finished {
                    let flipped = look.opposite();
                    self.tracker.look_direction = flipped;
                    self.tracker.state = PatrolState::Move;
                    self.play(PatrolAnim::Walk, flipped)?;
                }
            }
        }

        let rect = actor.rect();
        let animation = self.current_animation()?;
        animation.update();
        let (width, height) = animation.frame_size();
        let sprite = animation.current_frame();
        // Bottom edge aligned, anchored to the leading corner.
        let position = match self.tracker.look_direction {
            LookDirection::Right => Vec2::new(rect.left(), rect.bottom() - height as f32),
            LookDirection::Left => Vec2::new(rect.right() - width as f32, rect.bottom() - height as f32),
        };
        ctx.graphics.blit(sprite, position);

        actor.send_message(&Message::PatrolState(self.tracker.state));
        actor.send_message(&Message::PatrolLook(self.tracker.look_direction));
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.tracker.observe(message);
    }
}
