use std::collections::HashMap;

use engine::{Animation, Color, Counter, Key, SpriteId, Vec2};

use crate::actor::{Actor, Component, ComponentError};
use crate::config::Tuning;
use crate::context::Context;
use crate::message::{
    LookDirection, Message, PlayerStateTracker, Side, StateHistory, VelocityTracker,
};
use crate::states::PlayerState;

const STATE_TEXT_POSITION: Vec2 = Vec2 { x: 20.0, y: 20.0 };
const STATE_TEXT_COLOR: Color = Color { r: 225, g: 0, b: 0 };

/// Sprite sheets the player animations index into. A renderer binds the ids
/// to actual images; the simulation never touches pixels.
const SHEET_STAND: u16 = 1;
const SHEET_WALK: u16 = 2;
const SHEET_JUMP: u16 = 3;
const SHEET_SLEEP_CYCLE: u16 = 4;
const SHEET_TURN: u16 = 5;
const SHEET_SOFTFIST: u16 = 6;

const STAND_FRAME_SIZE: (u32, u32) = (20, 29);
const WALK_FRAME_SIZE: (u32, u32) = (24, 29);
const SLEEP_FRAME_SIZE: (u32, u32) = (28, 30);
const TURN_FRAME_SIZE: (u32, u32) = (28, 29);

/// The gated state machine governing player behavior. Reads the input
/// snapshot and the collision sides broadcast last pass, decides the next
/// state, then broadcasts look direction, state and the rolling history.
pub struct PlayerStatesComponent {
    tracker: PlayerStateTracker,
    history: StateHistory<PlayerState>,
    sleep_counter: Counter,
    jump_counter: Counter,
    attack_counter: Counter,
    draw_state: bool,
}

impl PlayerStatesComponent {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tracker: PlayerStateTracker::default(),
            history: StateHistory::new(PlayerState::UprightStay),
            sleep_counter: Counter::new(tuning.sleep_delay_frames),
            jump_counter: Counter::new(tuning.jump_duration_frames),
            attack_counter: Counter::new(tuning.attack_duration_frames),
            draw_state: true,
        }
    }

    pub fn with_draw_state(mut self, draw_state: bool) -> Self {
        self.draw_state = draw_state;
        self
    }

    pub fn state(&self) -> PlayerState {
        self.tracker.state
    }

    pub fn look_direction(&self) -> LookDirection {
        self.tracker.look_direction
    }

    pub fn history(&self) -> &StateHistory<PlayerState> {
        &self.history
    }
}

impl Component for PlayerStatesComponent {
    fn update(&mut self, actor: &mut Actor, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        use PlayerState::*;

        let input = ctx.input;
        let sides = self.tracker.colliding_sides;
        // The history's last entry is the previous frame's final state; the
        // entry before it is what the actor was doing the frame before that.
        // State-entry edges are detected against that second-to-last entry,
        // because by the time a branch runs its own state is already the
        // last entry.
        let entered_from = self.history.previous();
        let mut state = self.tracker.state;
        let mut look = self.tracker.look_direction;

        let direction_held =
            input.is_smooth_held(Key::Right) || input.is_smooth_held(Key::Left);
        let grounded = sides.contains(Side::Bottom);

        match state {
            UprightStay => {
                if entered_from != UprightStay {
                    self.sleep_counter.reset();
                }
                if self.sleep_counter.update() {
                    state = GotoSleep;
                } else if direction_held {
                    state = UprightMove;
                }
                if input.any_key_down_edge() {
                    if input.is_smooth_held(Key::Down) {
                        state = CrouchStay;
                    } else if input.is_smooth_held(Key::A) {
                        state = JumpStay;
                    }
                }
                if !grounded {
                    state = FallStay;
                }
            }
            UprightMove => {
                if input.is_smooth_held(Key::Down) {
                    state = CrouchMove;
                } else if input.is_smooth_held(Key::A) {
                    state = JumpMove;
                }
                if !direction_held {
                    state = UprightStay;
                }
                if !grounded {
                    state = FallMove;
                }
            }
            CrouchStay => {
                if direction_held {
                    state = CrouchMove;
                } else if !input.is_smooth_held(Key::Down) {
                    state = UprightStay;
                }
                if !grounded {
                    state = FallStay;
                }
            }
            CrouchMove => {
                if !input.is_smooth_held(Key::Down) {
                    state = UprightMove;
                } else if !direction_held {
                    state = CrouchStay;
                }
                if !grounded {
                    state = FallMove;
                }
            }
            JumpStay => {
                if !input.is_smooth_held(Key::A) {
                    state = FallStay;
                } else if direction_held {
                    state = JumpMove;
                }
                if !entered_from.is_jump() {
                    self.jump_counter.reset();
                }
                if self.jump_counter.update() {
                    state = FallStay;
                }
            }
            JumpMove => {
                if !input.is_smooth_held(Key::A) {
                    state = FallMove;
                } else if !direction_held {
                    state = JumpStay;
                }
                if !entered_from.is_jump() {
                    self.jump_counter.reset();
                }
                if self.jump_counter.update() {
                    state = FallMove;
                }
            }
            FallStay => {
                if direction_held {
                    state = FallMove;
                }
                if grounded {
                    state = UprightStay;
                }
            }
            FallMove => {
                if !direction_held {
                    state = FallStay;
                }
                if grounded {
                    state = UprightMove;
                }
            }
            GotoSleep | WakeUp => {
                // Held until the look component reports the animation done.
            }
            Sleep => {
                if input.is_smooth_held(Key::Down)
                    || input.is_smooth_held(Key::Up)
                    || input.is_smooth_held(Key::Left)
                    || input.is_smooth_held(Key::Right)
                    || input.is_smooth_held(Key::A)
                    || input.is_smooth_held(Key::B)
                {
                    state = WakeUp;
                }
            }
            Turn => {
                // Exited by the look component when the turn animation ends.
            }
            SoftFistGround => {
                if !entered_from.is_attack() {
                    self.attack_counter.reset();
                }
                if self.attack_counter.update() {
                    state = UprightStay;
                }
                if !grounded {
                    state = SoftFistFall;
                }
                if sides.contains(look.blocked_side()) {
                    state = BumpBack;
                }
            }
            SoftFistJump => {
                if !entered_from.is_attack() {
                    self.attack_counter.reset();
                }
                if self.attack_counter.update() {
                    state = SoftFistFall;
                }
                if grounded {
                    state = SoftFistGround;
                }
                if sides.contains(look.blocked_side()) {
                    state = BumpBack;
                }
            }
            SoftFistFall => {
                if grounded {
                    state = UprightStay;
                }
                if sides.contains(look.blocked_side()) {
                    state = BumpBack;
                }
            }
            BumpBack => {
                if grounded {
                    state = UprightStay;
                }
            }
        }

        // Attack entry rides on the B-key edge, whatever branch ran above.
        if input
            .edges()
            .iter()
            .any(|edge| edge.pressed && edge.key == Key::B)
        {
            state = match state {
                UprightStay | UprightMove | Turn => SoftFistGround,
                JumpStay | JumpMove => SoftFistJump,
                FallStay | FallMove => SoftFistFall,
                other => other,
            };
        }

        // Look direction flips on an opposing key-down edge. Grounded and
        // upright it routes through Turn instead of flipping silently; the
        // flip then lands when the turn animation completes.
        for edge in input.edges() {
            if !edge.pressed {
                continue;
            }
            match edge.key {
                Key::Right => {
                    if matches!(state, UprightStay | UprightMove | Turn)
                        && look == LookDirection::Left
                    {
                        state = Turn;
                    } else {
                        look = LookDirection::Right;
                    }
                }
                Key::Left => {
                    if matches!(state, UprightStay | UprightMove | Turn)
                        && look == LookDirection::Right
                    {
                        state = Turn;
                    } else {
                        look = LookDirection::Left;
                    }
                }
                _ => {}
            }
        }

        self.tracker.state = state;
        self.tracker.look_direction = look;
        self.history.push(state);
        actor.send_message(&Message::PlayerLook(look));
        actor.send_message(&Message::PlayerState(state));
        actor.send_message(&Message::PlayerHistory(self.history));

        if self.draw_state {
            ctx.graphics
                .draw_text(state.label(), STATE_TEXT_POSITION, STATE_TEXT_COLOR);
        }
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.tracker.observe(message);
    }
}

/// Turns the broadcast state into a velocity: stay-family states hold still,
/// move-family states walk, jump states push upward, knockback pushes away
/// from the look direction with an upward pop on entry.
pub struct PlayerMoveComponent {
    tracker: PlayerStateTracker,
    velocity: VelocityTracker,
    history: StateHistory<PlayerState>,
    walk_speed: f32,
    jump_speed: f32,
    knockback_speed: f32,
}

impl PlayerMoveComponent {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tracker: PlayerStateTracker::default(),
            velocity: VelocityTracker::default(),
            history: StateHistory::new(PlayerState::UprightStay),
            walk_speed: tuning.walk_speed,
            jump_speed: tuning.jump_speed,
            knockback_speed: tuning.knockback_speed,
        }
    }
}

impl Component for PlayerMoveComponent {
    fn update(&mut self, actor: &mut Actor, _ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        use PlayerState::*;

        let mut velocity = self.velocity.velocity;
        match self.tracker.state {
            UprightStay | CrouchStay | JumpStay | FallStay | Turn | GotoSleep | Sleep | WakeUp
            | SoftFistGround | SoftFistJump | SoftFistFall => {
                velocity.x = 0.0;
            }
            UprightMove | CrouchMove | JumpMove | FallMove => {
                velocity.x = match self.tracker.look_direction {
                    LookDirection::Right => self.walk_speed,
                    LookDirection::Left => -self.walk_speed,
                };
            }
            BumpBack => {
                velocity.x = match self.tracker.look_direction {
                    LookDirection::Right => -self.knockback_speed,
                    LookDirection::Left => self.knockback_speed,
                };
                // Upward pop on the frame knockback starts.
                if self.history.last() == BumpBack && self.history.previous() != BumpBack {
                    velocity.y = -self.jump_speed;
                }
            }
        }
        if self.tracker.state.is_jump() {
            velocity.y = -self.jump_speed;
        }

        self.velocity.velocity = velocity;
        actor.send_message(&Message::Velocity(velocity));
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.tracker.observe(message);
        self.velocity.observe(message);
        if let Message::PlayerHistory(history) = message {
            self.history = *history;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AnimAction {
    Stand,
    Walk,
    Jump,
    GotoSleep,
    Sleep,
    WakeUp,
    Turn,
    SoftFist,
}

impl AnimAction {
    fn label(self) -> &'static str {
        match self {
            Self::Stand => "stand",
            Self::Walk => "walk",
            Self::Jump => "jump",
            Self::GotoSleep => "gotosleep",
            Self::Sleep => "sleep",
            Self::WakeUp => "wakeup",
            Self::Turn => "turn",
            Self::SoftFist => "softfist",
        }
    }
}

type AnimKey = (AnimAction, LookDirection);

/// Drives the sprite animation from the broadcast state and feeds
/// animation-complete conditions back into the FSM: lying down finishes into
/// Sleep, waking finishes into UprightStay, and the turn flips the look
/// direction at its final frame.
pub struct PlayerLookComponent {
    tracker: PlayerStateTracker,
    animations: HashMap<AnimKey, Animation>,
    current: AnimKey,
}

fn mirrored(animations: &mut HashMap<AnimKey, Animation>, action: AnimAction, right: Animation) {
    animations.insert((action, LookDirection::Left), right.flipped_horizontally());
    animations.insert((action, LookDirection::Right), right);
}

impl PlayerLookComponent {
    pub fn new() -> Self {
        let mut animations = HashMap::new();

        let stand = Animation::sequenced(
            engine::sheet_frames(SHEET_STAND, 3),
            STAND_FRAME_SIZE,
            &[(0, 250), (1, 100), (2, 5), (1, 20), (2, 10), (1, 100)],
        )
        .expect("stand animation table is valid");
        mirrored(&mut animations, AnimAction::Stand, stand);

        let walk = Animation::uniform(engine::sheet_frames(SHEET_WALK, 4), WALK_FRAME_SIZE, 5);
        mirrored(&mut animations, AnimAction::Walk, walk);

        let jump = Animation::uniform(engine::sheet_frames(SHEET_JUMP, 1), STAND_FRAME_SIZE, 1);
        mirrored(&mut animations, AnimAction::Jump, jump);

        let sleep_cycle = engine::sheet_frames(SHEET_SLEEP_CYCLE, 7);
        let gotosleep = Animation::sequenced(
            sleep_cycle.clone(),
            SLEEP_FRAME_SIZE,
            &[(0, 15), (1, 15), (2, 15), (3, 15), (4, 15)],
        )
        .expect("gotosleep animation table is valid");
        mirrored(&mut animations, AnimAction::GotoSleep, gotosleep);

        let sleep = Animation::sequenced(
            sleep_cycle.clone(),
            SLEEP_FRAME_SIZE,
            &[(4, 30), (5, 20), (6, 100), (5, 20)],
        )
        .expect("sleep animation table is valid");
        mirrored(&mut animations, AnimAction::Sleep, sleep);

        let wakeup = Animation::sequenced(
            sleep_cycle,
            SLEEP_FRAME_SIZE,
            &[(4, 25), (3, 25), (2, 25), (1, 25), (0, 25)],
        )
        .expect("wakeup animation table is valid");
        mirrored(&mut animations, AnimAction::WakeUp, wakeup);

        // The turn sheet is direction-agnostic: the two variants play it in
        // opposite orders instead of mirroring.
        let turn_frames: Vec<SpriteId> = engine::sheet_frames(SHEET_TURN, 4);
        let turn_left = Animation::sequenced(
            turn_frames.clone(),
            TURN_FRAME_SIZE,
            &[(3, 4), (2, 4), (1, 4)],
        )
        .expect("turn animation table is valid");
        let turn_right =
            Animation::sequenced(turn_frames, TURN_FRAME_SIZE, &[(1, 4), (2, 4), (3, 4)])
                .expect("turn animation table is valid");
        animations.insert((AnimAction::Turn, LookDirection::Left), turn_left);
        animations.insert((AnimAction::Turn, LookDirection::Right), turn_right);

        let softfist =
            Animation::uniform(engine::sheet_frames(SHEET_SOFTFIST, 3), WALK_FRAME_SIZE, 8);
        mirrored(&mut animations, AnimAction::SoftFist, softfist);

        Self {
            tracker: PlayerStateTracker::default(),
            animations,
            current: (AnimAction::Stand, LookDirection::Right),
        }
    }

    /// Switch only when the wanted animation isn't already playing.
    fn play(&mut self, action: AnimAction, direction: LookDirection) -> Result<(), ComponentError> {
        let key = (action, direction);
        if self.current != key {
            let animation =
                self.animations
                    .get_mut(&key)
                    .ok_or(ComponentError::MissingAnimation {
                        key: action.label(),
                    })?;
            animation.reset();
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

    fn at_final_frame(&mut self) -> Result<bool, ComponentError> {
        let animation = self.current_animation()?;
        Ok(animation.current_frame_index() + 1 == animation.sequence_len())
    }
}

impl Default for PlayerLookComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for PlayerLookComponent {
    fn update(&mut self, actor: &mut Actor, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        use PlayerState::*;

        let look = self.tracker.look_direction;
        match self.tracker.state {
            UprightStay => self.play(AnimAction::Stand, look)?,
            UprightMove => self.play(AnimAction::Walk, look)?,
            JumpStay | JumpMove | FallStay | FallMove | BumpBack => {
                self.play(AnimAction::Jump, look)?
            }
            GotoSleep => {
                self.play(AnimAction::GotoSleep, look)?;
                if self.at_final_frame()? {
                    self.play(AnimAction::Sleep, look)?;
                    self.tracker.state = Sleep;
                    actor.send_message(&Message::PlayerState(Sleep));
                }
            }
            Sleep => self.play(AnimAction::Sleep, look)?,
            WakeUp => {
                self.play(AnimAction::WakeUp, look)?;
                if self.at_final_frame()? {
                    self.play(AnimAction::Stand, look)?;
                    self.tracker.state = UprightStay;
                    actor.send_message(&Message::PlayerState(UprightStay));
                }
            }
            Turn => {
                // Play the turn toward the side being turned to.
                let target = look.opposite();
                self.play(AnimAction::Turn, target)?;
                if self.at_final_frame()? {
                    self.tracker.look_direction = target;
                    self.tracker.state = UprightStay;
                    actor.send_message(&Message::PlayerState(UprightStay));
                    actor.send_message(&Message::PlayerLook(target));
                    self.play(AnimAction::Stand, target)?;
                }
            }
            SoftFistGround | SoftFistJump | SoftFistFall => {
                self.play(AnimAction::SoftFist, look)?
            }
            CrouchStay | CrouchMove => {
                // No dedicated crouch sheet; the last animation keeps playing.
            }
        }

        let rect = actor.rect();
        let animation = self.current_animation()?;
        animation.update();
        let (width, height) = animation.frame_size();
        let sprite = animation.current_frame();
        // Bottom-center aligned with the actor's box.
        let position = Vec2::new(
            rect.center().x - width as f32 / 2.0,
            rect.bottom() - height as f32,
        );
        ctx.graphics.blit(sprite, position);
        Ok(())
    }

    fn receive_message(&mut self, message: &Message) {
        self.tracker.observe(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Side, SideSet};
    use engine::{InputSnapshot, KeyEdge, NullGraphics, Rect, RecordingGraphics, World};

    fn tuning() -> Tuning {
        Tuning {
            sleep_delay_frames: 5,
            jump_duration_frames: 3,
            attack_duration_frames: 2,
            ..Tuning::default()
        }
    }

    fn grounded() -> Message {
        Message::CollidingSides(SideSet::empty().with(Side::Bottom))
    }

    fn airborne() -> Message {
        Message::CollidingSides(SideSet::empty())
    }

    fn world() -> World {
        World::new((4, 4), (16, 16), Vec::new())
    }

    fn update_fsm(
        fsm: &mut PlayerStatesComponent,
        input: &InputSnapshot,
        contact: Message,
    ) -> PlayerState {
        let world = world();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0));
        fsm.receive_message(&contact);
        fsm.update(&mut actor, &mut ctx).expect("fsm update");
        fsm.state()
    }

    #[test]
    fn direction_key_moves_out_of_upright_stay() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let input = InputSnapshot::empty().with_held(Key::Right);
        assert_eq!(update_fsm(&mut fsm, &input, grounded()), PlayerState::UprightMove);
    }

    #[test]
    fn releasing_direction_returns_to_stay() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let held = InputSnapshot::empty().with_held(Key::Right);
        update_fsm(&mut fsm, &held, grounded());
        let released = InputSnapshot::empty();
        assert_eq!(
            update_fsm(&mut fsm, &released, grounded()),
            PlayerState::UprightStay
        );
    }

    #[test]
    fn losing_ground_contact_forces_fall_same_frame() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        assert_eq!(
            update_fsm(&mut fsm, &InputSnapshot::empty(), airborne()),
            PlayerState::FallStay
        );
    }

    #[test]
    fn crouch_also_demotes_to_fall_without_ground() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&Message::PlayerState(PlayerState::CrouchStay));
        let input = InputSnapshot::empty().with_held(Key::Down);
        assert_eq!(update_fsm(&mut fsm, &input, airborne()), PlayerState::FallStay);
    }

    #[test]
    fn down_edge_crouches_while_grounded() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let input = InputSnapshot::empty()
            .with_held(Key::Down)
            .with_edge(KeyEdge::down(Key::Down));
        assert_eq!(update_fsm(&mut fsm, &input, grounded()), PlayerState::CrouchStay);
    }

    #[test]
    fn jump_edge_enters_jump_and_duration_forces_fall() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let press = InputSnapshot::empty()
            .with_held(Key::A)
            .with_edge(KeyEdge::down(Key::A));
        assert_eq!(update_fsm(&mut fsm, &press, grounded()), PlayerState::JumpStay);

        // Held A: the 3-frame jump window runs out regardless of input.
        let hold = InputSnapshot::empty().with_held(Key::A);
        assert_eq!(update_fsm(&mut fsm, &hold, airborne()), PlayerState::JumpStay);
        assert_eq!(update_fsm(&mut fsm, &hold, airborne()), PlayerState::JumpStay);
        assert_eq!(update_fsm(&mut fsm, &hold, airborne()), PlayerState::FallStay);
    }

    #[test]
    fn releasing_jump_key_drops_into_fall() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let press = InputSnapshot::empty()
            .with_held(Key::A)
            .with_edge(KeyEdge::down(Key::A));
        update_fsm(&mut fsm, &press, grounded());
        assert_eq!(
            update_fsm(&mut fsm, &InputSnapshot::empty(), airborne()),
            PlayerState::FallStay
        );
    }

    #[test]
    fn landing_promotes_fall_to_upright() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&Message::PlayerState(PlayerState::FallMove));
        let input = InputSnapshot::empty().with_held(Key::Right);
        assert_eq!(
            update_fsm(&mut fsm, &input, grounded()),
            PlayerState::UprightMove
        );
    }

    #[test]
    fn idle_timer_reaches_goto_sleep_after_exact_delay() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let idle = InputSnapshot::empty();
        for frame in 1..5 {
            assert_eq!(
                update_fsm(&mut fsm, &idle, grounded()),
                PlayerState::UprightStay,
                "frame {frame}"
            );
        }
        assert_eq!(update_fsm(&mut fsm, &idle, grounded()), PlayerState::GotoSleep);
    }

    #[test]
    fn any_key_wakes_the_sleeper() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&Message::PlayerState(PlayerState::Sleep));
        let input = InputSnapshot::empty().with_held(Key::B);
        assert_eq!(update_fsm(&mut fsm, &input, grounded()), PlayerState::WakeUp);
    }

    #[test]
    fn opposing_edge_while_upright_enters_turn() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        // Default look is right; a left edge while grounded turns.
        let input = InputSnapshot::empty().with_edge(KeyEdge::down(Key::Left));
        assert_eq!(update_fsm(&mut fsm, &input, grounded()), PlayerState::Turn);
        assert_eq!(fsm.look_direction(), LookDirection::Right);
    }

    #[test]
    fn opposing_edge_while_falling_flips_silently() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&Message::PlayerState(PlayerState::FallStay));
        let input = InputSnapshot::empty().with_edge(KeyEdge::down(Key::Left));
        assert_eq!(update_fsm(&mut fsm, &input, airborne()), PlayerState::FallStay);
        assert_eq!(fsm.look_direction(), LookDirection::Left);
    }

    #[test]
    fn b_edge_starts_the_ground_attack_and_it_times_out() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        let press = InputSnapshot::empty().with_edge(KeyEdge::down(Key::B));
        assert_eq!(
            update_fsm(&mut fsm, &press, grounded()),
            PlayerState::SoftFistGround
        );
        let idle = InputSnapshot::empty();
        assert_eq!(
            update_fsm(&mut fsm, &idle, grounded()),
            PlayerState::SoftFistGround
        );
        assert_eq!(update_fsm(&mut fsm, &idle, grounded()), PlayerState::UprightStay);
    }

    #[test]
    fn faced_side_collision_while_attacking_knocks_back() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&Message::PlayerState(PlayerState::SoftFistGround));
        let contact = Message::CollidingSides(
            SideSet::empty().with(Side::Bottom).with(Side::Right),
        );
        assert_eq!(
            update_fsm(&mut fsm, &InputSnapshot::empty(), contact),
            PlayerState::BumpBack
        );
        // Knockback releases only on ground contact.
        assert_eq!(
            update_fsm(&mut fsm, &InputSnapshot::empty(), airborne()),
            PlayerState::BumpBack
        );
        assert_eq!(
            update_fsm(&mut fsm, &InputSnapshot::empty(), grounded()),
            PlayerState::UprightStay
        );
    }

    #[test]
    fn fsm_broadcasts_look_state_and_history() {
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
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&grounded());
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0)).with_component(Box::new(
            Recorder {
                log: std::rc::Rc::clone(&log),
            },
        ));
        let world = world();
        let input = InputSnapshot::empty().with_held(Key::Right);
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        fsm.update(&mut actor, &mut ctx).expect("fsm update");

        let messages = log.borrow();
        assert_eq!(messages[0], Message::PlayerLook(LookDirection::Right));
        assert_eq!(messages[1], Message::PlayerState(PlayerState::UprightMove));
        match &messages[2] {
            Message::PlayerHistory(history) => {
                assert_eq!(history.last(), PlayerState::UprightMove);
                assert_eq!(history.previous(), PlayerState::UprightStay);
            }
            other => panic!("expected history broadcast, got {other:?}"),
        }
    }

    #[test]
    fn state_debug_text_is_drawn_when_enabled() {
        let mut fsm = PlayerStatesComponent::new(&tuning());
        fsm.receive_message(&grounded());
        let world = world();
        let input = InputSnapshot::empty();
        let mut graphics = RecordingGraphics::new();
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0));
        fsm.update(&mut actor, &mut ctx).expect("fsm update");
        assert_eq!(graphics.texts.len(), 1);
        assert_eq!(graphics.texts[0].0, "upright-stay");
    }

    fn run_move(
        component: &mut PlayerMoveComponent,
        state: PlayerState,
        look: LookDirection,
    ) -> Vec2 {
        component.receive_message(&Message::PlayerState(state));
        component.receive_message(&Message::PlayerLook(look));
        let mut history = StateHistory::new(PlayerState::UprightStay);
        history.push(state);
        component.receive_message(&Message::PlayerHistory(history));

        let world = world();
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0));
        component.update(&mut actor, &mut ctx).expect("move update");
        component.velocity.velocity
    }

    #[test]
    fn move_component_translates_states_into_velocity() {
        let mut component = PlayerMoveComponent::new(&Tuning::default());
        assert_eq!(
            run_move(&mut component, PlayerState::UprightMove, LookDirection::Right),
            Vec2::new(1.0, 0.0)
        );
        assert_eq!(
            run_move(&mut component, PlayerState::UprightMove, LookDirection::Left),
            Vec2::new(-1.0, 0.0)
        );
        assert_eq!(
            run_move(&mut component, PlayerState::UprightStay, LookDirection::Left),
            Vec2::new(0.0, 0.0)
        );
    }

    #[test]
    fn jump_states_push_upward_every_frame() {
        let mut component = PlayerMoveComponent::new(&Tuning::default());
        assert_eq!(
            run_move(&mut component, PlayerState::JumpMove, LookDirection::Right),
            Vec2::new(1.0, -3.0)
        );
        assert_eq!(
            run_move(&mut component, PlayerState::JumpStay, LookDirection::Right),
            Vec2::new(0.0, -3.0)
        );
    }

    #[test]
    fn knockback_pushes_away_with_an_entry_pop() {
        let mut component = PlayerMoveComponent::new(&Tuning::default());
        let velocity = run_move(&mut component, PlayerState::BumpBack, LookDirection::Right);
        assert_eq!(velocity, Vec2::new(-1.0, -3.0));

        // Second frame in knockback: push continues, no new pop.
        component.receive_message(&Message::Velocity(Vec2::new(-1.0, -2.0)));
        let mut history = StateHistory::new(PlayerState::BumpBack);
        history.push(PlayerState::BumpBack);
        component.receive_message(&Message::PlayerHistory(history));
        let world = world();
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0));
        component.update(&mut actor, &mut ctx).expect("move update");
        assert_eq!(component.velocity.velocity, Vec2::new(-1.0, -2.0));
    }

    fn drive_look(
        look: &mut PlayerLookComponent,
        state: PlayerState,
        frames: u32,
    ) -> Vec<Message> {
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
        look.receive_message(&Message::PlayerState(state));
        let mut actor = Actor::new(Rect::new(0.0, 0.0, 20.0, 30.0)).with_component(Box::new(
            Recorder {
                log: std::rc::Rc::clone(&log),
            },
        ));
        let world = world();
        let input = InputSnapshot::empty();
        let mut graphics = NullGraphics;
        let mut ctx = Context::new(&world, &input, &mut graphics);
        for _ in 0..frames {
            look.update(&mut actor, &mut ctx).expect("look update");
        }
        let messages = log.borrow().clone();
        messages
    }

    #[test]
    fn finished_gotosleep_animation_reports_sleep() {
        let mut look = PlayerLookComponent::new();
        // 5 entries x 15 frames each: the final entry is reached after 60
        // updates; the completion fires on the next one.
        let messages = drive_look(&mut look, PlayerState::GotoSleep, 61);
        assert!(messages.contains(&Message::PlayerState(PlayerState::Sleep)));
        assert_eq!(look.tracker.state, PlayerState::Sleep);
    }

    #[test]
    fn finished_wakeup_animation_reports_upright() {
        let mut look = PlayerLookComponent::new();
        let messages = drive_look(&mut look, PlayerState::WakeUp, 101);
        assert!(messages.contains(&Message::PlayerState(PlayerState::UprightStay)));
    }

    #[test]
    fn finished_turn_flips_look_direction() {
        let mut look = PlayerLookComponent::new();
        // Default look is right, so the turn plays toward left: 3 entries x
        // 4 frames; completion on the ninth update.
        let messages = drive_look(&mut look, PlayerState::Turn, 9);
        assert!(messages.contains(&Message::PlayerLook(LookDirection::Left)));
        assert!(messages.contains(&Message::PlayerState(PlayerState::UprightStay)));
        assert_eq!(look.tracker.look_direction, LookDirection::Left);
    }

    #[test]
    fn look_component_blits_bottom_center() {
        let mut look = PlayerLookComponent::new();
        look.receive_message(&Message::PlayerState(PlayerState::UprightStay));
        let world = world();
        let input = InputSnapshot::empty();
        let mut graphics = RecordingGraphics::new();
        let mut ctx = Context::new(&world, &input, &mut graphics);
        let mut actor = Actor::new(Rect::new(10.0, 20.0, 20.0, 30.0));
        look.update(&mut actor, &mut ctx).expect("look update");
        assert_eq!(graphics.blits.len(), 1);
        let (_, position) = graphics.blits[0];
        // Stand frames are 20x29: centered on x, resting on the rect bottom.
        assert_eq!(position, Vec2::new(10.0, 21.0));
    }
}
