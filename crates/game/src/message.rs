use engine::Vec2;

use crate::states::{PatrolState, PlayerState};

/// Face of the moving actor's box found blocked by a tile contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Left,
    Bottom,
    Right,
}

impl Side {
    const fn bit(self) -> u8 {
        match self {
            Side::Top => 1 << 0,
            Side::Left => 1 << 1,
            Side::Bottom => 1 << 2,
            Side::Right => 1 << 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideSet(u8);

impl SideSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, side: Side) -> Self {
        self.insert(side);
        self
    }

    pub fn insert(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    pub fn contains(&self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookDirection {
    Left,
    Right,
}

impl LookDirection {
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The side an actor facing this way runs into.
    pub fn blocked_side(self) -> Side {
        match self {
            Self::Left => Side::Left,
            Self::Right => Side::Right,
        }
    }
}

pub const HISTORY_CAP: usize = 10;

/// Fixed-capacity rolling record of recent FSM states, oldest discarded.
/// Components use it for edge detection ("did we just enter this state")
/// separately from the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHistory<S> {
    entries: [S; HISTORY_CAP],
    len: usize,
}

impl<S: Copy + PartialEq> StateHistory<S> {
    pub fn new(initial: S) -> Self {
        Self {
            entries: [initial; HISTORY_CAP],
            len: 1,
        }
    }

    pub fn push(&mut self, state: S) {
        if self.len < HISTORY_CAP {
            self.entries[self.len] = state;
            self.len += 1;
        } else {
            self.entries.rotate_left(1);
            self.entries[HISTORY_CAP - 1] = state;
        }
    }

    /// Most recent entry.
    pub fn last(&self) -> S {
        self.entries[self.len - 1]
    }

    /// Entry before the most recent one; the initial state while only one
    /// entry exists.
    pub fn previous(&self) -> S {
        self.entries[self.len.saturating_sub(2)]
    }

    pub fn contains(&self, state: S) -> bool {
        self.entries[..self.len].iter().any(|entry| *entry == state)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Closed set of broadcasts exchanged between the components of one actor.
/// A message never crosses actors and never outlives the frame it was sent
/// in; receivers copy what they need into their own state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Velocity(Vec2),
    CollidingSides(SideSet),
    PlayerState(PlayerState),
    PlayerLook(LookDirection),
    PlayerHistory(StateHistory<PlayerState>),
    PatrolState(PatrolState),
    PatrolLook(LookDirection),
    PatrolHistory(StateHistory<PatrolState>),
}

/// Embedded record for components that follow the velocity broadcasts.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityTracker {
    pub velocity: Vec2,
}

impl VelocityTracker {
    pub fn observe(&mut self, message: &Message) {
        if let Message::Velocity(velocity) = message {
            self.velocity = *velocity;
        }
    }
}

/// Embedded record for components that follow the player state broadcasts.
#[derive(Debug, Clone, Copy)]
pub struct PlayerStateTracker {
    pub state: PlayerState,
    pub look_direction: LookDirection,
    pub colliding_sides: SideSet,
}

impl Default for PlayerStateTracker {
    fn default() -> Self {
        Self {
            state: PlayerState::UprightStay,
            look_direction: LookDirection::Right,
            colliding_sides: SideSet::empty(),
        }
    }
}

impl PlayerStateTracker {
    pub fn observe(&mut self, message: &Message) {
        match message {
            Message::PlayerState(state) => self.state = *state,
            Message::PlayerLook(direction) => self.look_direction = *direction,
            Message::CollidingSides(sides) => self.colliding_sides = *sides,
            _ => {}
        }
    }
}

/// Embedded record for components that follow the patrol state broadcasts.
#[derive(Debug, Clone, Copy)]
pub struct PatrolStateTracker {
    pub state: PatrolState,
    pub look_direction: LookDirection,
    pub colliding_sides: SideSet,
}

impl Default for PatrolStateTracker {
    fn default() -> Self {
        Self {
            state: PatrolState::Move,
            look_direction: LookDirection::Right,
            colliding_sides: SideSet::empty(),
        }
    }
}

impl PatrolStateTracker {
    pub fn observe(&mut self, message: &Message) {
        match message {
            Message::PatrolState(state) => self.state = *state,
            Message::PatrolLook(direction) => self.look_direction = *direction,
            Message::CollidingSides(sides) => self.colliding_sides = *sides,
            _ => {}
        }
    }
}
