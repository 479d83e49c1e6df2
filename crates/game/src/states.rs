/// Player behavior states. "Stay" and "Move" split every locomotion family so
/// the movement component can decide velocity from the state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    UprightStay,
    UprightMove,
    CrouchStay,
    CrouchMove,
    JumpStay,
    JumpMove,
    FallStay,
    FallMove,
    GotoSleep,
    Sleep,
    WakeUp,
    Turn,
    SoftFistGround,
    SoftFistJump,
    SoftFistFall,
    BumpBack,
}

impl PlayerState {
    pub fn is_jump(self) -> bool {
        matches!(self, Self::JumpStay | Self::JumpMove)
    }

    pub fn is_attack(self) -> bool {
        matches!(
            self,
            Self::SoftFistGround | Self::SoftFistJump | Self::SoftFistFall
        )
    }

    /// Label shown by the state debug overlay.
    pub fn label(self) -> &'static str {
        match self {
            Self::UprightStay => "upright-stay",
            Self::UprightMove => "upright-move",
            Self::CrouchStay => "crouch-stay",
            Self::CrouchMove => "crouch-move",
            Self::JumpStay => "jump-stay",
            Self::JumpMove => "jump-move",
            Self::FallStay => "fall-stay",
            Self::FallMove => "fall-move",
            Self::GotoSleep => "goto-sleep",
            Self::Sleep => "sleep",
            Self::WakeUp => "wake-up",
            Self::Turn => "turn",
            Self::SoftFistGround => "softfist-ground",
            Self::SoftFistJump => "softfist-jump",
            Self::SoftFistFall => "softfist-fall",
            Self::BumpBack => "bump-back",
        }
    }
}

/// Ledge-walker enemy states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatrolState {
    Stay,
    Move,
    Turn,
}
