/// Raw polls kept for the smoothed view. A key counts as smooth-held if it
/// was down in any of the last `SMOOTH_WINDOW` polls, absorbing single-frame
/// input loss on fast polling.
const SMOOTH_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

impl Key {
    const fn bit(self) -> u8 {
        match self {
            Key::Up => 1 << 0,
            Key::Down => 1 << 1,
            Key::Left => 1 << 2,
            Key::Right => 1 << 3,
            Key::A => 1 << 4,
            Key::B => 1 << 5,
            Key::Start => 1 << 6,
            Key::Select => 1 << 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u8);

impl KeySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, key: Key) -> Self {
        self.insert(key);
        self
    }

    pub fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    pub fn remove(&mut self, key: Key) {
        self.0 &= !key.bit();
    }

    pub fn contains(&self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn union(self, other: KeySet) -> KeySet {
        KeySet(self.0 | other.0)
    }
}

/// Discrete key transition, tagged with direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEdge {
    pub key: Key,
    pub pressed: bool,
}

impl KeyEdge {
    pub fn down(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

/// Per-frame input view consumed by the simulation. The simulation never
/// polls a device; something upstream feeds `InputState` and hands out
/// snapshots.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    held: KeySet,
    smoothed: KeySet,
    edges: Vec<KeyEdge>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Marks the key down in both the raw and smoothed views.
    pub fn with_held(mut self, key: Key) -> Self {
        self.held.insert(key);
        self.smoothed.insert(key);
        self
    }

    /// Marks the key down only in the smoothed view (released this frame but
    /// still inside the smoothing window).
    pub fn with_smoothed(mut self, key: Key) -> Self {
        self.smoothed.insert(key);
        self
    }

    pub fn with_edge(mut self, edge: KeyEdge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(key)
    }

    pub fn is_smooth_held(&self, key: Key) -> bool {
        self.smoothed.contains(key)
    }

    pub fn edges(&self) -> &[KeyEdge] {
        &self.edges
    }

    pub fn any_key_down_edge(&self) -> bool {
        self.edges.iter().any(|edge| edge.pressed)
    }
}

/// Rolling poll window owned by the session driver.
#[derive(Debug, Clone)]
pub struct InputState {
    ring: [KeySet; SMOOTH_WINDOW],
    cursor: usize,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            ring: [KeySet::empty(); SMOOTH_WINDOW],
            cursor: 0,
        }
    }

    /// Feed one raw poll and produce the frame's snapshot.
    pub fn advance(&mut self, held: KeySet, edges: Vec<KeyEdge>) -> InputSnapshot {
        self.ring[self.cursor] = held;
        self.cursor = (self.cursor + 1) % SMOOTH_WINDOW;

        let smoothed = self
            .ring
            .iter()
            .fold(KeySet::empty(), |acc, poll| acc.union(*poll));

        InputSnapshot {
            held,
            smoothed,
            edges,
        }
    }
}
