use thiserror::Error;

/// Opaque frame handle. A renderer resolves it against its loaded sheets;
/// the simulation only sequences and routes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId {
    pub sheet: u16,
    pub index: u16,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl SpriteId {
    pub fn new(sheet: u16, index: u16) -> Self {
        Self {
            sheet,
            index,
            flip_x: false,
            flip_y: false,
        }
    }

    pub fn flipped_x(mut self) -> Self {
        self.flip_x = !self.flip_x;
        self
    }

    pub fn flipped_y(mut self) -> Self {
        self.flip_y = !self.flip_y;
        self
    }
}

/// Handles for the first `count` frames of a tiled sheet, in sheet order.
pub fn sheet_frames(sheet: u16, count: u16) -> Vec<SpriteId> {
    (0..count).map(|index| SpriteId::new(sheet, index)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("sequence entry {entry} references frame {frame}, but only {available} frames exist")]
    FrameOutOfRange {
        entry: usize,
        frame: usize,
        available: usize,
    },
    #[error("animation needs at least one frame")]
    Empty,
}

/// Sequenced frame player. The sequence is a list of (frame index, duration
/// in simulation frames); the cursor walks the sequence and wraps.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<SpriteId>,
    frame_size: (u32, u32),
    sequence: Vec<(usize, u32)>,
    frame_counter: u32,
    cursor: usize,
    playing: bool,
}

impl Animation {
    /// Every frame shown for the same duration, in sheet order.
    pub fn uniform(frames: Vec<SpriteId>, frame_size: (u32, u32), frames_per_sprite: u32) -> Self {
        let sequence = (0..frames.len())
            .map(|index| (index, frames_per_sprite))
            .collect();
        Self::from_parts(frames, frame_size, sequence)
    }

    /// Per-frame durations, in sheet order. Extra durations are ignored,
    /// missing ones truncate the sequence.
    pub fn per_sprite(frames: Vec<SpriteId>, frame_size: (u32, u32), durations: &[u32]) -> Self {
        let sequence = durations
            .iter()
            .copied()
            .enumerate()
            .take(frames.len())
            .collect();
        Self::from_parts(frames, frame_size, sequence)
    }

    /// Explicit (frame, duration) sequence; entries may repeat frames and the
    /// sequence may be longer than the frame list.
    pub fn sequenced(
        frames: Vec<SpriteId>,
        frame_size: (u32, u32),
        order: &[(usize, u32)],
    ) -> Result<Self, AnimationError> {
        if frames.is_empty() || order.is_empty() {
            return Err(AnimationError::Empty);
        }
        for (entry, (frame, _)) in order.iter().enumerate() {
            if *frame >= frames.len() {
                return Err(AnimationError::FrameOutOfRange {
                    entry,
                    frame: *frame,
                    available: frames.len(),
                });
            }
        }
        Ok(Self::from_parts(frames, frame_size, order.to_vec()))
    }

    fn from_parts(frames: Vec<SpriteId>, frame_size: (u32, u32), sequence: Vec<(usize, u32)>) -> Self {
        Self {
            frames,
            frame_size,
            sequence,
            frame_counter: 0,
            cursor: 0,
            playing: true,
        }
    }

    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self
    }

    pub fn pause(&mut self) -> &mut Self {
        self.playing = false;
        self
    }

    /// Back to the first sequence entry without pausing.
    pub fn reset(&mut self) -> &mut Self {
        self.cursor = 0;
        self.frame_counter = 0;
        self
    }

    /// Must be called once per simulation frame.
    pub fn update(&mut self) -> &mut Self {
        if self.playing {
            self.frame_counter += 1;
        }
        if self.frame_counter >= self.sequence[self.cursor].1 {
            self.cursor += 1;
            if self.cursor >= self.sequence.len() {
                self.cursor = 0;
            }
            self.frame_counter = 0;
        }
        self
    }

    /// Index into the *sequence*, not the frame list. Components compare this
    /// against known indices to detect animation-complete conditions.
    pub fn current_frame_index(&self) -> usize {
        self.cursor
    }

    pub fn current_frame(&self) -> SpriteId {
        self.frames[self.sequence[self.cursor].0]
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// New animation with every frame mirrored on the x axis.
    pub fn flipped_horizontally(&self) -> Self {
        let mut mirrored = self.clone();
        mirrored.frames = self.frames.iter().map(|frame| frame.flipped_x()).collect();
        mirrored.reset();
        mirrored
    }

    /// New animation with every frame mirrored on the y axis.
    pub fn flipped_vertically(&self) -> Self {
        let mut mirrored = self.clone();
        mirrored.frames = self.frames.iter().map(|frame| frame.flipped_y()).collect();
        mirrored.reset();
        mirrored
    }
}
