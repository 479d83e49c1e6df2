use crate::animation::SpriteId;
use crate::geom::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Write-only sink for sprite placement and debug overlays. The simulation
/// core never reads anything back from it.
pub trait Graphics {
    fn blit(&mut self, sprite: SpriteId, position: Vec2);
    fn draw_rect(&mut self, rect: Rect, color: Color, width: u32);
    fn draw_text(&mut self, text: &str, position: Vec2, color: Color);
}

/// Discards every call. Headless runs and most tests use this.
#[derive(Debug, Default)]
pub struct NullGraphics;

impl Graphics for NullGraphics {
    fn blit(&mut self, _sprite: SpriteId, _position: Vec2) {}

    fn draw_rect(&mut self, _rect: Rect, _color: Color, _width: u32) {}

    fn draw_text(&mut self, _text: &str, _position: Vec2, _color: Color) {}
}

/// Records every call so tests can assert on what the simulation drew.
#[derive(Debug, Default)]
pub struct RecordingGraphics {
    pub blits: Vec<(SpriteId, Vec2)>,
    pub rects: Vec<(Rect, Color, u32)>,
    pub texts: Vec<(String, Vec2, Color)>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.blits.clear();
        self.rects.clear();
        self.texts.clear();
    }
}

impl Graphics for RecordingGraphics {
    fn blit(&mut self, sprite: SpriteId, position: Vec2) {
        self.blits.push((sprite, position));
    }

    fn draw_rect(&mut self, rect: Rect, color: Color, width: u32) {
        self.rects.push((rect, color, width));
    }

    fn draw_text(&mut self, text: &str, position: Vec2, color: Color) {
        self.texts.push((text.to_string(), position, color));
    }
}
