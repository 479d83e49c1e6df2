pub mod animation;
pub mod counter;
pub mod geom;
pub mod graphics;
pub mod input;
pub mod map;
pub mod world;

pub use animation::{sheet_frames, Animation, AnimationError, SpriteId};
pub use counter::Counter;
pub use geom::{Rect, Vec2};
pub use graphics::{Color, Graphics, NullGraphics, RecordingGraphics};
pub use input::{InputSnapshot, InputState, Key, KeyEdge, KeySet};
pub use map::{load_tmx_file, parse_tmx, MapData, MapError, MapLayer, MapSpawn};
pub use world::{
    LayerId, MaterialGroup, TileTemplate, TileTemplateId, TileView, World, WorldError,
};
