use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::animation::Animation;
use crate::geom::{Rect, Vec2};
use crate::map::MapData;

/// Physical classification of a tile. Only the simulation cares; rendering
/// treats every group alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialGroup {
    /// Normal, unbreakable block.
    Solid,
    /// No physics, background decoration. Also the out-of-bounds sentinel.
    Deco,
    /// Breakable with the soft punch, jump- and fall-attack.
    SoftBreak,
    /// Breakable with the hard punch, jump- and fall-attack.
    HardBreak,
    /// Breakable by a thrown enemy.
    ShotBreak,
    /// Breakable while the player is on fire.
    FireBreak,
    /// Climbable in all directions.
    Ladder,
    WaterStill,
    WaterLeft,
    WaterRight,
    WaterUp,
    WaterDown,
    /// Swim-on-top-only water.
    WaterImpervious,
    /// Pervious from below, solid from above.
    PlatformFallthrough,
    /// Vacant cell.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown material group")]
pub struct UnknownMaterialGroup;

impl FromStr for MaterialGroup {
    type Err = UnknownMaterialGroup;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "solid" => Ok(Self::Solid),
            "deco" => Ok(Self::Deco),
            "soft_break" => Ok(Self::SoftBreak),
            "hard_break" => Ok(Self::HardBreak),
            "shot_break" => Ok(Self::ShotBreak),
            "fire_break" => Ok(Self::FireBreak),
            "ladder" => Ok(Self::Ladder),
            "water_still" => Ok(Self::WaterStill),
            "water_left" => Ok(Self::WaterLeft),
            "water_right" => Ok(Self::WaterRight),
            "water_up" => Ok(Self::WaterUp),
            "water_down" => Ok(Self::WaterDown),
            "water_impervious" => Ok(Self::WaterImpervious),
            "platform_fallthrough" => Ok(Self::PlatformFallthrough),
            "empty" => Ok(Self::Empty),
            _ => Err(UnknownMaterialGroup),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileTemplateId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(usize);

/// Immutable per-tileset-entry data. Placed instances reference a template;
/// they never own material or animation state of their own.
#[derive(Debug, Clone)]
pub struct TileTemplate {
    material_group: MaterialGroup,
    animation: Animation,
}

impl TileTemplate {
    pub fn new(material_group: MaterialGroup, animation: Animation) -> Self {
        Self {
            material_group,
            animation,
        }
    }

    pub fn material_group(&self) -> MaterialGroup {
        self.material_group
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }
}

/// Copyable answer to a positional tile query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileView {
    pub material_group: MaterialGroup,
    pub rect: Rect,
    pub template: Option<TileTemplateId>,
}

impl TileView {
    fn sentinel(material_group: MaterialGroup) -> Self {
        Self {
            material_group,
            rect: Rect::default(),
            template: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("no layer named '{name}'")]
    InvalidLayer { name: String },
    #[error("layer id {index} is not part of this world")]
    StaleLayerId { index: usize },
    #[error("tile template id {id} is not part of this world")]
    UnknownTemplate { id: u16 },
    #[error("position ({x}, {y}) is outside the {cols}x{rows} grid")]
    OutOfGrid { x: f32, y: f32, cols: u32, rows: u32 },
}

#[derive(Debug)]
struct Layer {
    name: String,
    /// Dense cols*rows grid, row-major.
    cells: Vec<Option<TileTemplateId>>,
    /// Cell indices in placement order; query iteration order.
    placed: Vec<usize>,
    by_material: HashMap<MaterialGroup, Vec<usize>>,
}

/// Tile-grid spatial index: layered placed tiles, queried by rect overlap
/// against material groups and by relative grid offset.
#[derive(Debug)]
pub struct World {
    grid_size: (u32, u32),
    tile_size: (u32, u32),
    templates: Vec<TileTemplate>,
    layers: Vec<Layer>,
}

impl World {
    pub fn new(grid_size: (u32, u32), tile_size: (u32, u32), templates: Vec<TileTemplate>) -> Self {
        Self {
            grid_size,
            tile_size,
            templates,
            layers: Vec::new(),
        }
    }

    /// Build the world from the loader's output: templates from the tileset
    /// materials, then one `create_tile` per non-empty cell of each layer.
    pub fn from_map(map: &MapData) -> Result<Self, WorldError> {
        let templates = map
            .tile_materials
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let frame = crate::animation::SpriteId::new(0, index as u16);
                TileTemplate::new(*group, Animation::uniform(vec![frame], map.tile_size, 10))
            })
            .collect();

        let mut world = Self::new(map.grid_size, map.tile_size, templates);
        for map_layer in &map.layers {
            let layer = world.add_layer(&map_layer.name);
            for (cell, gid) in map_layer.cells.iter().copied().enumerate() {
                if gid == 0 {
                    continue;
                }
                let col = cell as u32 % map.grid_size.0;
                let row = cell as u32 / map.grid_size.0;
                let position = Vec2::new(
                    (col * map.tile_size.0) as f32,
                    (row * map.tile_size.1) as f32,
                );
                world.create_tile(layer, position, TileTemplateId(gid - 1))?;
            }
        }
        Ok(world)
    }

    pub fn grid_size(&self) -> (u32, u32) {
        self.grid_size
    }

    pub fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    pub fn add_layer(&mut self, name: &str) -> LayerId {
        let cells = self.grid_size.0 as usize * self.grid_size.1 as usize;
        debug!(layer = name, cells, "layer_added");
        self.layers.push(Layer {
            name: name.to_string(),
            cells: vec![None; cells],
            placed: Vec::new(),
            by_material: HashMap::new(),
        });
        LayerId(self.layers.len() - 1)
    }

    /// Unknown names are a programming error, surfaced immediately.
    pub fn layer_id(&self, name: &str) -> Result<LayerId, WorldError> {
        self.layers
            .iter()
            .position(|layer| layer.name == name)
            .map(LayerId)
            .ok_or_else(|| WorldError::InvalidLayer {
                name: name.to_string(),
            })
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&self, id: LayerId) -> Result<&Layer, WorldError> {
        self.layers
            .get(id.0)
            .ok_or(WorldError::StaleLayerId { index: id.0 })
    }

    /// Stamp a template instance at the grid cell containing `position` and
    /// keep the material index consistent.
    pub fn create_tile(
        &mut self,
        layer: LayerId,
        position: Vec2,
        template: TileTemplateId,
    ) -> Result<(), WorldError> {
        let group = self
            .templates
            .get(template.0 as usize)
            .map(TileTemplate::material_group)
            .ok_or(WorldError::UnknownTemplate { id: template.0 })?;
        let (cols, rows) = self.grid_size;
        let col = (position.x / self.tile_size.0 as f32).floor() as i64;
        let row = (position.y / self.tile_size.1 as f32).floor() as i64;
        if col < 0 || row < 0 || col >= cols as i64 || row >= rows as i64 {
            return Err(WorldError::OutOfGrid {
                x: position.x,
                y: position.y,
                cols,
                rows,
            });
        }
        let cell = row as usize * cols as usize + col as usize;

        let layer = self
            .layers
            .get_mut(layer.0)
            .ok_or(WorldError::StaleLayerId { index: layer.0 })?;
        if let Some(previous) = layer.cells[cell] {
            // Re-stamping a cell replaces the instance; drop the stale index
            // entries so the material index never lies.
            let previous_group = self.templates[previous.0 as usize].material_group;
            if let Some(entries) = layer.by_material.get_mut(&previous_group) {
                entries.retain(|entry| *entry != cell);
            }
            layer.placed.retain(|entry| *entry != cell);
        }
        layer.cells[cell] = Some(template);
        layer.placed.push(cell);
        layer.by_material.entry(group).or_default().push(cell);
        Ok(())
    }

    fn cell_rect(&self, cell: usize) -> Rect {
        let cols = self.grid_size.0 as usize;
        let col = cell % cols;
        let row = cell / cols;
        Rect::new(
            (col as u32 * self.tile_size.0) as f32,
            (row as u32 * self.tile_size.1) as f32,
            self.tile_size.0 as f32,
            self.tile_size.1 as f32,
        )
    }

    /// First placed tile on `layer` whose group is in `groups` and whose rect
    /// overlaps `rect`. Placement order, deterministic per run.
    pub fn colliding_rect(
        &self,
        layer: LayerId,
        groups: &[MaterialGroup],
        rect: Rect,
    ) -> Result<Option<Rect>, WorldError> {
        let layer = self.layer(layer)?;
        for cell in &layer.placed {
            let Some(template) = layer.cells[*cell] else {
                continue;
            };
            let group = self.templates[template.0 as usize].material_group;
            if !groups.contains(&group) {
                continue;
            }
            let tile_rect = self.cell_rect(*cell);
            if tile_rect.intersects(&rect) {
                return Ok(Some(tile_rect));
            }
        }
        Ok(None)
    }

    /// All overlapping matches, same ordering guarantee as `colliding_rect`.
    pub fn colliding_rects(
        &self,
        layer: LayerId,
        groups: &[MaterialGroup],
        rect: Rect,
    ) -> Result<Vec<Rect>, WorldError> {
        let layer = self.layer(layer)?;
        let mut matches = Vec::new();
        for cell in &layer.placed {
            let Some(template) = layer.cells[*cell] else {
                continue;
            };
            let group = self.templates[template.0 as usize].material_group;
            if !groups.contains(&group) {
                continue;
            }
            let tile_rect = self.cell_rect(*cell);
            if tile_rect.intersects(&rect) {
                matches.push(tile_rect);
            }
        }
        Ok(matches)
    }

    /// Tile at `rect`'s grid cell shifted by `offset` tile units (+y down).
    /// Off-map answers the decoration sentinel: out of bounds is never solid
    /// and never an error. A vacant in-bounds cell answers an empty view.
    pub fn tile_relative_to(
        &self,
        layer: LayerId,
        rect: Rect,
        offset: (i32, i32),
    ) -> Result<TileView, WorldError> {
        let layer = self.layer(layer)?;
        let col = (rect.x / self.tile_size.0 as f32).floor() as i64 + offset.0 as i64;
        let row = (rect.y / self.tile_size.1 as f32).floor() as i64 + offset.1 as i64;
        let (cols, rows) = self.grid_size;
        if col < 0 || row < 0 || col >= cols as i64 || row >= rows as i64 {
            return Ok(TileView::sentinel(MaterialGroup::Deco));
        }
        let cell = row as usize * cols as usize + col as usize;
        match layer.cells[cell] {
            Some(template) => Ok(TileView {
                material_group: self.templates[template.0 as usize].material_group,
                rect: self.cell_rect(cell),
                template: Some(template),
            }),
            None => Ok(TileView::sentinel(MaterialGroup::Empty)),
        }
    }

    /// Advance template animations once per frame. Instances share their
    /// template's animation, so one tick per template covers every placement.
    pub fn update(&mut self) {
        for template in &mut self.templates {
            template.animation.update();
        }
    }

    pub fn template(&self, id: TileTemplateId) -> Option<&TileTemplate> {
        self.templates.get(id.0 as usize)
    }

    /// Placed tiles of one layer in placement order, for the renderer.
    pub fn placed_tiles(
        &self,
        layer: LayerId,
    ) -> Result<impl Iterator<Item = (TileTemplateId, Rect)> + '_, WorldError> {
        let layer = self.layer(layer)?;
        Ok(layer.placed.iter().filter_map(move |cell| {
            layer.cells[*cell].map(|template| (template, self.cell_rect(*cell)))
        }))
    }
}
