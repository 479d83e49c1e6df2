use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::info;

use crate::geom::Vec2;
use crate::world::MaterialGroup;

/// Output of the map/tile-source loader: grid and tile dimensions, one
/// material per tileset entry, per-layer gid cells (1-based, 0 = empty) and
/// the object spawns of the `main` object group. `World::from_map` consumes
/// exactly this.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    pub grid_size: (u32, u32),
    pub tile_size: (u32, u32),
    pub tile_materials: Vec<MaterialGroup>,
    pub layers: Vec<MapLayer>,
    pub spawns: Vec<MapSpawn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub cells: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSpawn {
    pub name: String,
    pub position: Vec2,
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed map xml: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("missing <{element}> element")]
    MissingElement { element: &'static str },
    #[error("attribute '{attribute}' has non-numeric value '{value}'")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
    },
    #[error("tile {tile_id} declares unknown material group '{value}'")]
    UnknownMaterial { tile_id: u16, value: String },
    #[error("layer '{layer}' has {actual} cells, expected {expected}")]
    CellCountMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },
}

pub fn load_tmx_file(path: &Path) -> Result<MapData, MapError> {
    let text = fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let map = parse_tmx(&text)?;
    info!(
        path = %path.display(),
        layers = map.layers.len(),
        spawns = map.spawns.len(),
        "map_loaded"
    );
    Ok(map)
}

pub fn parse_tmx(text: &str) -> Result<MapData, MapError> {
    let document = Document::parse(text)?;
    let map = document.root_element();

    let grid_size = (
        parse_attribute(map, "width")?,
        parse_attribute(map, "height")?,
    );
    let tile_size = (
        parse_attribute(map, "tilewidth")?,
        parse_attribute(map, "tileheight")?,
    );

    let tileset = map
        .children()
        .find(|node| node.has_tag_name("tileset"))
        .ok_or(MapError::MissingElement { element: "tileset" })?;
    let tile_count: u16 = parse_attribute(tileset, "tilecount")?;
    let mut tile_materials = vec![MaterialGroup::Deco; tile_count as usize];
    for tile in tileset.children().filter(|node| node.has_tag_name("tile")) {
        let tile_id: u16 = parse_attribute(tile, "id")?;
        for property in tile
            .descendants()
            .filter(|node| node.has_tag_name("property"))
        {
            let name = require_attribute(property, "name")?;
            if name != "material_group" {
                continue;
            }
            let value = require_attribute(property, "value")?;
            if value.is_empty() {
                continue;
            }
            let group = value
                .parse::<MaterialGroup>()
                .map_err(|_| MapError::UnknownMaterial {
                    tile_id,
                    value: value.to_string(),
                })?;
            if let Some(slot) = tile_materials.get_mut(tile_id as usize) {
                *slot = group;
            }
        }
    }

    let expected_cells = grid_size.0 as usize * grid_size.1 as usize;
    let mut layers = Vec::new();
    for layer in map.children().filter(|node| node.has_tag_name("layer")) {
        let name = require_attribute(layer, "name")?.to_string();
        let data = layer
            .children()
            .find(|node| node.has_tag_name("data"))
            .ok_or(MapError::MissingElement { element: "data" })?;
        let raw = data.text().unwrap_or("");
        let mut cells = Vec::with_capacity(expected_cells);
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let gid = entry.parse::<u16>().map_err(|_| MapError::InvalidNumber {
                attribute: "data",
                value: entry.to_string(),
            })?;
            cells.push(gid);
        }
        if cells.len() != expected_cells {
            return Err(MapError::CellCountMismatch {
                layer: name,
                expected: expected_cells,
                actual: cells.len(),
            });
        }
        layers.push(MapLayer { name, cells });
    }

    let mut spawns = Vec::new();
    for group in map
        .children()
        .filter(|node| node.has_tag_name("objectgroup"))
    {
        if require_attribute(group, "name")? != "main" {
            continue;
        }
        for object in group.children().filter(|node| node.has_tag_name("object")) {
            let name = require_attribute(object, "name")?.to_string();
            let x: f32 = parse_attribute(object, "x")?;
            let y: f32 = parse_attribute(object, "y")?;
            let height: f32 = parse_attribute(object, "height")?;
            // Object anchors sit at the bottom edge in the map editor;
            // simulation rects anchor at the top-left.
            spawns.push(MapSpawn {
                name,
                position: Vec2::new(x, y - height),
            });
        }
    }

    Ok(MapData {
        grid_size,
        tile_size,
        tile_materials,
        layers,
        spawns,
    })
}

fn require_attribute<'a>(node: Node<'a, '_>, attribute: &'static str) -> Result<&'a str, MapError> {
    node.attribute(attribute)
        .ok_or_else(|| MapError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
        })
}

fn parse_attribute<T: std::str::FromStr>(
    node: Node<'_, '_>,
    attribute: &'static str,
) -> Result<T, MapError> {
    let raw = require_attribute(node, attribute)?;
    raw.parse::<T>().map_err(|_| MapError::InvalidNumber {
        attribute,
        value: raw.to_string(),
    })
}
