//! Read-only descriptors handed to a layer by whoever parsed the map.

use std::collections::HashMap;

use macroquad::prelude::{vec2, Vec2};
use serde::Deserialize;

use crate::geometry::Projection;

/// Map-wide settings a layer needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapInfo {
    #[serde(rename = "orientation")]
    pub projection: Projection,
    #[serde(rename = "tilewidth")]
    pub tile_w: u32,
    #[serde(rename = "tileheight")]
    pub tile_h: u32,
}

impl MapInfo {
    pub fn new(projection: Projection, tile_w: u32, tile_h: u32) -> Self {
        MapInfo {
            projection,
            tile_w,
            tile_h,
        }
    }

    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_w as f32, self.tile_h as f32)
    }
}

fn default_true() -> bool {
    true
}
fn opaque() -> u8 {
    255
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerInfo {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Raw gids, flip flags included, row-major.
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "opaque")]
    pub opacity: u8,
    /// Layer offset in tiles.
    #[serde(default)]
    pub offsetx: f32,
    #[serde(default)]
    pub offsety: f32,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Hints folded into the gid range check after population.
    #[serde(default)]
    pub min_gid: Option<u32>,
    #[serde(default)]
    pub max_gid: Option<u32>,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>, width: u32, height: u32, data: Vec<u32>) -> Self {
        LayerInfo {
            name: name.into(),
            width,
            height,
            data,
            visible: true,
            opacity: 255,
            offsetx: 0.0,
            offsety: 0.0,
            properties: HashMap::new(),
            min_gid: None,
            max_gid: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offsetx = offset.x;
        self.offsety = offset.y;
        self
    }

    pub fn offset(&self) -> Vec2 {
        vec2(self.offsetx, self.offsety)
    }
}
