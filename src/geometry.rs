//! Grid coordinate to world placement for the supported projections.
//!
//! Output space is Y-up: row 0 of the grid ends up at the visual top, which
//! means the largest Y value.

use macroquad::prelude::{vec2, Vec2};
use serde::Deserialize;

use crate::error::{LayerError, LayerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[serde(alias = "ortho")]
    Orthogonal,
    #[serde(alias = "iso")]
    Isometric,
    #[serde(alias = "hex")]
    Hexagonal,
}

/// How tiles of a layer get their depth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    Fixed(i32),
    Automatic,
}

impl Default for DepthMode {
    fn default() -> Self {
        DepthMode::Fixed(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerGeometry {
    pub projection: Projection,
    /// Size of a map cell in pixels.
    pub tile_size: Vec2,
    pub width: u32,
    pub height: u32,
}

impl LayerGeometry {
    pub fn new(projection: Projection, tile_size: Vec2, width: u32, height: u32) -> Self {
        LayerGeometry {
            projection,
            tile_size,
            width,
            height,
        }
    }

    /// Pixel size of the whole layer.
    pub fn content_size(&self) -> Vec2 {
        vec2(
            self.width as f32 * self.tile_size.x,
            self.height as f32 * self.tile_size.y,
        )
    }

    pub fn position_at(&self, x: u32, y: u32) -> Vec2 {
        match self.projection {
            Projection::Orthogonal => self.ortho_position(x as f32, y as f32),
            Projection::Isometric => self.iso_position(x as f32, y as f32),
            Projection::Hexagonal => self.hex_position(x, y),
        }
    }

    fn ortho_position(&self, x: f32, y: f32) -> Vec2 {
        let h = self.height as f32;
        vec2(x * self.tile_size.x, (h - y - 1.0) * self.tile_size.y)
    }

    fn iso_position(&self, x: f32, y: f32) -> Vec2 {
        let w = self.width as f32;
        let h = self.height as f32;
        vec2(
            self.tile_size.x / 2.0 * (w + x - y - 1.0),
            self.tile_size.y / 2.0 * ((h * 2.0 - x - y) - 2.0),
        )
    }

    fn hex_position(&self, x: u32, y: u32) -> Vec2 {
        let diff_y = if x % 2 == 1 {
            -self.tile_size.y / 2.0
        } else {
            0.0
        };
        let h = self.height as f32;
        vec2(
            x as f32 * self.tile_size.x * 3.0 / 4.0,
            (h - y as f32 - 1.0) * self.tile_size.y + diff_y,
        )
    }

    /// Converts a layer offset given in tiles into a pixel position.
    pub fn layer_offset(&self, offset: Vec2) -> LayerResult<Vec2> {
        let ts = self.tile_size;
        match self.projection {
            Projection::Orthogonal => Ok(vec2(offset.x * ts.x, -offset.y * ts.y)),
            Projection::Isometric => Ok(vec2(
                ts.x / 2.0 * (offset.x - offset.y),
                ts.y / 2.0 * (-offset.x - offset.y),
            )),
            Projection::Hexagonal if offset == Vec2::ZERO => Ok(Vec2::ZERO),
            Projection::Hexagonal => Err(LayerError::UnsupportedOperation(
                "layer offset on a hexagonal map",
            )),
        }
    }

    pub fn depth_at(&self, x: u32, y: u32, mode: DepthMode) -> LayerResult<i32> {
        match mode {
            DepthMode::Fixed(value) => Ok(value),
            DepthMode::Automatic => match self.projection {
                Projection::Isometric => {
                    let max_extent = self.width as i64 + self.height as i64;
                    Ok(-(max_extent - (x as i64 + y as i64)) as i32)
                }
                Projection::Orthogonal => Ok(-(self.height as i64 - y as i64) as i32),
                Projection::Hexagonal => Err(LayerError::UnsupportedOperation(
                    "automatic depth on a hexagonal map",
                )),
            },
        }
    }
}
