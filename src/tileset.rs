use macroquad::prelude::{vec2, Rect, Vec2};
use serde::Deserialize;
use tracing::trace;

use crate::spatial::gid::GID_MASK;

/// A single-image tileset as the layer sees it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileSetDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "firstgid")]
    pub first_gid: u32,
    /// Number of tiles in the image; `0` when unknown.
    #[serde(default, rename = "tilecount")]
    pub tile_count: u32,
    #[serde(rename = "tilewidth")]
    pub tile_w: u32,
    #[serde(rename = "tileheight")]
    pub tile_h: u32,
    #[serde(default)]
    pub spacing: u32,
    #[serde(default)]
    pub margin: u32,
    /// Tiles per row; `0` to derive it from the image size.
    #[serde(default)]
    pub columns: u32,
    #[serde(skip)]
    image_size: Option<Vec2>,
}

impl TileSetDescriptor {
    pub fn new(first_gid: u32, tile_w: u32, tile_h: u32, columns: u32, tile_count: u32) -> Self {
        TileSetDescriptor {
            name: String::new(),
            first_gid,
            tile_count,
            tile_w,
            tile_h,
            spacing: 0,
            margin: 0,
            columns,
            image_size: None,
        }
    }

    pub fn image_size(&self) -> Option<Vec2> {
        self.image_size
    }

    /// Records the pixel size of the bound texture. Only the first call wins.
    pub fn set_image_size(&mut self, size: Vec2) {
        if self.image_size.is_none() {
            self.image_size = Some(size);
        } else {
            trace!(tileset = %self.name, "image size already bound");
        }
    }

    /// Last gid owned by this tileset, if the tile count is known. Capped at
    /// the largest encodable gid.
    pub fn last_gid(&self) -> Option<u32> {
        (self.tile_count > 0).then(|| {
            self.first_gid
                .saturating_add(self.tile_count - 1)
                .min(GID_MASK)
        })
    }

    fn columns_in_image(&self) -> u32 {
        if self.columns > 0 {
            return self.columns;
        }
        let step = (self.tile_w + self.spacing) as f32;
        self.image_size
            .map(|size| ((size.x - (self.margin * 2) as f32 + self.spacing as f32) / step) as u32)
            .unwrap_or(1)
            .max(1)
    }

    /// Source rectangle of `gid` inside the atlas image, in pixels.
    pub fn rect_for_gid(&self, gid: u32) -> Rect {
        let local = (gid & GID_MASK).saturating_sub(self.first_gid);
        let cols = self.columns_in_image();
        let col = local % cols;
        let row = local / cols;
        let sx = self.margin + col * (self.tile_w + self.spacing);
        let sy = self.margin + row * (self.tile_h + self.spacing);
        Rect::new(sx as f32, sy as f32, self.tile_w as f32, self.tile_h as f32)
    }

    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_w as f32, self.tile_h as f32)
    }
}
