//! Editable TMX tile layers for Macroquad, drawn from one atlas in one batch.

mod atlas {
    pub mod batch;
    pub mod index;
}
mod config;
mod error;
mod geometry;
mod info;
mod layer;
mod render {
    pub mod draw_state;
}
mod spatial {
    pub mod gid;
    pub mod grid;
}
mod sprite;
mod tileset;

pub use atlas::batch::{Quad, QuadBatch, QuadBuffer};
pub use atlas::index::{AtlasIndex, SlotHolder};
pub use config::{depth_mode_from_property, RenderConfig, VERTEX_Z_PROPERTY};
pub use error::{LayerError, LayerResult};
pub use geometry::{DepthMode, LayerGeometry, Projection};
pub use info::{LayerInfo, MapInfo};
pub use layer::TileLayer;
pub use render::draw_state::{AlphaTest, AlphaTestMaterial, DrawStateScope, DrawStateStack};
pub use spatial::gid::{TileFlags, TileId, FLIP_ALL, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
pub use spatial::grid::TileGrid;
pub use sprite::{SceneBinding, SceneId, SpriteCache, TileOrientation, TileSprite, WindowId};
pub use tileset::TileSetDescriptor;
