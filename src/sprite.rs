//! Addressable per-tile sprites, created only when a cell is asked for.

use std::collections::BTreeMap;

use macroquad::prelude::{vec2, Rect, Vec2};

use crate::atlas::index::SlotHolder;
use crate::error::{LayerError, LayerResult};
use crate::spatial::gid::{TileFlags, TileId};

pub const ANCHOR_ORIGIN: Vec2 = Vec2::ZERO;
pub const ANCHOR_MIDDLE: Vec2 = Vec2::new(0.5, 0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Scene-graph state a sprite inherits from its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBinding {
    pub scene: Option<SceneId>,
    pub window: Option<WindowId>,
    pub visible: bool,
}

impl Default for SceneBinding {
    fn default() -> Self {
        SceneBinding {
            scene: None,
            window: None,
            visible: true,
        }
    }
}

/// Rotation and mirroring produced by a tile's flag bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOrientation {
    /// Clockwise, in degrees.
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub anchor: Vec2,
}

impl TileOrientation {
    /// Tiled expresses rotation as three flips; the diagonal flip becomes a
    /// quarter turn, optionally mirrored.
    pub fn from_flags(flags: TileFlags) -> Self {
        if !flags.diagonal() {
            return TileOrientation {
                rotation: 0.0,
                flip_x: flags.horizontal(),
                flip_y: flags.vertical(),
                anchor: ANCHOR_ORIGIN,
            };
        }
        let (rotation, flip_x) = match (flags.horizontal(), flags.vertical()) {
            (true, false) => (90.0, false),
            (false, true) => (270.0, false),
            (true, true) => (90.0, true),
            (false, false) => (270.0, true),
        };
        TileOrientation {
            rotation,
            flip_x,
            flip_y: false,
            anchor: ANCHOR_MIDDLE,
        }
    }
}

/// A renderable proxy for exactly one occupied cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSprite {
    pub(crate) coord: (u32, u32),
    pub(crate) gid: TileId,
    pub(crate) atlas_slot: usize,
    /// Source rectangle in the atlas image, in texels.
    pub texture_rect: Rect,
    pub content_size: Vec2,
    /// Where the anchor point sits, in layer space (Y-up).
    pub position: Vec2,
    pub anchor: Vec2,
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub depth: i32,
    pub opacity: u8,
    pub binding: SceneBinding,
}

impl Default for TileSprite {
    fn default() -> Self {
        TileSprite {
            coord: (0, 0),
            gid: TileId::EMPTY,
            atlas_slot: 0,
            texture_rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            content_size: Vec2::ZERO,
            position: Vec2::ZERO,
            anchor: ANCHOR_ORIGIN,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            depth: 0,
            opacity: 255,
            binding: SceneBinding::default(),
        }
    }
}

impl TileSprite {
    pub fn new(texture_rect: Rect, content_size: Vec2) -> Self {
        let mut sprite = TileSprite::default();
        sprite.rebind(texture_rect, content_size);
        sprite
    }

    /// Points the sprite at a new atlas rectangle and clears every per-tile
    /// attribute, keeping only the scene binding.
    pub fn rebind(&mut self, texture_rect: Rect, content_size: Vec2) {
        *self = TileSprite {
            texture_rect,
            content_size,
            binding: self.binding,
            ..TileSprite::default()
        };
    }

    /// Places the sprite at its cell and applies the flip bits of `gid`.
    /// `cell_position` is the unrotated bottom-left of the cell.
    pub fn place(&mut self, coord: (u32, u32), gid: TileId, cell_position: Vec2, depth: i32, opacity: u8) {
        let orientation = TileOrientation::from_flags(gid.flags());
        self.coord = coord;
        self.gid = gid;
        self.depth = depth;
        self.opacity = opacity;
        self.rotation = orientation.rotation;
        self.flip_x = orientation.flip_x;
        self.flip_y = orientation.flip_y;
        self.anchor = orientation.anchor;
        self.position = if gid.flip_d() {
            // recentred so the quarter turn happens around the cell centre
            cell_position + vec2(self.content_size.y / 2.0, self.content_size.x / 2.0)
        } else {
            cell_position
        };
    }

    pub fn coord(&self) -> (u32, u32) {
        self.coord
    }

    pub fn gid(&self) -> TileId {
        self.gid
    }

    /// Position of this tile's quad in the atlas buffer. Owned by the layer.
    pub fn atlas_slot(&self) -> usize {
        self.atlas_slot
    }

    /// Bottom-left corner of the unrotated quad, in layer space.
    pub fn origin(&self) -> Vec2 {
        self.position - self.anchor * self.content_size
    }
}

/// Materialized sprites keyed by z, plus the scratch sprite used for quads
/// that nobody addressed individually.
#[derive(Debug, Default)]
pub struct SpriteCache {
    sprites: BTreeMap<usize, TileSprite>,
    scratch: TileSprite,
    binding: SceneBinding,
}

impl SpriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn get(&self, z: usize) -> Option<&TileSprite> {
        self.sprites.get(&z)
    }

    pub fn get_mut(&mut self, z: usize) -> Option<&mut TileSprite> {
        self.sprites.get_mut(&z)
    }

    pub fn contains(&self, z: usize) -> bool {
        self.sprites.contains_key(&z)
    }

    /// Caches `sprite` under `z`, handing it the current scene binding.
    pub fn insert(&mut self, z: usize, mut sprite: TileSprite) -> &mut TileSprite {
        sprite.binding = self.binding;
        let entry = self.sprites.entry(z).or_default();
        *entry = sprite;
        entry
    }

    pub fn remove(&mut self, z: usize) -> Option<TileSprite> {
        self.sprites.remove(&z)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TileSprite)> {
        self.sprites.iter().map(|(&z, s)| (z, s))
    }

    /// Resets the scratch sprite onto `rect`. Nothing of the previous tile
    /// survives the rebind.
    pub fn rebind_scratch(&mut self, rect: Rect, content_size: Vec2) -> &mut TileSprite {
        self.scratch.rebind(rect, content_size);
        &mut self.scratch
    }

    pub fn binding(&self) -> SceneBinding {
        self.binding
    }

    /// Forwards a scene-graph change to every sprite, scratch included.
    pub fn bind(&mut self, binding: SceneBinding) {
        self.binding = binding;
        self.scratch.binding = binding;
        for sprite in self.sprites.values_mut() {
            sprite.binding = binding;
        }
    }

    pub fn release_all(&mut self) {
        self.sprites.clear();
    }
}

impl SlotHolder for SpriteCache {
    fn shift_slots(&mut self, affected: impl Fn(usize) -> bool, delta: isize) -> LayerResult<()> {
        for (&z, sprite) in self.sprites.iter_mut() {
            if !affected(sprite.atlas_slot) {
                continue;
            }
            let shifted = sprite.atlas_slot.checked_add_signed(delta);
            debug_assert!(shifted.is_some(), "atlas slot underflow for z={z}");
            sprite.atlas_slot = shifted.ok_or(LayerError::AtlasSlotUnderflow { z })?;
        }
        Ok(())
    }
}
