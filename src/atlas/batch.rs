use macroquad::prelude::*;

use crate::sprite::TileSprite;

/// One textured rectangle in the atlas buffer, copied out of a sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub src: Rect,
    /// Bottom-left of the unrotated quad in layer space (Y-up).
    pub origin: Vec2,
    pub size: Vec2,
    /// Point the quad rotates around, in layer space.
    pub pivot: Vec2,
    /// Clockwise, in degrees.
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub depth: i32,
    pub alpha: u8,
}

impl From<&TileSprite> for Quad {
    fn from(sprite: &TileSprite) -> Self {
        Quad {
            src: sprite.texture_rect,
            origin: sprite.origin(),
            size: sprite.content_size,
            pivot: sprite.position,
            rotation: sprite.rotation,
            flip_x: sprite.flip_x,
            flip_y: sprite.flip_y,
            depth: sprite.depth,
            alpha: sprite.opacity,
        }
    }
}

/// The flat quad array a layer drives. Slot = position in the array.
pub trait QuadBatch {
    fn insert_quad(&mut self, sprite: &TileSprite, slot: usize);
    fn remove_quad_at(&mut self, slot: usize);
    /// Rewrites the quad at `sprite.atlas_slot`.
    fn update_quad(&mut self, sprite: &TileSprite);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Emits every quad. `origin` is the screen position of the layer's
    /// Y-up origin, `height` the layer's pixel height.
    fn draw(&self, texture: &Texture2D, origin: Vec2, height: f32);
}

/// In-memory quad buffer drawn with macroquad in one pass.
#[derive(Debug, Clone, Default)]
pub struct QuadBuffer {
    quads: Vec<Quad>,
}

impl QuadBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        QuadBuffer {
            quads: Vec::with_capacity(capacity),
        }
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    pub fn get(&self, slot: usize) -> Option<&Quad> {
        self.quads.get(slot)
    }
}

impl QuadBatch for QuadBuffer {
    fn insert_quad(&mut self, sprite: &TileSprite, slot: usize) {
        let slot = slot.min(self.quads.len());
        self.quads.insert(slot, Quad::from(sprite));
    }

    fn remove_quad_at(&mut self, slot: usize) {
        if slot < self.quads.len() {
            self.quads.remove(slot);
        }
    }

    fn update_quad(&mut self, sprite: &TileSprite) {
        if let Some(quad) = self.quads.get_mut(sprite.atlas_slot) {
            *quad = Quad::from(sprite);
        }
    }

    fn len(&self) -> usize {
        self.quads.len()
    }

    fn draw(&self, texture: &Texture2D, origin: Vec2, height: f32) {
        let to_screen = |p: Vec2| vec2(origin.x + p.x, origin.y + height - p.y);
        for quad in &self.quads {
            let top_left = to_screen(vec2(quad.origin.x, quad.origin.y + quad.size.y));
            draw_texture_ex(
                texture,
                top_left.x,
                top_left.y,
                Color::from_rgba(255, 255, 255, quad.alpha),
                DrawTextureParams {
                    dest_size: Some(quad.size),
                    source: Some(quad.src),
                    rotation: quad.rotation.to_radians(),
                    flip_x: quad.flip_x,
                    flip_y: quad.flip_y,
                    pivot: Some(to_screen(quad.pivot)),
                },
            );
        }
    }
}
