use std::collections::HashMap;

use macroquad::prelude::{vec2, Rect, Texture2D, Vec2};
use tracing::{debug, trace};

use crate::atlas::batch::{QuadBatch, QuadBuffer};
use crate::atlas::index::AtlasIndex;
use crate::config::{depth_mode_from_property, RenderConfig, VERTEX_Z_PROPERTY};
use crate::error::{LayerError, LayerResult};
use crate::geometry::{DepthMode, LayerGeometry, Projection};
use crate::info::{LayerInfo, MapInfo};
use crate::render::draw_state::{AlphaTest, DrawStateScope, DrawStateStack};
use crate::spatial::gid::{TileFlags, TileId, GID_MASK};
use crate::spatial::grid::TileGrid;
use crate::sprite::{SceneBinding, SceneId, SpriteCache, TileSprite, WindowId};
use crate::tileset::TileSetDescriptor;

/// Everything needed to lay out one tile, computed before any sprite is
/// borrowed.
struct Placement {
    rect: Rect,
    content_size: Vec2,
    position: Vec2,
    depth: i32,
}

/// A tile layer drawn from one atlas in one batch.
///
/// The grid says which cells are occupied, the atlas index says where each
/// occupied cell lives in the batch. Every mutation goes through
/// [`set_tile_gid`](Self::set_tile_gid) or
/// [`remove_tile_at`](Self::remove_tile_at) so the two never drift apart.
pub struct TileLayer<B: QuadBatch = QuadBuffer> {
    name: String,
    geometry: LayerGeometry,
    tileset: TileSetDescriptor,
    grid: TileGrid,
    atlas: AtlasIndex,
    sprites: SpriteCache,
    batch: B,
    texture: Option<Texture2D>,
    config: RenderConfig,
    properties: HashMap<String, String>,
    depth_mode: DepthMode,
    opacity: u8,
    position: Vec2,
    gid_range: Option<(u32, u32)>,
}

impl TileLayer<QuadBuffer> {
    /// Builds the layer and populates the batch from `layer.data`.
    pub fn new(
        tileset: TileSetDescriptor,
        layer: LayerInfo,
        map: &MapInfo,
        config: RenderConfig,
    ) -> LayerResult<Self> {
        let total = layer.width as usize * layer.height as usize;
        let capacity = (total as f32 * 0.35) as usize + 1;
        Self::with_batch(tileset, layer, map, config, QuadBuffer::with_capacity(capacity))
    }
}

impl<B: QuadBatch> TileLayer<B> {
    pub fn with_batch(
        tileset: TileSetDescriptor,
        layer: LayerInfo,
        map: &MapInfo,
        config: RenderConfig,
        batch: B,
    ) -> LayerResult<Self> {
        let geometry = LayerGeometry::new(map.projection, map.tile_size(), layer.width, layer.height);
        let position = geometry.layer_offset(layer.offset())?;
        let depth_mode =
            depth_mode_from_property(layer.properties.get(VERTEX_Z_PROPERTY).map(String::as_str));
        if depth_mode == DepthMode::Automatic && map.projection == Projection::Hexagonal {
            return Err(LayerError::UnsupportedOperation(
                "automatic depth on a hexagonal map",
            ));
        }

        let total = layer.width as usize * layer.height as usize;
        let actual = layer.data.len();
        let grid = TileGrid::new(layer.width, layer.height, layer.data).ok_or_else(|| {
            LayerError::InvalidLayerSize {
                layer: layer.name.clone(),
                expected: total,
                actual,
            }
        })?;

        let mut sprites = SpriteCache::new();
        sprites.bind(SceneBinding {
            visible: layer.visible,
            ..SceneBinding::default()
        });

        let mut this = TileLayer {
            name: layer.name,
            geometry,
            tileset,
            grid,
            atlas: AtlasIndex::with_capacity(total),
            sprites,
            batch,
            texture: None,
            config,
            properties: layer.properties,
            depth_mode,
            opacity: layer.opacity,
            position,
            gid_range: None,
        };
        this.setup_tiles(layer.min_gid, layer.max_gid)?;

        debug!(
            layer = %this.name,
            width = layer.width,
            height = layer.height,
            tiles = this.batch.len(),
            ?depth_mode,
            "tile layer populated"
        );
        Ok(this)
    }

    /// One-time bulk population in raster order through the append path.
    fn setup_tiles(&mut self, min_hint: Option<u32>, max_hint: Option<u32>) -> LayerResult<()> {
        let occupied: Vec<(u32, u32, TileId)> = self.grid.iter_occupied()?.collect();
        if occupied.is_empty() {
            return Ok(());
        }

        let mut min_gid = min_hint.unwrap_or(u32::MAX);
        let mut max_gid = max_hint.unwrap_or(0);
        for &(x, y, id) in &occupied {
            self.append_tile(x, y, id)?;
            min_gid = min_gid.min(id.clean());
            max_gid = max_gid.max(id.clean());
        }
        self.gid_range = Some((min_gid, max_gid));

        let first_gid = self.tileset.first_gid;
        let last_gid = self.tileset.last_gid().unwrap_or(GID_MASK);
        if min_gid < first_gid || max_gid > last_gid {
            return Err(LayerError::MultiTilesetViolation {
                min_gid,
                max_gid,
                first_gid,
                last_gid,
            });
        }
        Ok(())
    }

    fn placement(&self, x: u32, y: u32, id: TileId) -> LayerResult<Placement> {
        let rect = self.tileset.rect_for_gid(id.raw());
        Ok(Placement {
            rect,
            content_size: self.config.content_size(vec2(rect.w, rect.h)),
            position: self.geometry.position_at(x, y),
            depth: self.geometry.depth_at(x, y, self.depth_mode)?,
        })
    }

    fn apply(sprite: &mut TileSprite, p: &Placement, coord: (u32, u32), id: TileId, opacity: u8) {
        let slot = sprite.atlas_slot;
        sprite.rebind(p.rect, p.content_size);
        sprite.place(coord, id, p.position, p.depth, opacity);
        sprite.atlas_slot = slot;
    }

    fn append_tile(&mut self, x: u32, y: u32, id: TileId) -> LayerResult<()> {
        let z = self.grid.z_of(x, y)?;
        let p = self.placement(x, y, id)?;
        let slot = self.atlas.len()?;

        let scratch = self.sprites.rebind_scratch(p.rect, p.content_size);
        scratch.place((x, y), id, p.position, p.depth, self.opacity);
        scratch.atlas_slot = slot;
        self.batch.insert_quad(scratch, slot);
        // after the quad, so the slot count above stays the insertion slot
        self.atlas.append_slot(z)?;
        Ok(())
    }

    fn insert_tile(&mut self, x: u32, y: u32, id: TileId) -> LayerResult<()> {
        let z = self.grid.z_of(x, y)?;
        let p = self.placement(x, y, id)?;
        let slot = self.atlas.insert_slot(z, &mut self.sprites)?;

        let scratch = self.sprites.rebind_scratch(p.rect, p.content_size);
        scratch.place((x, y), id, p.position, p.depth, self.opacity);
        scratch.atlas_slot = slot;
        self.batch.insert_quad(scratch, slot);
        self.grid.set(x, y, id)?;
        trace!(layer = %self.name, x, y, gid = id.clean(), slot, "tile inserted");
        Ok(())
    }

    fn update_tile(&mut self, x: u32, y: u32, id: TileId) -> LayerResult<()> {
        let z = self.grid.z_of(x, y)?;
        let p = self.placement(x, y, id)?;
        let slot = self.atlas.find_existing(z)?;

        let opacity = self.opacity;
        match self.sprites.get_mut(z) {
            Some(sprite) => {
                Self::apply(sprite, &p, (x, y), id, opacity);
                self.batch.update_quad(sprite);
            }
            None => {
                let scratch = self.sprites.rebind_scratch(p.rect, p.content_size);
                scratch.place((x, y), id, p.position, p.depth, opacity);
                scratch.atlas_slot = slot;
                self.batch.update_quad(scratch);
            }
        }
        self.grid.set(x, y, id)?;
        trace!(layer = %self.name, x, y, gid = id.clean(), slot, "tile updated");
        Ok(())
    }

    fn ensure_active(&self) -> LayerResult<()> {
        if self.is_released() {
            return Err(LayerError::ReleasedState);
        }
        Ok(())
    }

    /// The addressable sprite for `(x, y)`, materialized on first access.
    /// `None` for an empty cell. The sprite already belongs to the batch;
    /// edits to it reach the screen on the next [`visit`](Self::visit).
    pub fn tile_at(&mut self, x: u32, y: u32) -> LayerResult<Option<&mut TileSprite>> {
        self.ensure_active()?;
        let id = self.grid.raw(x, y)?;
        if id.is_empty() {
            return Ok(None);
        }
        let z = self.grid.z_of(x, y)?;

        if !self.sprites.contains(z) {
            let p = self.placement(x, y, id)?;
            let slot = self.atlas.find_existing(z)?;
            let mut sprite = TileSprite::new(p.rect, p.content_size);
            sprite.place((x, y), id, p.position, p.depth, self.opacity);
            sprite.atlas_slot = slot;
            let sprite = self.sprites.insert(z, sprite);
            self.batch.update_quad(sprite);
            trace!(layer = %self.name, x, y, slot, "tile sprite materialized");
        }
        Ok(self.sprites.get_mut(z))
    }

    /// The sprite for `(x, y)` if one was already materialized.
    pub fn sprite_at(&self, x: u32, y: u32) -> LayerResult<Option<&TileSprite>> {
        self.ensure_active()?;
        let z = self.grid.z_of(x, y)?;
        Ok(self.sprites.get(z))
    }

    /// `(gid, flags)` stored at `(x, y)`.
    pub fn tile_gid_at(&self, x: u32, y: u32) -> LayerResult<(u32, TileFlags)> {
        self.ensure_active()?;
        self.grid.get(x, y)
    }

    pub fn set_tile_gid(&mut self, gid: u32, x: u32, y: u32) -> LayerResult<()> {
        self.set_tile_gid_with_flags(gid, x, y, TileFlags::NONE)
    }

    /// Places `gid` at `(x, y)`, replacing whatever was there. A gid of `0`
    /// clears the cell. Flag bits inside `gid` are ignored; pass them in
    /// `flags`. Any other gid must belong to the bound tileset.
    pub fn set_tile_gid_with_flags(
        &mut self,
        gid: u32,
        x: u32,
        y: u32,
        flags: TileFlags,
    ) -> LayerResult<()> {
        self.ensure_active()?;
        self.grid.z_of(x, y)?;
        let gid = gid & GID_MASK;
        let first_gid = self.tileset.first_gid;
        let last_gid = self.tileset.last_gid().unwrap_or(GID_MASK);
        if gid != 0 && (gid < first_gid || gid > last_gid) {
            return Err(LayerError::InvalidGid {
                gid,
                first_gid,
                last_gid,
            });
        }

        let (current_gid, current_flags) = self.grid.get(x, y)?;
        if current_gid == gid && current_flags == flags {
            return Ok(());
        }

        let id = TileId::encode(gid, flags);
        if gid == 0 {
            self.remove_tile_at(x, y)
        } else if current_gid == 0 {
            self.insert_tile(x, y, id)
        } else {
            self.update_tile(x, y, id)
        }
    }

    /// Clears `(x, y)`. Does nothing when the cell is already empty.
    pub fn remove_tile_at(&mut self, x: u32, y: u32) -> LayerResult<()> {
        self.ensure_active()?;
        let id = self.grid.raw(x, y)?;
        if id.is_empty() {
            return Ok(());
        }
        let z = self.grid.z_of(x, y)?;

        // the removed sprite keeps its slot, so renumbering skips it
        let slot = self.atlas.remove_slot(z, &mut self.sprites)?;
        let dropped = self.sprites.remove(z).is_some();
        self.batch.remove_quad_at(slot);
        self.grid.set(x, y, TileId::EMPTY)?;
        trace!(layer = %self.name, x, y, slot, dropped, "tile removed");
        Ok(())
    }

    /// Tiles are managed through the gid API only.
    pub fn add_child(&mut self, _sprite: TileSprite) -> LayerResult<()> {
        Err(LayerError::UnsupportedOperation(
            "add_child on a tile layer; use set_tile_gid or tile_at",
        ))
    }

    pub fn remove_child(&mut self, _sprite: &TileSprite) -> LayerResult<()> {
        Err(LayerError::UnsupportedOperation(
            "remove_child on a tile layer; use remove_tile_at",
        ))
    }

    /// Drops the cells, the atlas index and every sprite. Quads already in
    /// the batch keep drawing, but no tile can be queried or edited again.
    pub fn release_map(&mut self) {
        self.grid.release();
        self.atlas.release();
        self.sprites.release_all();
        debug!(layer = %self.name, "tile map released");
    }

    pub fn is_released(&self) -> bool {
        self.grid.is_released() || self.atlas.is_released()
    }

    /// Value of a custom layer property, or `""`.
    pub fn property_named(&self, name: &str) -> &str {
        self.properties.get(name).map(String::as_str).unwrap_or("")
    }

    /// Where the bottom-left of cell `(x, y)` sits in layer space.
    pub fn position_at(&self, x: u32, y: u32) -> Vec2 {
        self.geometry.position_at(x, y)
    }

    /// Binds the atlas texture. When the tileset did not know its column
    /// count, every quad is rebuilt against the image size.
    pub fn bind_texture(&mut self, texture: Texture2D) -> LayerResult<()> {
        let learned_size = self.tileset.image_size().is_none();
        self.tileset
            .set_image_size(vec2(texture.width(), texture.height()));
        self.texture = Some(texture);
        if learned_size && self.tileset.columns == 0 && !self.is_released() {
            self.refresh_quads()?;
        }
        Ok(())
    }

    fn refresh_quads(&mut self) -> LayerResult<()> {
        let width = self.geometry.width as usize;
        let keys = self.atlas.keys()?.to_vec();
        for z in keys {
            let (x, y) = ((z % width) as u32, (z / width) as u32);
            let id = self.grid.raw(x, y)?;
            self.update_tile(x, y, id)?;
        }
        Ok(())
    }

    pub fn bind_scene(&mut self, scene: Option<SceneId>) {
        let binding = SceneBinding {
            scene,
            ..self.sprites.binding()
        };
        self.sprites.bind(binding);
    }

    pub fn bind_window(&mut self, window: Option<WindowId>) {
        let binding = SceneBinding {
            window,
            ..self.sprites.binding()
        };
        self.sprites.bind(binding);
    }

    pub fn set_visible(&mut self, visible: bool) {
        let binding = SceneBinding {
            visible,
            ..self.sprites.binding()
        };
        self.sprites.bind(binding);
    }

    pub fn is_visible(&self) -> bool {
        self.sprites.binding().visible
    }

    pub fn scene_binding(&self) -> SceneBinding {
        self.sprites.binding()
    }

    /// Per-frame entry point. Skips hidden layers and layers without a
    /// window, otherwise pushes sprite edits into the batch and draws.
    pub fn visit<S: DrawStateStack + ?Sized>(&mut self, host: &mut S) {
        let binding = self.sprites.binding();
        if !binding.visible || binding.window.is_none() {
            return;
        }
        for (_, sprite) in self.sprites.iter() {
            self.batch.update_quad(sprite);
        }
        self.draw(host);
    }

    /// Draws the batch with the alpha test on. The override is popped again
    /// when this returns, texture or not.
    pub fn draw<S: DrawStateStack + ?Sized>(&self, host: &mut S) {
        let _alpha = DrawStateScope::alpha_test(host, AlphaTest::default());
        if let Some(texture) = &self.texture {
            let origin = vec2(self.position.x, -self.position.y);
            self.batch
                .draw(texture, origin, self.geometry.content_size().y);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer_size(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    pub fn map_tile_size(&self) -> Vec2 {
        self.geometry.tile_size
    }

    pub fn projection(&self) -> Projection {
        self.geometry.projection
    }

    pub fn content_size(&self) -> Vec2 {
        self.geometry.content_size()
    }

    /// Layer position derived from its offset.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn depth_mode(&self) -> DepthMode {
        self.depth_mode
    }

    /// Smallest and largest gid seen during population.
    pub fn gid_range(&self) -> Option<(u32, u32)> {
        self.gid_range
    }

    pub fn tileset(&self) -> &TileSetDescriptor {
        &self.tileset
    }

    pub fn batch(&self) -> &B {
        &self.batch
    }

    /// z-keys of the occupied cells in slot order.
    pub fn atlas_keys(&self) -> LayerResult<&[usize]> {
        self.atlas.keys()
    }

    pub fn cells(&self) -> LayerResult<&[u32]> {
        self.grid.cells()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}
