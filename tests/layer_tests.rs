// tests/layer_tests.rs

use macroquad_tmx_layer::{
    AlphaTest, DrawStateStack, LayerError, LayerInfo, MapInfo, Projection, QuadBatch,
    RenderConfig, SceneId, TileFlags, TileLayer, TileSetDescriptor, WindowId, FLIP_H,
};

fn tileset() -> TileSetDescriptor {
    TileSetDescriptor::new(1, 16, 16, 4, 16)
}

fn ortho_layer(width: u32, height: u32, data: Vec<u32>) -> TileLayer {
    TileLayer::new(
        tileset(),
        LayerInfo::new("test", width, height, data),
        &MapInfo::new(Projection::Orthogonal, 16, 16),
        RenderConfig::default(),
    )
    .expect("layer should build")
}

/// Checks that cells, atlas keys, sprites and quads all agree.
fn assert_consistent(layer: &TileLayer) {
    let (width, height) = layer.layer_size();
    let keys = layer.atlas_keys().unwrap();
    let cells = layer.cells().unwrap();

    assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys not ascending: {keys:?}");
    let occupied = cells.iter().filter(|&&c| c & macroquad_tmx_layer::GID_MASK != 0).count();
    assert_eq!(keys.len(), occupied);
    assert_eq!(layer.batch().len(), occupied);

    for (slot, &z) in keys.iter().enumerate() {
        assert_ne!(cells[z] & macroquad_tmx_layer::GID_MASK, 0);
        let quad = layer.batch().get(slot).unwrap();
        assert_eq!(quad.src, layer.tileset().rect_for_gid(cells[z]));
    }

    for y in 0..height {
        for x in 0..width {
            if let Some(sprite) = layer.sprite_at(x, y).unwrap() {
                let z = (x + y * width) as usize;
                assert_eq!(keys[sprite.atlas_slot()], z);
            }
        }
    }
}

#[test]
fn scenario_clearing_a_cell_shifts_later_sprites_down() {
    let mut layer = ortho_layer(2, 2, vec![0; 4]);
    layer.set_tile_gid(1, 0, 0).unwrap();
    layer.set_tile_gid(2, 1, 0).unwrap();
    layer.set_tile_gid(3, 0, 1).unwrap();
    assert_eq!(layer.atlas_keys().unwrap(), &[0, 1, 2]);

    let slot = layer.tile_at(0, 1).unwrap().expect("occupied").atlas_slot();
    assert_eq!(slot, 2);

    layer.set_tile_gid(0, 1, 0).unwrap();
    assert_eq!(layer.atlas_keys().unwrap(), &[0, 2]);
    assert_eq!(layer.sprite_at(0, 1).unwrap().unwrap().atlas_slot(), 1);
    assert_consistent(&layer);
}

#[test]
fn flag_bits_on_empty_cells_read_back_as_empty() {
    let mut layer = ortho_layer(2, 1, vec![FLIP_H, 2]);
    assert_eq!(layer.tile_gid_at(0, 0).unwrap(), (0, TileFlags::NONE));
    assert_eq!(layer.atlas_keys().unwrap(), &[1]);

    layer.set_tile_gid(0, 0, 0).unwrap();
    assert_eq!(layer.tile_gid_at(0, 0).unwrap(), (0, TileFlags::NONE));
    assert!(layer.tile_at(0, 0).unwrap().is_none());
    assert_consistent(&layer);
}

#[test]
fn set_then_get_round_trips_gid_and_flags() {
    let mut layer = ortho_layer(3, 3, vec![0; 9]);
    let all = [
        TileFlags::NONE,
        TileFlags::HORIZONTAL,
        TileFlags::VERTICAL | TileFlags::DIAGONAL,
        TileFlags::from_parts(true, true, true),
    ];
    for (i, flags) in all.into_iter().enumerate() {
        let (x, y, gid) = (i as u32 % 3, i as u32 / 3, 1 + i as u32 * 3);
        layer.set_tile_gid_with_flags(gid, x, y, flags).unwrap();
        assert_eq!(layer.tile_gid_at(x, y).unwrap(), (gid, flags));
    }
    assert_consistent(&layer);
}

#[test]
fn insert_shifts_only_sprites_at_or_after_the_insertion_point() {
    let mut layer = ortho_layer(4, 1, vec![1, 0, 2, 3]);
    layer.tile_at(0, 0).unwrap();
    layer.tile_at(2, 0).unwrap();
    layer.tile_at(3, 0).unwrap();

    layer.set_tile_gid(4, 1, 0).unwrap();

    assert_eq!(layer.sprite_at(0, 0).unwrap().unwrap().atlas_slot(), 0);
    assert_eq!(layer.sprite_at(2, 0).unwrap().unwrap().atlas_slot(), 2);
    assert_eq!(layer.sprite_at(3, 0).unwrap().unwrap().atlas_slot(), 3);
    assert_eq!(layer.sprite_count(), 3);
    assert_consistent(&layer);
}

#[test]
fn remove_shifts_only_sprites_after_the_removed_slot() {
    let mut layer = ortho_layer(4, 1, vec![1, 2, 3, 4]);
    layer.tile_at(0, 0).unwrap();
    layer.tile_at(1, 0).unwrap();
    layer.tile_at(3, 0).unwrap();

    layer.remove_tile_at(1, 0).unwrap();

    assert!(layer.sprite_at(1, 0).unwrap().is_none());
    assert_eq!(layer.sprite_at(0, 0).unwrap().unwrap().atlas_slot(), 0);
    assert_eq!(layer.sprite_at(3, 0).unwrap().unwrap().atlas_slot(), 2);
    assert_eq!(layer.sprite_count(), 2);
    assert_consistent(&layer);
}

#[test]
fn removing_an_empty_cell_changes_nothing() {
    let mut layer = ortho_layer(2, 2, vec![1, 0, 0, 2]);
    layer.tile_at(1, 1).unwrap();
    let before_keys = layer.atlas_keys().unwrap().to_vec();
    let before_quads = layer.batch().quads().to_vec();

    layer.remove_tile_at(1, 0).unwrap();
    layer.set_tile_gid(0, 0, 1).unwrap();

    assert_eq!(layer.atlas_keys().unwrap(), before_keys.as_slice());
    assert_eq!(layer.batch().quads(), before_quads.as_slice());
    assert_eq!(layer.sprite_count(), 1);
}

#[test]
fn raster_fill_matches_bulk_population() {
    let data: Vec<u32> = (1..=16).collect();
    let bulk = ortho_layer(4, 4, data.clone());

    let mut incremental = ortho_layer(4, 4, vec![0; 16]);
    for y in 0..4 {
        for x in 0..4 {
            incremental.set_tile_gid(data[(x + y * 4) as usize], x, y).unwrap();
        }
    }

    assert_eq!(incremental.cells().unwrap(), bulk.cells().unwrap());
    assert_eq!(incremental.atlas_keys().unwrap().len(), bulk.atlas_keys().unwrap().len());
    assert_eq!(incremental.batch().quads(), bulk.batch().quads());
}

#[test]
fn diagonal_flags_follow_the_rotation_table() {
    let rows = [
        // (horizontal, vertical, rotation, mirror)
        (true, false, 90.0, false),
        (false, true, 270.0, false),
        (true, true, 90.0, true),
        (false, false, 270.0, true),
    ];
    for (h, v, rotation, mirror) in rows {
        let mut layer = ortho_layer(1, 1, vec![0]);
        layer
            .set_tile_gid_with_flags(1, 0, 0, TileFlags::from_parts(h, v, true))
            .unwrap();
        let sprite = layer.tile_at(0, 0).unwrap().unwrap();
        assert_eq!(sprite.rotation, rotation, "h={h} v={v}");
        assert_eq!(sprite.flip_x, mirror, "h={h} v={v}");
        assert!(!sprite.flip_y);
    }
}

#[test]
fn released_layer_refuses_every_cell_operation() {
    let mut layer = ortho_layer(2, 2, vec![1, 2, 3, 4]);
    layer.tile_at(0, 0).unwrap();
    layer.release_map();

    assert!(layer.is_released());
    assert_eq!(layer.sprite_count(), 0);
    for (x, y) in [(0, 0), (1, 1), (5, 5)] {
        assert_eq!(layer.tile_at(x, y).err(), Some(LayerError::ReleasedState));
        assert_eq!(layer.tile_gid_at(x, y), Err(LayerError::ReleasedState));
        assert_eq!(layer.set_tile_gid(1, x, y), Err(LayerError::ReleasedState));
        assert_eq!(layer.remove_tile_at(x, y), Err(LayerError::ReleasedState));
    }
    // the batch outlives the map
    assert_eq!(layer.batch().len(), 4);
}

#[test]
fn out_of_range_coordinates_are_reported() {
    let mut layer = ortho_layer(2, 3, vec![0; 6]);
    assert!(matches!(
        layer.tile_gid_at(2, 0),
        Err(LayerError::OutOfRange { x: 2, y: 0, width: 2, height: 3 })
    ));
    assert!(matches!(layer.set_tile_gid(1, 0, 3), Err(LayerError::OutOfRange { .. })));
    assert!(matches!(layer.remove_tile_at(9, 9), Err(LayerError::OutOfRange { .. })));
    assert!(matches!(layer.tile_at(0, 3), Err(LayerError::OutOfRange { .. })));
}

#[test]
fn churn_keeps_index_sorted_and_in_sync() {
    let (width, height) = (6u32, 5u32);
    let mut layer = ortho_layer(width, height, vec![0; 30]);
    let mut seed = 0x2545_f491_u32;
    let mut next = || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed
    };

    for step in 0..400 {
        let r = next();
        let (x, y) = (r % width, (r / width) % height);
        match r % 5 {
            0 => layer.remove_tile_at(x, y).unwrap(),
            1 => {
                layer.tile_at(x, y).unwrap();
            }
            2 => layer
                .set_tile_gid_with_flags(1 + r % 16, x, y, TileFlags::from_bits_truncate(r))
                .unwrap(),
            _ => layer.set_tile_gid(r % 17, x, y).unwrap(),
        }
        if step % 20 == 0 {
            assert_consistent(&layer);
        }
    }
    assert_consistent(&layer);
}

#[test]
fn gids_outside_the_tileset_fail_population() {
    let err = TileLayer::new(
        TileSetDescriptor::new(1, 16, 16, 4, 4),
        LayerInfo::new("l", 2, 1, vec![1, 9]),
        &MapInfo::new(Projection::Orthogonal, 16, 16),
        RenderConfig::default(),
    )
    .err();
    assert_eq!(
        err,
        Some(LayerError::MultiTilesetViolation {
            min_gid: 1,
            max_gid: 9,
            first_gid: 1,
            last_gid: 4,
        })
    );
}

#[test]
fn hexagonal_maps_reject_offsets_and_automatic_depth() {
    let map = MapInfo::new(Projection::Hexagonal, 16, 16);
    let offset = TileLayer::new(
        tileset(),
        LayerInfo::new("l", 1, 1, vec![1]).with_offset(macroquad::prelude::vec2(1.0, 0.0)),
        &map,
        RenderConfig::default(),
    );
    assert!(matches!(offset.err(), Some(LayerError::UnsupportedOperation(_))));

    let auto = TileLayer::new(
        tileset(),
        LayerInfo::new("l", 1, 1, vec![1]).with_property("cc_vertexz", "automatic"),
        &map,
        RenderConfig::default(),
    );
    assert!(matches!(auto.err(), Some(LayerError::UnsupportedOperation(_))));
}

#[test]
fn automatic_depth_reaches_sprites() {
    let mut layer = TileLayer::new(
        tileset(),
        LayerInfo::new("l", 3, 3, vec![1; 9]).with_property("cc_vertexz", "automatic"),
        &MapInfo::new(Projection::Isometric, 32, 16),
        RenderConfig::default(),
    )
    .unwrap();
    assert_eq!(layer.tile_at(1, 2).unwrap().unwrap().depth, -3);
    assert_eq!(layer.batch().quads()[0].depth, -6);
}

#[derive(Default)]
struct CountingHost {
    depth: i32,
    pushes: usize,
    last: Option<AlphaTest>,
}

impl DrawStateStack for CountingHost {
    fn push_alpha_test(&mut self, test: AlphaTest) {
        self.depth += 1;
        self.pushes += 1;
        self.last = Some(test);
    }

    fn pop_state(&mut self) {
        self.depth -= 1;
    }
}

#[test]
fn visit_scopes_the_alpha_test_around_drawing() {
    let mut layer = ortho_layer(1, 1, vec![1]);
    let mut host = CountingHost::default();

    // no window yet
    layer.visit(&mut host);
    assert_eq!(host.pushes, 0);

    layer.bind_window(Some(WindowId(1)));
    layer.visit(&mut host);
    assert_eq!(host.pushes, 1);
    assert_eq!(host.depth, 0);
    assert_eq!(host.last, Some(AlphaTest { reference: 0 }));

    layer.set_visible(false);
    layer.visit(&mut host);
    assert_eq!(host.pushes, 1);
}

#[test]
fn visit_pushes_sprite_edits_into_the_batch() {
    let mut layer = ortho_layer(2, 1, vec![1, 2]);
    layer.bind_window(Some(WindowId(7)));
    layer.tile_at(1, 0).unwrap().unwrap().opacity = 40;
    assert_eq!(layer.batch().quads()[1].alpha, 255);

    layer.visit(&mut CountingHost::default());
    assert_eq!(layer.batch().quads()[1].alpha, 40);
}

#[test]
fn sprite_edits_through_tile_at_stay_on_their_own_quad() {
    let mut layer = ortho_layer(2, 1, vec![1, 2]);
    layer.bind_window(Some(WindowId(1)));
    let sprite = layer.tile_at(1, 0).unwrap().unwrap();
    assert_eq!(sprite.atlas_slot(), 1);
    assert_eq!(sprite.coord(), (1, 0));
    assert_eq!(sprite.gid().clean(), 2);
    sprite.opacity = 90;
    sprite.flip_y = true;

    layer.visit(&mut CountingHost::default());

    let quads = layer.batch().quads();
    assert_eq!(quads[0].src.x, 0.0);
    assert_eq!(quads[0].alpha, 255);
    assert_eq!(quads[1].src.x, 16.0);
    assert_eq!(quads[1].alpha, 90);
    assert!(quads[1].flip_y);
    assert_consistent(&layer);
}

#[test]
fn tiles_past_the_tileset_are_refused_on_edit() {
    let mut layer = ortho_layer(1, 1, vec![0]);
    assert_eq!(
        layer.set_tile_gid(999, 0, 0),
        Err(LayerError::InvalidGid { gid: 999, first_gid: 1, last_gid: 16 })
    );
    assert_eq!(layer.cells().unwrap(), &[0]);
    assert_consistent(&layer);
}

#[test]
fn error_on_layer_size_mismatch() {
    let err = TileLayer::new(
        tileset(),
        LayerInfo::new("oops", 2, 2, vec![1, 2, 3, 4, 5, 6]),
        &MapInfo::new(Projection::Orthogonal, 16, 16),
        RenderConfig::default(),
    )
    .err();
    assert_eq!(
        err,
        Some(LayerError::InvalidLayerSize {
            layer: "oops".into(),
            expected: 4,
            actual: 6,
        })
    );
}

#[test]
fn scene_binding_follows_the_layer() {
    let mut layer = ortho_layer(2, 1, vec![1, 2]);
    layer.tile_at(0, 0).unwrap();
    layer.bind_scene(Some(SceneId(3)));
    layer.set_visible(false);

    let existing = layer.sprite_at(0, 0).unwrap().unwrap().binding;
    assert_eq!(existing.scene, Some(SceneId(3)));
    assert!(!existing.visible);

    let fresh = layer.tile_at(1, 0).unwrap().unwrap().binding;
    assert_eq!(fresh, existing);
}
