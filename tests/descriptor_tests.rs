// tests/descriptor_tests.rs

use macroquad::prelude::vec2;
use macroquad_tmx_layer::{
    DepthMode, LayerInfo, MapInfo, Projection, QuadBatch, RenderConfig, TileFlags, TileLayer,
    TileSetDescriptor, FLIP_D, FLIP_H,
};

const MAP_JSON: &str = r#"{ "orientation": "isometric", "tilewidth": 32, "tileheight": 16 }"#;

const TILESET_JSON: &str = r#"
{
    "name": "terrain",
    "firstgid": 1,
    "tilecount": 8,
    "tilewidth": 32,
    "tileheight": 16,
    "columns": 4,
    "spacing": 0,
    "margin": 0
}
"#;

fn layer_json(data: &[u32]) -> String {
    format!(
        r#"{{
            "name": "ground",
            "width": 2,
            "height": 2,
            "data": {data:?},
            "opacity": 200,
            "offsetx": 1,
            "offsety": 0,
            "properties": {{ "cc_vertexz": "-4", "biome": "desert" }}
        }}"#
    )
}

fn load(data: &[u32]) -> anyhow::Result<TileLayer> {
    let map: MapInfo = serde_json::from_str(MAP_JSON)?;
    let tileset: TileSetDescriptor = serde_json::from_str(TILESET_JSON)?;
    let info: LayerInfo = serde_json::from_str(&layer_json(data))?;
    Ok(TileLayer::new(tileset, info, &map, RenderConfig::default())?)
}

#[test]
fn builds_a_layer_from_deserialized_descriptors() -> anyhow::Result<()> {
    let layer = load(&[1, 0, FLIP_H | 2, 8])?;

    assert_eq!(layer.name(), "ground");
    assert_eq!(layer.projection(), Projection::Isometric);
    assert_eq!(layer.opacity(), 200);
    assert_eq!(layer.depth_mode(), DepthMode::Fixed(-4));
    assert_eq!(layer.property_named("biome"), "desert");
    assert_eq!(layer.position(), vec2(16.0, -8.0));
    assert_eq!(layer.content_size(), vec2(64.0, 32.0));
    assert_eq!(layer.atlas_keys()?, &[0, 2, 3]);
    assert_eq!(layer.gid_range(), Some((1, 8)));
    assert_eq!(layer.tile_gid_at(0, 1)?, (2, TileFlags::HORIZONTAL));
    Ok(())
}

#[test]
fn quads_carry_layer_opacity_and_depth() -> anyhow::Result<()> {
    let layer = load(&[1, 1, 1, 1])?;
    assert_eq!(layer.batch().len(), 4);
    for quad in layer.batch().quads() {
        assert_eq!(quad.alpha, 200);
        assert_eq!(quad.depth, -4);
    }
    Ok(())
}

#[test]
fn diagonal_tiles_from_data_are_rotated_on_access() -> anyhow::Result<()> {
    let mut layer = load(&[FLIP_D | 3, 0, 0, 0])?;
    let sprite = layer.tile_at(0, 0)?.expect("occupied");
    assert_eq!(sprite.rotation, 270.0);
    assert!(sprite.flip_x);
    // isometric (0, 0) on a 2x2 layer sits at (16, 16); recentred by (8, 16)
    assert_eq!(sprite.position, vec2(24.0, 32.0));
    Ok(())
}

#[test]
fn malformed_depth_property_falls_back_to_zero() -> anyhow::Result<()> {
    let map: MapInfo = serde_json::from_str(MAP_JSON)?;
    let tileset: TileSetDescriptor = serde_json::from_str(TILESET_JSON)?;
    let info = LayerInfo::new("l", 1, 1, vec![1]).with_property("cc_vertexz", "deep");
    let layer = TileLayer::new(tileset, info, &map, RenderConfig::default())?;
    assert_eq!(layer.depth_mode(), DepthMode::Fixed(0));
    Ok(())
}
