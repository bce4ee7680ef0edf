use macroquad::prelude::{vec2, Vec2};
use serde::Deserialize;
use tracing::warn;

use crate::geometry::DepthMode;

/// Layer property selecting the depth mode: `"automatic"` or an integer.
pub const VERTEX_Z_PROPERTY: &str = "cc_vertexz";

/// Rendering settings chosen once when the renderer is set up.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Texel-to-content ratio; a sprite's content size is its texture rect
    /// divided by this.
    pub texel_to_content_ratio: (f32, f32),
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            texel_to_content_ratio: (1.0, 1.0),
        }
    }
}

impl RenderConfig {
    pub fn uniform(ratio: f32) -> Self {
        RenderConfig {
            texel_to_content_ratio: (ratio, ratio),
        }
    }

    pub fn content_size(&self, texels: Vec2) -> Vec2 {
        let (rx, ry) = self.texel_to_content_ratio;
        vec2(texels.x / rx, texels.y / ry)
    }
}

/// Reads the depth mode out of a layer's `cc_vertexz` property.
pub fn depth_mode_from_property(value: Option<&str>) -> DepthMode {
    match value {
        None | Some("") => DepthMode::default(),
        Some("automatic") => DepthMode::Automatic,
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(z) => DepthMode::Fixed(z),
            Err(err) => {
                warn!(value = raw, %err, "ignoring malformed {VERTEX_Z_PROPERTY}");
                DepthMode::default()
            }
        },
    }
}
