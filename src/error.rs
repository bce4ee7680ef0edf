use thiserror::Error;

/// Error type for tile layer operations.
///
/// Every variant describes a contract violation by the caller or a broken
/// internal invariant. Nothing here is retried or logged by the crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// A per-cell accessor was called with a coordinate outside the grid.
    #[error("tile position ({x}, {y}) is outside the {width}x{height} layer")]
    OutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// The tile map (cells and atlas index) has been released.
    #[error("the tile map of this layer has been released")]
    ReleasedState,
    /// Operation the layer refuses to perform.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    /// A non-empty gid outside the range of the bound tileset.
    #[error("gid {gid} is outside the tileset's range {first_gid}..={last_gid}")]
    InvalidGid {
        gid: u32,
        first_gid: u32,
        last_gid: u32,
    },
    /// The layer's data array does not hold exactly `width * height` cells.
    #[error("layer `{layer}` has {actual} cells, expected {expected}")]
    InvalidLayerSize {
        layer: String,
        expected: usize,
        actual: usize,
    },
    /// The populated grid references gids outside the single bound tileset.
    #[error(
        "only one tileset per layer is supported: gids {min_gid}..={max_gid} \
         are outside {first_gid}..={last_gid}"
    )]
    MultiTilesetViolation {
        min_gid: u32,
        max_gid: u32,
        first_gid: u32,
        last_gid: u32,
    },
    /// The atlas index lost track of an occupied cell.
    #[error("atlas index has no slot for occupied cell z={z}")]
    AtlasIndexCorruption { z: usize },
    /// Renumbering would move the sprite of cell `z` below slot 0.
    #[error("atlas slot of cell z={z} would drop below zero")]
    AtlasSlotUnderflow { z: usize },
}

/// Shorthand used across the crate.
pub type LayerResult<T> = Result<T, LayerError>;
