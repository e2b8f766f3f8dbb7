/// World units covered by one map tile along each axis.
pub const BLOCKS_PER_TILE: i32 = 32;

/// Discretized address of one map tile on the flat world map.
///
/// Dynmap serves one tile per 32x32-block area, with the vertical axis
/// flipped relative to Minecraft's Z so that north is up on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Map a world position to the tile containing it.
    ///
    /// Halfway positions round away from zero: `x = 16` lands in chunk 1,
    /// `x = -16` in chunk -1.
    pub fn from_world(x: i32, z: i32) -> Self {
        Self {
            x: (x as f64 / BLOCKS_PER_TILE as f64).round() as i32,
            y: (-z as f64 / BLOCKS_PER_TILE as f64).round() as i32,
        }
    }
}
