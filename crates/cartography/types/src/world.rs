//! World geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Blocks per chunk edge in the host world.
pub const CHUNK_SIZE: u32 = 16;

/// An integer block position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
    /// North-south coordinate
    pub z: i32,
}

impl Position {
    /// Create a new position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Squared horizontal distance to another position.
    ///
    /// Vertical offset is ignored; rewards point at a column on the map.
    pub fn horizontal_distance_sq(&self, other: &Position) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dz * dz
    }

    /// Chunk coordinates `(x, z)` containing this position.
    pub fn chunk(&self) -> (i32, i32) {
        (
            self.x.div_euclid(CHUNK_SIZE as i32),
            self.z.div_euclid(CHUNK_SIZE as i32),
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A search radius measured in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SearchRadius(pub u32);

impl SearchRadius {
    /// Radius in blocks.
    pub fn blocks(&self) -> u32 {
        self.0
    }

    /// Radius in whole chunks, never less than one.
    pub fn chunks(&self) -> u32 {
        (self.0 / CHUNK_SIZE).max(1)
    }
}
