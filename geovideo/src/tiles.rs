use std::fmt::Display;

use crate::GeoCoordinate;
use crate::mercator::{PixelCoordinate, latlon_to_world, total_tiles};

/// Identifies the tile in the standard quad-tree tile grid.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct TileAddress {
    /// Zoom level, where 0 means no zoom.
    /// See: <https://wiki.openstreetmap.org/wiki/Zoom_levels>
    pub zoom: u8,

    /// X number of the tile.
    pub x: u32,

    /// Y number of the tile.
    pub y: u32,
}

impl TileAddress {
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Tile which contains given position at given zoom.
    pub fn containing(position: GeoCoordinate, zoom: u8) -> Self {
        let world = latlon_to_world(position.lat(), position.lon());

        // Map that into a big bitmap made out of web tiles. The edges (x or y of exactly 1)
        // belong to the last tile.
        let number_of_tiles = total_tiles(zoom);
        let last = number_of_tiles - 1;
        let x = ((world.x * f64::from(number_of_tiles)).floor() as u32).min(last);
        let y = ((world.y * f64::from(number_of_tiles)).floor() as u32).min(last);

        Self { zoom, x, y }
    }

    /// Whether the tile exists in the grid of its zoom level.
    pub fn is_valid(&self) -> bool {
        // 2^32 tiles per side would not even fit into x and y.
        self.zoom < 32 && self.x < total_tiles(self.zoom) && self.y < total_tiles(self.zoom)
    }

    /// Tile position (in pixels) on the "World bitmap".
    pub fn project(&self, tile_size: f64) -> PixelCoordinate {
        PixelCoordinate::new(f64::from(self.x) * tile_size, f64::from(self.y) * tile_size)
    }

    /// Tile one zoom level up, which covers this one.
    pub fn parent(&self) -> Option<Self> {
        Some(Self {
            zoom: self.zoom.checked_sub(1)?,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    pub fn east(&self) -> Option<Self> {
        (self.x < total_tiles(self.zoom) - 1).then_some(Self {
            x: self.x + 1,
            ..*self
        })
    }

    pub fn west(&self) -> Option<Self> {
        Some(Self {
            x: self.x.checked_sub(1)?,
            ..*self
        })
    }

    pub fn north(&self) -> Option<Self> {
        Some(Self {
            y: self.y.checked_sub(1)?,
            ..*self
        })
    }

    pub fn south(&self) -> Option<Self> {
        (self.y < total_tiles(self.zoom) - 1).then_some(Self {
            y: self.y + 1,
            ..*self
        })
    }
}

impl Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
