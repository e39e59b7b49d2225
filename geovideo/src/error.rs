use crate::TileAddress;

/// Malformed geometric input. Always detected before any I/O takes place.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidArgument {
    #[error("latitude {0} is outside of [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside of [-180, 180]")]
    Longitude(f64),

    #[error("interpolation factor {0} is outside of [0, 1]")]
    InterpolationFactor(f64),

    #[error("cannot compute bounds of an empty coordinate set")]
    EmptyCoordinates,

    #[error("bounds are inverted: latitude {min_lat}..{max_lat}, longitude {min_lon}..{max_lon}")]
    InvertedBounds {
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    },

    #[error("viewport must have positive dimensions, got {width}x{height}")]
    Viewport { width: f64, height: f64 },

    #[error("padding must not be negative, got {0}")]
    Padding(f64),

    #[error("invalid zoom range {min}..={max}")]
    ZoomRange { min: f64, max: f64 },

    #[error("tile {0} is outside of the tile grid")]
    TileAddress(TileAddress),
}
