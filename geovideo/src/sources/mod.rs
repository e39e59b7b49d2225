//! Presets of common tile servers. Make sure you follow terms of usage of the particular source.

mod mapbox;
mod openstreetmap;

pub use mapbox::{Mapbox, MapboxStyle};
pub use openstreetmap::OpenStreetMap;

/// Credits that must be shown along with the tiles, e.g. in the corner of the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub text: &'static str,
    pub url: &'static str,
}
