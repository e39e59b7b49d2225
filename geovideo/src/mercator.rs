//! Project the lat/lon coordinates into a 2D x/y using the Web Mercator.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>
//! <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>

use crate::GeoCoordinate;
use std::f64::consts::PI;

// zoom level   tile coverage  number of tiles  tile size(*) in degrees
// 0            1 tile         1 tile           360° x 170.1022°
// 1            2 × 2 tiles    4 tiles          180° x 85.0511°
// 2            4 × 4 tiles    16 tiles         90° x [variable]

/// Size of a single tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude at which the Mercator square ends. Beyond it, `y` goes to infinity.
pub const MAX_LATITUDE: f64 = 85.0511288;

/// Location projected on the "world bitmap" at some zoom level.
pub type PixelCoordinate = geo_types::Point;

/// Web Mercator position normalized to the `[0, 1] × [0, 1]` square, independent of the zoom.
/// `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCoordinate {
    pub x: f64,
    pub y: f64,
}

impl WorldCoordinate {
    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.,
            y: (self.y + other.y) / 2.,
        }
    }
}

/// Zoom specifies how many pixels are in the whole map. For example, zoom 0 means that the whole
/// map is just one 256x256 tile, zoom 1 means that it is 2x2 tiles, and so on.
pub fn total_pixels(zoom: f64) -> f64 {
    2f64.powf(zoom) * f64::from(TILE_SIZE)
}

/// Number of tiles along one side of the grid. Saturates for zoom levels of 32 and above, which
/// cannot be addressed anyway.
pub fn total_tiles(zoom: u8) -> u32 {
    2u32.checked_pow(u32::from(zoom)).unwrap_or(u32::MAX)
}

/// Project the position into the Mercator projection and normalize it to 0-1 range. Latitude is
/// clamped to [`MAX_LATITUDE`] and longitude to `[-180, 180]`.
pub fn latlon_to_world(lat: f64, lon: f64) -> WorldCoordinate {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let lon = lon.clamp(-180., 180.);

    let sin_lat = lat.to_radians().sin();

    WorldCoordinate {
        x: (lon + 180.) / 360.,
        y: 0.5 - ((1. + sin_lat) / (1. - sin_lat)).ln() / (4. * PI),
    }
}

/// Inverse of [`latlon_to_world`].
pub fn world_to_latlon(world: WorldCoordinate) -> GeoCoordinate {
    let lon = world.x * 360. - 180.;
    let n = PI - 2. * PI * world.y;
    let lat = n.sinh().atan().to_degrees();

    // `atan` keeps latitude within ±90, longitude is only out of range for x outside of 0-1.
    GeoCoordinate::new_unchecked(lat, lon.clamp(-180., 180.))
}

/// Project geographical position into the world bitmap at given zoom.
pub fn latlon_to_pixel(lat: f64, lon: f64, zoom: f64) -> PixelCoordinate {
    let scale = total_pixels(zoom);
    let world = latlon_to_world(lat, lon);
    PixelCoordinate::new(world.x * scale, world.y * scale)
}

/// Transforms world bitmap pixels into a geographical position.
pub fn pixel_to_latlon(x: f64, y: f64, zoom: f64) -> GeoCoordinate {
    let scale = total_pixels(zoom);
    world_to_latlon(WorldCoordinate {
        x: x / scale,
        y: y / scale,
    })
}

/// Ground resolution at given latitude, i.e. how many meters a single pixel covers.
pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
    const EARTH_CIRCUMFERENCE: f64 = 40_075_016.686;

    EARTH_CIRCUMFERENCE * lat.to_radians().cos() / total_pixels(zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn world_corners() {
        let center = latlon_to_world(0., 0.);
        assert_relative_eq!(center.x, 0.5);
        assert_relative_eq!(center.y, 0.5);

        let north_west = latlon_to_world(MAX_LATITUDE, -180.);
        assert_relative_eq!(north_west.x, 0.0);
        assert_relative_eq!(north_west.y, 0.0, epsilon = 1e-7);

        let south_east = latlon_to_world(-MAX_LATITUDE, 180.);
        assert_relative_eq!(south_east.x, 1.0);
        assert_relative_eq!(south_east.y, 1.0, epsilon = 1e-7);
    }

    #[test]
    fn poles_are_clamped() {
        assert_eq!(latlon_to_world(90., 0.), latlon_to_world(MAX_LATITUDE, 0.));
        assert_eq!(latlon_to_world(-90., 0.), latlon_to_world(-MAX_LATITUDE, 0.));
        assert_eq!(latlon_to_world(0., 200.), latlon_to_world(0., 180.));
        assert!(latlon_to_world(90., 0.).y.is_finite());
    }

    #[test]
    fn world_there_and_back() {
        for lat in [-84.9, -60., -33.3, 0., 12.5, 37.7749, 51.1, 84.9] {
            for lon in [-180., -122.4194, -45., 0., 17.0385, 90., 179.99] {
                let restored = world_to_latlon(latlon_to_world(lat, lon));
                assert_relative_eq!(restored.lat(), lat, epsilon = 1e-5);
                assert_relative_eq!(restored.lon(), lon, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn web_mercator_roundtrip() {
        let lat = 37.7749;
        let lon = -122.4194;
        let pixel = latlon_to_pixel(lat, lon, 3.);
        let restored = pixel_to_latlon(pixel.x(), pixel.y(), 3.);
        assert!((restored.lat() - lat).abs() < 1e-5);
        assert!((restored.lon() - lon).abs() < 1e-5);
    }

    #[test]
    fn pixel_there_and_back_at_fractional_zoom() {
        let citadel = (52.26470, 21.00027);
        let zoom = 16.4;
        let pixel = latlon_to_pixel(citadel.0, citadel.1, zoom);
        let restored = pixel_to_latlon(pixel.x(), pixel.y(), zoom);
        assert_relative_eq!(restored.lat(), citadel.0, epsilon = 1e-5);
        assert_relative_eq!(restored.lon(), citadel.1, epsilon = 1e-5);
    }

    #[test]
    fn projecting_position_at_zoom() {
        let citadel = latlon_to_pixel(52.26470, 21.00027, 20.);

        // Tile 585455/345104 at zoom 20, shifted by the position within the tile.
        approx::assert_relative_eq!(citadel.x(), 585455. * 256. + 184., max_relative = 0.5);
        approx::assert_relative_eq!(citadel.y(), 345104. * 256. + 116.5, max_relative = 0.5);
    }

    #[test]
    fn pixels_outside_of_the_map_give_valid_coordinates() {
        let size = total_pixels(2.);
        let position = pixel_to_latlon(size * 1.5, -size, 2.);
        assert!(GeoCoordinate::new(position.lat(), position.lon()).is_ok());
        assert_eq!(position.lon(), 180.);
    }

    #[test]
    fn equator_resolution_at_zoom_0() {
        // At zoom 0 (whole world), equator should be about 156.5km per pixel
        assert_relative_eq!(meters_per_pixel(0.0, 0.), 156_543.03, epsilon = 0.01);
    }

    #[test]
    fn equator_resolution_at_zoom_19() {
        assert_relative_eq!(meters_per_pixel(0.0, 19.), 0.298, epsilon = 0.001);
    }

    #[test]
    fn resolution_gets_finer_towards_the_poles() {
        assert!(meters_per_pixel(60.0, 10.) < meters_per_pixel(0.0, 10.));
        assert_relative_eq!(
            meters_per_pixel(60.0, 10.),
            meters_per_pixel(0.0, 10.) / 2.,
            epsilon = 1e-6
        );
    }
}
