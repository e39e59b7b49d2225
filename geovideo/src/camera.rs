//! Camera placed over the map, and framing it so a set of points is fully visible.

use crate::bounds::{DEFAULT_PADDING, Viewport, zoom_for_bounds};
use crate::mercator::{TILE_SIZE, latlon_to_world, meters_per_pixel, total_tiles};
use crate::{Bounds, GeoCoordinate, InvalidArgument, TileAddress, ZoomRange};

/// Default vertical field of view, in degrees.
pub const DEFAULT_FOV: f64 = 45.;

/// Where the renderer looks from. Zoom is continuous, angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Camera {
    pub position: GeoCoordinate,
    pub bearing: f64,
    pub pitch: f64,
    pub roll: f64,
    pub fov: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: GeoCoordinate::default(),
            bearing: 0.,
            pitch: 0.,
            roll: 0.,
            fov: DEFAULT_FOV,
            zoom: 0.,
        }
    }
}

impl Camera {
    /// Camera looking straight down at `position`.
    pub fn new(position: GeoCoordinate, zoom: f64) -> Self {
        Self {
            position,
            zoom,
            ..Default::default()
        }
    }

    /// How many meters a single pixel covers in the middle of the frame.
    pub fn meters_per_pixel(&self) -> f64 {
        meters_per_pixel(self.position.lat(), self.zoom)
    }

    /// Tiles needed to cover the `viewport` centered at the camera, at the nearest integer zoom.
    /// Tiles are listed row by row, from the north-west corner. Orientation angles are not taken
    /// into account.
    pub fn visible_tiles(&self, viewport: Viewport) -> Vec<TileAddress> {
        // Tile addresses above 31 do not fit in u32.
        let zoom = self.zoom.round().clamp(0., 31.) as u8;

        // We need to make up the difference between integer and floating point zoom levels.
        let corrected_tile_size = f64::from(TILE_SIZE) * 2f64.powf(self.zoom - f64::from(zoom));

        let number_of_tiles = total_tiles(zoom);
        let world = latlon_to_world(self.position.lat(), self.position.lon());
        let center_x = world.x * f64::from(number_of_tiles);
        let center_y = world.y * f64::from(number_of_tiles);
        let half_width = viewport.width.max(0.) / 2. / corrected_tile_size;
        let half_height = viewport.height.max(0.) / 2. / corrected_tile_size;

        let last = f64::from(number_of_tiles - 1);
        let tile_range = |center: f64, half: f64| {
            let first = (center - half).floor().clamp(0., last) as u32;
            let end = (center + half).floor().clamp(0., last) as u32;
            first..=end
        };

        let columns = tile_range(center_x, half_width);
        tile_range(center_y, half_height)
            .flat_map(|y| columns.clone().map(move |x| TileAddress::new(zoom, x, y)))
            .collect()
    }
}

/// Settings for [`auto_frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    /// Margin around the points, as a fraction of their span on each side.
    pub padding: f64,
    pub zoom_range: ZoomRange,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            zoom_range: ZoomRange::default(),
        }
    }
}

/// Place the camera so that all `coordinates` are visible in the `viewport`.
///
/// The camera is centered at the middle of the points' bounds (taken in world space) and uses
/// the highest zoom at which the bounds still fit, clamped to the allowed range.
pub fn auto_frame(
    coordinates: impl IntoIterator<Item = GeoCoordinate>,
    viewport: Viewport,
    options: &FrameOptions,
) -> Result<Camera, InvalidArgument> {
    let bounds = Bounds::from_coordinates(coordinates)?;
    let zoom = zoom_for_bounds(&bounds, viewport, options.padding)?;
    let zoom = options.zoom_range.clamp(zoom);

    log::debug!("Framed {bounds:?} at zoom {zoom:.2}.");

    Ok(Camera::new(bounds.center(), zoom))
}
