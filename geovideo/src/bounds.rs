//! Bounding boxes of coordinate sets, and the zoom level at which they fit a viewport.

use crate::mercator::{TILE_SIZE, WorldCoordinate, latlon_to_world, world_to_latlon};
use crate::{GeoCoordinate, InvalidArgument};

/// World-space span below which bounds are considered a single point. Keeps the zoom finite.
const MIN_WORLD_SPAN: f64 = 1e-9;

/// Default margin around framed bounds, as a fraction of their span on each side.
pub const DEFAULT_PADDING: f64 = 0.1;

/// Minimal latitude/longitude box. `min_lat <= max_lat` and `min_lon <= max_lon` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl Bounds {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self, InvalidArgument> {
        // Validates ranges.
        GeoCoordinate::new(min_lat, min_lon)?;
        GeoCoordinate::new(max_lat, max_lon)?;

        if min_lat > max_lat || min_lon > max_lon {
            return Err(InvalidArgument::InvertedBounds {
                min_lat,
                min_lon,
                max_lat,
                max_lon,
            });
        }

        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Smallest bounds containing all of the `coordinates`.
    pub fn from_coordinates(
        coordinates: impl IntoIterator<Item = GeoCoordinate>,
    ) -> Result<Self, InvalidArgument> {
        let mut coordinates = coordinates.into_iter();
        let first = coordinates.next().ok_or(InvalidArgument::EmptyCoordinates)?;

        Ok(coordinates.fold(Self::point(first), Self::extend))
    }

    fn point(position: GeoCoordinate) -> Self {
        Self {
            min_lat: position.lat(),
            min_lon: position.lon(),
            max_lat: position.lat(),
            max_lon: position.lon(),
        }
    }

    /// Grow the bounds so they include `position`.
    pub fn extend(self, position: GeoCoordinate) -> Self {
        Self {
            min_lat: self.min_lat.min(position.lat()),
            min_lon: self.min_lon.min(position.lon()),
            max_lat: self.max_lat.max(position.lat()),
            max_lon: self.max_lon.max(position.lon()),
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn south_west(&self) -> GeoCoordinate {
        GeoCoordinate::new_unchecked(self.min_lat, self.min_lon)
    }

    pub fn north_east(&self) -> GeoCoordinate {
        GeoCoordinate::new_unchecked(self.max_lat, self.max_lon)
    }

    pub fn contains(&self, position: GeoCoordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&position.lat())
            && (self.min_lon..=self.max_lon).contains(&position.lon())
    }

    /// Center of the bounds, averaged in world space rather than in degrees, so it stays in the
    /// visual middle of the box on a Mercator map.
    pub fn center(&self) -> GeoCoordinate {
        let (south_west, north_east) = self.world_corners();
        world_to_latlon(south_west.midpoint(north_east))
    }

    fn world_corners(&self) -> (WorldCoordinate, WorldCoordinate) {
        (
            latlon_to_world(self.min_lat, self.min_lon),
            latlon_to_world(self.max_lat, self.max_lon),
        )
    }
}

impl From<Bounds> for geo_types::Rect {
    fn from(bounds: Bounds) -> Self {
        Self::new(
            geo_types::coord! { x: bounds.min_lon, y: bounds.min_lat },
            geo_types::coord! { x: bounds.max_lon, y: bounds.max_lat },
        )
    }
}

/// Size of the rendered frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn validate(&self) -> Result<(), InvalidArgument> {
        // Negated to reject NaNs.
        if !(self.width > 0. && self.height > 0.) {
            return Err(InvalidArgument::Viewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl From<(u32, u32)> for Viewport {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

/// Highest continuous zoom level at which `bounds`, inflated by `padding` on each side, still fit
/// into the `viewport`. The tighter of the horizontal and vertical constraints wins.
pub fn zoom_for_bounds(
    bounds: &Bounds,
    viewport: Viewport,
    padding: f64,
) -> Result<f64, InvalidArgument> {
    viewport.validate()?;

    // Negated to reject NaNs.
    if !(padding >= 0.) {
        return Err(InvalidArgument::Padding(padding));
    }

    let (south_west, north_east) = bounds.world_corners();

    // Mercator's y grows southwards.
    let inflate = 1. + 2. * padding;
    let span_x = (north_east.x - south_west.x).max(MIN_WORLD_SPAN) * inflate;
    let span_y = (south_west.y - north_east.y).max(MIN_WORLD_SPAN) * inflate;

    let tile_size = f64::from(TILE_SIZE);
    let zoom_x = (viewport.width / (tile_size * span_x)).log2();
    let zoom_y = (viewport.height / (tile_size * span_y)).log2();

    Ok(zoom_x.min(zoom_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn coordinate(lat: f64, lon: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon).unwrap()
    }

    fn california() -> Bounds {
        Bounds::new(34.0, -123.0, 38.0, -118.0).unwrap()
    }

    #[test]
    fn bounds_of_coordinates() {
        let bounds = Bounds::from_coordinates([
            coordinate(51.1, 17.0),
            coordinate(52.2, 21.0),
            coordinate(50.0, 19.9),
        ])
        .unwrap();

        assert_eq!(bounds, Bounds::new(50.0, 17.0, 52.2, 21.0).unwrap());
        assert!(bounds.contains(coordinate(51.0, 18.0)));
        assert!(!bounds.contains(coordinate(53.0, 18.0)));
    }

    #[test]
    fn bounds_of_single_coordinate() {
        let bounds = Bounds::from_coordinates([coordinate(51.1, 17.0)]).unwrap();
        assert_eq!(bounds.south_west(), bounds.north_east());
    }

    #[test]
    fn bounds_of_nothing() {
        let nothing: [GeoCoordinate; 0] = [];
        assert_eq!(
            Bounds::from_coordinates(nothing),
            Err(InvalidArgument::EmptyCoordinates)
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(matches!(
            Bounds::new(38.0, -123.0, 34.0, -118.0),
            Err(InvalidArgument::InvertedBounds { .. })
        ));
        assert!(Bounds::new(34.0, -118.0, 38.0, -123.0).is_err());
        assert_eq!(
            Bounds::new(34.0, -123.0, 95.0, -118.0),
            Err(InvalidArgument::Latitude(95.0))
        );
    }

    #[test]
    fn center_is_averaged_in_world_space() {
        let bounds = Bounds::new(0.0, -10.0, 80.0, 10.0).unwrap();
        let center = bounds.center();

        assert_relative_eq!(center.lon(), 0.0, epsilon = 1e-9);

        // Mercator stretches the north, so the visual middle is well above the average latitude.
        assert!(center.lat() > 40.0, "{center:?}");
        assert!(center.lat() < 80.0, "{center:?}");
    }

    #[test]
    fn zoom_for_california() {
        let zoom = zoom_for_bounds(&california(), Viewport::new(1280., 720.), DEFAULT_PADDING).unwrap();
        assert!(zoom > 0., "{zoom}");

        // Only ~5 degrees of longitude, so it is quite a close up.
        assert!(zoom > 5. && zoom < 8., "{zoom}");
    }

    #[test]
    fn smaller_viewport_gives_lower_zoom() {
        let bounds = california();
        let mut previous = f64::INFINITY;

        for (width, height) in [(1920, 1080), (1280, 720), (640, 360), (320, 180), (64, 64)] {
            let zoom = zoom_for_bounds(&bounds, (width, height).into(), DEFAULT_PADDING).unwrap();
            assert!(zoom < previous, "{zoom} >= {previous}");
            previous = zoom;
        }
    }

    #[test]
    fn tighter_dimension_wins() {
        let bounds = california();
        let wide = zoom_for_bounds(&bounds, Viewport::new(10_000., 720.), 0.).unwrap();
        let tall = zoom_for_bounds(&bounds, Viewport::new(1280., 10_000.), 0.).unwrap();
        let both = zoom_for_bounds(&bounds, Viewport::new(1280., 720.), 0.).unwrap();

        assert_relative_eq!(both, wide.min(tall));
    }

    #[test]
    fn padding_zooms_out() {
        let bounds = california();
        let viewport = Viewport::new(1280., 720.);
        let tight = zoom_for_bounds(&bounds, viewport, 0.).unwrap();
        let padded = zoom_for_bounds(&bounds, viewport, 0.5).unwrap();

        // Doubling the span costs exactly one zoom level.
        assert_relative_eq!(tight - padded, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn zoom_of_a_point_is_finite() {
        let bounds = Bounds::from_coordinates([coordinate(51.1, 17.0)]).unwrap();
        let zoom = zoom_for_bounds(&bounds, Viewport::new(1280., 720.), DEFAULT_PADDING).unwrap();
        assert!(zoom.is_finite());
        assert!(zoom > 22.);
    }

    #[test]
    fn invalid_zoom_arguments() {
        let bounds = california();
        assert_eq!(
            zoom_for_bounds(&bounds, Viewport::new(0., 720.), 0.1),
            Err(InvalidArgument::Viewport {
                width: 0.,
                height: 720.
            })
        );
        assert!(zoom_for_bounds(&bounds, Viewport::new(1280., -1.), 0.1).is_err());
        assert_eq!(
            zoom_for_bounds(&bounds, Viewport::new(1280., 720.), -0.1),
            Err(InvalidArgument::Padding(-0.1))
        );
    }

    #[test]
    fn converting_to_geo_types() {
        let rect: geo_types::Rect = california().into();
        assert_eq!(rect.min().x, -123.0);
        assert_eq!(rect.max().y, 38.0);
    }
}
