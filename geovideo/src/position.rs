//! Types and functions for working with geographical positions.

use crate::InvalidArgument;

/// Mean Earth radius used by the great-circle distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographical position with latitude and longitude, in degrees.
///
/// Once constructed, the position is guaranteed to be within `[-90, 90]` for the latitude
/// and `[-180, 180]` for the longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(try_from = "LatLon", into = "LatLon")
)]
pub struct GeoCoordinate {
    lat: f64,
    lon: f64,
}

impl GeoCoordinate {
    /// Construct the position, validating both of its components.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidArgument> {
        // Written this way to reject NaNs too.
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidArgument::Latitude(lat));
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidArgument::Longitude(lon));
        }

        Ok(Self { lat, lon })
    }

    /// Caller guarantees that both components are in range.
    pub(crate) const fn new_unchecked(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: Self) -> f64 {
        haversine_distance(*self, other)
    }
}

impl Default for GeoCoordinate {
    fn default() -> Self {
        Self::new_unchecked(0.0, 0.0)
    }
}

/// Note that `geo_types` follows the x/y convention, so the longitude comes first.
impl From<GeoCoordinate> for geo_types::Point {
    fn from(coordinate: GeoCoordinate) -> Self {
        Self::new(coordinate.lon, coordinate.lat)
    }
}

impl TryFrom<geo_types::Point> for GeoCoordinate {
    type Error = InvalidArgument;

    fn try_from(point: geo_types::Point) -> Result<Self, Self::Error> {
        Self::new(point.y(), point.x())
    }
}

#[cfg(feature = "serde")]
#[derive(Clone, Copy, ::serde::Serialize, ::serde::Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<LatLon> for GeoCoordinate {
    type Error = InvalidArgument;

    fn try_from(value: LatLon) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lon)
    }
}

#[cfg(feature = "serde")]
impl From<GeoCoordinate> for LatLon {
    fn from(value: GeoCoordinate) -> Self {
        Self {
            lat: value.lat,
            lon: value.lon,
        }
    }
}

/// Great-circle distance between two positions, in meters.
/// <https://en.wikipedia.org/wiki/Haversine_formula>
pub fn haversine_distance(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let hav = (dlat / 2.).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.).sin().powi(2);
    2. * EARTH_RADIUS_M * hav.sqrt().asin()
}

/// Linear interpolation between `a` and `b`, done on latitude and longitude independently.
/// `t` must be within `[0, 1]`.
pub fn interpolate(a: GeoCoordinate, b: GeoCoordinate, t: f64) -> Result<GeoCoordinate, InvalidArgument> {
    if !(0.0..=1.0).contains(&t) {
        return Err(InvalidArgument::InterpolationFactor(t));
    }

    // Exact at both ends. Rounding in between may still step one ulp past a pole or the
    // antimeridian, hence the clamp.
    let lerp = |from: f64, to: f64| from * (1.0 - t) + to * t;
    Ok(GeoCoordinate::new_unchecked(
        lerp(a.lat, b.lat).clamp(-90.0, 90.0),
        lerp(a.lon, b.lon).clamp(-180.0, 180.0),
    ))
}
