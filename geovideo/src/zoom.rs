use crate::InvalidArgument;

/// Highest zoom level most tile servers render.
pub const MAX_ZOOM: f64 = 22.;

/// Range of continuous zoom levels a camera is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(try_from = "(f64, f64)", into = "(f64, f64)")
)]
pub struct ZoomRange {
    min: f64,
    max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Result<Self, InvalidArgument> {
        // Also rejects NaNs.
        if min >= 0. && min <= max && max.is_finite() {
            Ok(Self { min, max })
        } else {
            Err(InvalidArgument::ZoomRange { min, max })
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }

    pub fn contains(&self, zoom: f64) -> bool {
        (self.min..=self.max).contains(&zoom)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 0., max: MAX_ZOOM }
    }
}

impl TryFrom<(f64, f64)> for ZoomRange {
    type Error = InvalidArgument;

    fn try_from((min, max): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<ZoomRange> for (f64, f64) {
    fn from(range: ZoomRange) -> Self {
        (range.min, range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructing_zoom_range() {
        let range = ZoomRange::default();
        assert_eq!(0., range.min());
        assert_eq!(22., range.max());

        assert!(ZoomRange::new(3., 3.).is_ok());
        assert_eq!(
            Err(InvalidArgument::ZoomRange { min: 5., max: 2. }),
            ZoomRange::new(5., 2.)
        );
        assert!(ZoomRange::new(-1., 2.).is_err());
        assert!(ZoomRange::new(0., f64::INFINITY).is_err());
        assert!(ZoomRange::try_from((f64::NAN, 2.)).is_err());
    }

    #[test]
    fn clamping() {
        let range = ZoomRange::new(2., 18.).unwrap();
        assert_eq!(2., range.clamp(0.5));
        assert_eq!(18., range.clamp(31.));
        assert_eq!(11.25, range.clamp(11.25));
        assert!(range.contains(2.));
        assert!(!range.contains(18.5));
    }
}
