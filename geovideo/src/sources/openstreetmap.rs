use std::time::Duration;

use super::Attribution;
use crate::ProviderConfig;

/// <https://www.openstreetmap.org/about>
///
/// Their tile usage policy asks for a modest request rate, hence the throttling.
/// <https://operations.osmfoundation.org/policies/tiles/>
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenStreetMap;

impl OpenStreetMap {
    pub const NAME: &'static str = "osm";

    pub fn attribution(&self) -> Attribution {
        Attribution {
            text: "OpenStreetMap contributors",
            url: "https://www.openstreetmap.org/copyright",
        }
    }
}

impl From<OpenStreetMap> for ProviderConfig {
    fn from(_: OpenStreetMap) -> Self {
        ProviderConfig::new(
            OpenStreetMap::NAME,
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        )
        .with_throttle_interval(Duration::from_millis(200))
        .with_max_retries(3)
    }
}
