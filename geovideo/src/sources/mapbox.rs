use super::Attribution;
use crate::ProviderConfig;

/// Predefined Mapbox styles.
/// <https://docs.mapbox.com/api/maps/styles/#classic-mapbox-styles>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapboxStyle {
    #[default]
    Streets,
    Outdoors,
    Light,
    Dark,
    Satellite,
    SatelliteStreets,
    NavigationDay,
    NavigationNight,
}

impl MapboxStyle {
    fn api_slug(&self) -> &'static str {
        match self {
            Self::Streets => "streets-v12",
            Self::Outdoors => "outdoors-v12",
            Self::Light => "light-v11",
            Self::Dark => "dark-v11",
            Self::Satellite => "satellite-v9",
            Self::SatelliteStreets => "satellite-streets-v12",
            Self::NavigationDay => "navigation-day-v1",
            Self::NavigationNight => "navigation-night-v1",
        }
    }
}

/// Mapbox raster tiles.
/// <https://docs.mapbox.com/api/maps/static-tiles/>
#[derive(Clone, Default)]
pub struct Mapbox {
    /// Predefined style to use
    pub style: MapboxStyle,

    /// Mapbox API key. Can also be given per fetch, see [`crate::FetchOptions::token`].
    pub access_token: Option<String>,
}

impl Mapbox {
    pub const NAME: &'static str = "mapbox";

    pub fn attribution(&self) -> Attribution {
        Attribution {
            text: "© Mapbox, © OpenStreetMap",
            url: "https://www.mapbox.com/about/maps/",
        }
    }
}

impl From<Mapbox> for ProviderConfig {
    fn from(mapbox: Mapbox) -> Self {
        let config = ProviderConfig::new(
            Mapbox::NAME,
            format!(
                "https://api.mapbox.com/styles/v1/mapbox/{}/tiles/256/{{z}}/{{x}}/{{y}}?access_token={{token}}",
                mapbox.style.api_slug()
            ),
        );

        match mapbox.access_token {
            Some(token) => config.with_api_token(token),
            None => config,
        }
    }
}
