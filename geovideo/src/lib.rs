#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

pub mod bounds;
pub mod cache;
pub mod camera;
pub mod config;
mod error;
mod io;
pub mod mercator;
pub mod placeholder;
pub mod position;
pub mod provider;
pub mod sources;
mod tiles;
mod zoom;

pub use bounds::{Bounds, Viewport, zoom_for_bounds};
pub use cache::{DiskTileCache, MemoryTileCache, StorageError, TileCache};
pub use camera::{Camera, FrameOptions, auto_frame};
pub use config::ProjectPaths;
pub use error::InvalidArgument;
pub use io::{HeaderMap, HeaderValue, HttpTransport, StatusCode, Transport, TransportError};
pub use position::{GeoCoordinate, haversine_distance, interpolate};
pub use provider::{ConfigurationError, FetchError, FetchOptions, ProviderConfig, TileProvider};
pub use tiles::TileAddress;
pub use zoom::{MAX_ZOOM, ZoomRange};
