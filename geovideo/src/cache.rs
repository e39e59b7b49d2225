//! Durable storage for tile images, keyed by provider name and tile address.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;

use crate::TileAddress;

/// Extension of every file in the on-disk layout.
const TILE_EXTENSION: &str = "png";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{0}' cannot be used as a cache directory name")]
    InvalidProviderName(String),

    #[error("poison error")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::Poisoned
    }
}

/// Key-value store of tile images. Entries are never evicted. Putting a tile twice overwrites
/// the previous entry, last writer wins.
pub trait TileCache: Send + Sync {
    /// Look the tile up. Never touches the network.
    fn get(&self, provider: &str, address: TileAddress) -> Result<Option<Bytes>, StorageError>;

    fn put(&self, provider: &str, address: TileAddress, data: &[u8]) -> Result<(), StorageError>;
}

/// Tiles stored as `<directory>/<provider>/<zoom>/<x>/<y>.png`. Can safely be shared between
/// providers, as each of them gets its own subdirectory.
#[derive(Debug, Clone)]
pub struct DiskTileCache {
    directory: PathBuf,
}

impl DiskTileCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where the tile is (or would be) stored.
    pub fn tile_path(&self, provider: &str, address: TileAddress) -> Result<PathBuf, StorageError> {
        // Provider name becomes a path component, so it must not escape the cache directory.
        if provider.is_empty()
            || provider.contains(['/', '\\'])
            || provider == "."
            || provider == ".."
        {
            return Err(StorageError::InvalidProviderName(provider.to_owned()));
        }

        Ok(self
            .directory
            .join(provider)
            .join(address.zoom.to_string())
            .join(address.x.to_string())
            .join(format!("{}.{TILE_EXTENSION}", address.y)))
    }
}

impl TileCache for DiskTileCache {
    fn get(&self, provider: &str, address: TileAddress) -> Result<Option<Bytes>, StorageError> {
        let path = self.tile_path(provider, address)?;

        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data.into())),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn put(&self, provider: &str, address: TileAddress, data: &[u8]) -> Result<(), StorageError> {
        let path = self.tile_path(provider, address)?;
        let write_error = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        // Always present, as the path is built out of the directory and at least four components.
        let directory = path.parent().unwrap_or(self.directory.as_path());
        std::fs::create_dir_all(directory).map_err(write_error)?;

        // Readers must never see a partially written tile.
        let mut file = tempfile::NamedTempFile::new_in(directory).map_err(write_error)?;
        file.write_all(data).map_err(write_error)?;
        file.persist(&path).map_err(|err| write_error(err.error))?;

        log::trace!("Stored {} bytes in {}.", data.len(), path.display());
        Ok(())
    }
}

/// Tiles kept in the process memory. Useful for tests and for sessions which do not need to
/// survive a restart.
#[derive(Debug, Default)]
pub struct MemoryTileCache {
    tiles: Mutex<HashMap<(String, TileAddress), Bytes>>,
}

impl MemoryTileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.lock().map(|tiles| tiles.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TileCache for MemoryTileCache {
    fn get(&self, provider: &str, address: TileAddress) -> Result<Option<Bytes>, StorageError> {
        let tiles = self.tiles.lock()?;
        Ok(tiles.get(&(provider.to_owned(), address)).cloned())
    }

    fn put(&self, provider: &str, address: TileAddress, data: &[u8]) -> Result<(), StorageError> {
        let mut tiles = self.tiles.lock()?;
        tiles.insert(
            (provider.to_owned(), address),
            Bytes::copy_from_slice(data),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TILE: TileAddress = TileAddress::new(3, 4, 5);

    #[test]
    fn disk_layout() {
        let directory = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(directory.path());

        assert_eq!(
            cache.tile_path("osm", TILE).unwrap(),
            directory.path().join("osm/3/4/5.png")
        );

        cache.put("osm", TILE, b"tile").unwrap();
        assert_eq!(
            std::fs::read(directory.path().join("osm").join("3").join("4").join("5.png")).unwrap(),
            b"tile"
        );
    }

    #[test]
    fn missing_tile_is_not_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(directory.path());
        assert_eq!(cache.get("osm", TILE).unwrap(), None);
    }

    #[test]
    fn disk_cache_overwrites_entries() {
        let directory = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(directory.path());

        cache.put("osm", TILE, b"first").unwrap();
        cache.put("osm", TILE, b"second").unwrap();

        assert_eq!(cache.get("osm", TILE).unwrap(), Some(Bytes::from_static(b"second")));

        // Nothing but the tile itself is left in the directory.
        let leftovers = std::fs::read_dir(directory.path().join("osm/3/4"))
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn providers_do_not_share_entries() {
        let directory = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(directory.path());

        cache.put("osm", TILE, b"osm").unwrap();
        assert_eq!(cache.get("mapbox", TILE).unwrap(), None);

        let memory = MemoryTileCache::new();
        memory.put("osm", TILE, b"osm").unwrap();
        assert_eq!(memory.get("mapbox", TILE).unwrap(), None);
        assert_eq!(memory.get("osm", TILE).unwrap(), Some(Bytes::from_static(b"osm")));
    }

    #[test]
    fn provider_names_cannot_escape_the_directory() {
        let cache = DiskTileCache::new("/tmp/tiles");
        for name in ["", ".", "..", "../etc", "a/b", "a\\b"] {
            assert!(
                matches!(
                    cache.tile_path(name, TILE),
                    Err(StorageError::InvalidProviderName(_))
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn dots_inside_provider_names_are_fine() {
        let directory = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(directory.path());

        for name in ["my..tiles", "..osm", "osm.", "v1.2"] {
            cache.put(name, TILE, name.as_bytes()).unwrap();
            assert_eq!(
                cache.get(name, TILE).unwrap(),
                Some(Bytes::copy_from_slice(name.as_bytes()))
            );
            assert!(cache.tile_path(name, TILE).unwrap().starts_with(directory.path()));
        }
    }

    #[test]
    fn unreadable_tile_is_a_storage_error() {
        let directory = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(directory.path());

        // A directory where the tile file should be.
        std::fs::create_dir_all(directory.path().join("osm/3/4/5.png")).unwrap();

        assert!(matches!(
            cache.get("osm", TILE),
            Err(StorageError::Read { .. })
        ));
    }

    #[test]
    fn concurrent_writes_to_distinct_tiles() {
        let directory = tempfile::tempdir().unwrap();
        let cache = Arc::new(DiskTileCache::new(directory.path()));

        let handles: Vec<_> = (0..8u32)
            .map(|x| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let address = TileAddress::new(3, x, 0);
                    cache.put("osm", address, &[x as u8; 16]).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for x in 0..8u32 {
            let tile = cache.get("osm", TileAddress::new(3, x, 0)).unwrap().unwrap();
            assert_eq!(&tile[..], &[x as u8; 16]);
        }
    }

    #[test]
    fn concurrent_writes_to_the_same_tile() {
        let directory = tempfile::tempdir().unwrap();
        let cache = Arc::new(DiskTileCache::new(directory.path()));

        let payloads: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 64 * 1024]).collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|payload| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        cache.put("osm", TILE, &payload).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Whole payload of one of the writers, never a mix or a truncated file.
        let stored = cache.get("osm", TILE).unwrap().unwrap();
        assert!(payloads.iter().any(|payload| stored[..] == payload[..]));

        // No temporary files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(directory.path().join("osm/3/4"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, ["5.png"]);
    }

    #[test]
    fn memory_cache_counts_entries() {
        let cache = MemoryTileCache::new();
        assert!(cache.is_empty());

        cache.put("osm", TILE, b"a").unwrap();
        cache.put("osm", TILE, b"b").unwrap();
        cache.put("osm", TileAddress::new(0, 0, 0), b"c").unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("osm", TILE).unwrap(), Some(Bytes::from_static(b"b")));
    }
}
