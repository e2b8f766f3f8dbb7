//! Expiring store of decoded map tiles.
//!
//! Tiles go stale server-side as the world changes, so entries carry a
//! fixed lifetime and are swept lazily on lookup. The cache is owned by
//! the poll thread and never crosses threads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::coord::ChunkCoord;
use crate::error::Result;

/// How long a fetched tile stays valid.
pub const TILE_TTL: Duration = Duration::from_secs(20);

struct CachedTile {
    image: Arc<RgbaImage>,
    expires_at: Instant,
}

/// Chunk coordinate → decoded tile, with per-entry expiry.
///
/// Lookups take `now` explicitly so tests can drive time.
#[derive(Default)]
pub struct TileCache {
    tiles: HashMap<ChunkCoord, CachedTile>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Look up a tile, running `fetch` on a miss.
    ///
    /// Entries whose lifetime has lapsed by `now` are dropped before the
    /// lookup, so an expired tile is re-fetched rather than served stale.
    /// A failed fetch propagates and leaves the cache untouched.
    pub fn get_or_fetch<F>(
        &mut self,
        now: Instant,
        coord: ChunkCoord,
        fetch: F,
    ) -> Result<Arc<RgbaImage>>
    where
        F: FnOnce() -> Result<RgbaImage>,
    {
        self.tiles.retain(|_, tile| tile.expires_at > now);

        if let Some(tile) = self.tiles.get(&coord) {
            return Ok(Arc::clone(&tile.image));
        }

        let image = Arc::new(fetch()?);
        self.tiles.insert(
            coord,
            CachedTile {
                image: Arc::clone(&image),
                expires_at: now + TILE_TTL,
            },
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::Rgba;

    fn tile(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([shade, shade, shade, 255]))
    }

    #[test]
    fn test_hit_within_ttl_skips_fetch() {
        let mut cache = TileCache::new();
        let now = Instant::now();
        let coord = ChunkCoord::new(1, 2);

        let mut fetches = 0;
        cache
            .get_or_fetch(now, coord, || {
                fetches += 1;
                Ok(tile(10))
            })
            .unwrap();
        let got = cache
            .get_or_fetch(now + Duration::from_secs(19), coord, || {
                fetches += 1;
                Ok(tile(20))
            })
            .unwrap();

        assert_eq!(fetches, 1);
        assert_eq!(got.get_pixel(0, 0).0[0], 10);
    }

    #[test]
    fn test_expired_entry_is_refetched() {
        let mut cache = TileCache::new();
        let now = Instant::now();
        let coord = ChunkCoord::new(0, 0);

        cache.get_or_fetch(now, coord, || Ok(tile(10))).unwrap();
        let got = cache
            .get_or_fetch(now + TILE_TTL, coord, || Ok(tile(20)))
            .unwrap();

        assert_eq!(got.get_pixel(0, 0).0[0], 20);
    }

    #[test]
    fn test_lookup_sweeps_unrelated_expired_entries() {
        let mut cache = TileCache::new();
        let now = Instant::now();

        cache
            .get_or_fetch(now, ChunkCoord::new(0, 0), || Ok(tile(10)))
            .unwrap();
        cache
            .get_or_fetch(now, ChunkCoord::new(1, 0), || Ok(tile(10)))
            .unwrap();
        assert_eq!(cache.len(), 2);

        cache
            .get_or_fetch(now + TILE_TTL, ChunkCoord::new(5, 5), || Ok(tile(10)))
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let mut cache = TileCache::new();
        let now = Instant::now();
        let coord = ChunkCoord::new(3, 3);

        let err = cache.get_or_fetch(now, coord, || {
            Err(Error::endpoint("http://dynmap.example/tile"))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());

        let mut fetches = 0;
        cache
            .get_or_fetch(now, coord, || {
                fetches += 1;
                Ok(tile(30))
            })
            .unwrap();
        assert_eq!(fetches, 1);
    }
}
