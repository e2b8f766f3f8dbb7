//! Per-player map windows.
//!
//! Each on-screen panel shows the map tiles around one player. The tiles
//! for a panel are kept as an ordered list, bounded to the number of
//! slots the panel can show, with the oldest entry dropped first. The
//! list survives between polls so a frame can be drawn from the last
//! good batch while fresh tiles stream in.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use tracing::debug;

use crate::coord::{ChunkCoord, BLOCKS_PER_TILE};
use crate::dynmap::Player;
use crate::error::Result;
use crate::view::cache::TileCache;

/// Edge length of one map tile in pixels.
pub const TILE_SIZE: u32 = 128;

/// One fetched tile, addressed by its offset from the panel's center.
#[derive(Debug, Clone)]
pub struct PanelTile {
    pub dx: i32,
    pub dy: i32,
    pub image: Arc<RgbaImage>,
}

/// Tile list for a single player's panel, tagged with the panel size it
/// was built for.
#[derive(Debug, Clone)]
pub struct TileWindow {
    panel: (u32, u32),
    tiles: VecDeque<PanelTile>,
}

impl TileWindow {
    fn new(panel: (u32, u32)) -> Self {
        Self {
            panel,
            tiles: VecDeque::new(),
        }
    }

    pub fn panel_size(&self) -> (u32, u32) {
        self.panel
    }

    pub fn tiles(&self) -> impl Iterator<Item = &PanelTile> {
        self.tiles.iter()
    }

    pub fn is_populated(&self) -> bool {
        !self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Tile count needed to cover a panel, one spare per axis so edges never
/// show gaps while the player is between chunk centers.
pub fn tiles_needed(panel: (u32, u32)) -> (u32, u32) {
    (
        panel.0.div_ceil(TILE_SIZE) + 1,
        panel.1.div_ceil(TILE_SIZE) + 1,
    )
}

/// Offsets covering `n` slots centered on zero; even counts get the
/// spare slot on the negative side.
fn centered_range(n: u32) -> std::ops::Range<i32> {
    let n = n as i32;
    -(n / 2)..(n - n / 2)
}

/// All players' tile windows, keyed by player name.
///
/// Windows of departed players are kept until exit; the roster on a
/// small server never grows enough for that to matter.
#[derive(Debug, Default)]
pub struct TileWindows {
    windows: HashMap<String, TileWindow>,
}

impl TileWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&TileWindow> {
        self.windows.get(name)
    }

    /// Bring one player's window up to date for the given panel size.
    ///
    /// A first sighting or a panel-size change discards the old list and
    /// rebuilds from empty. Every slot in the needed grid is then walked
    /// row-major, fetching through the cache; a failed slot is skipped
    /// (the previous tile there survives until pushed out). The list
    /// never exceeds the panel's slot count.
    pub fn refresh<F>(
        &mut self,
        player: &Player,
        panel: (u32, u32),
        cache: &mut TileCache,
        now: Instant,
        fetch: F,
    ) where
        F: Fn(ChunkCoord) -> Result<RgbaImage>,
    {
        let window = self
            .windows
            .entry(player.name.clone())
            .or_insert_with(|| TileWindow::new(panel));
        if window.panel != panel {
            window.panel = panel;
            window.tiles.clear();
        }

        let (wide, high) = tiles_needed(panel);
        let capacity = (wide * high) as usize;

        for dy in centered_range(high) {
            for dx in centered_range(wide) {
                let coord = ChunkCoord::from_world(
                    player.x + dx * BLOCKS_PER_TILE,
                    player.z + dy * BLOCKS_PER_TILE,
                );
                match cache.get_or_fetch(now, coord, || fetch(coord)) {
                    Ok(image) => {
                        window.tiles.push_back(PanelTile { dx, dy, image });
                        while window.tiles.len() > capacity {
                            window.tiles.pop_front();
                        }
                    }
                    Err(err) => {
                        debug!(
                            player = %player.name,
                            chunk_x = coord.x,
                            chunk_y = coord.y,
                            error = %err,
                            "tile unavailable, slot skipped"
                        );
                    }
                }
            }
        }
    }
}
