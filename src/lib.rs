//! Birdseye
//!
//! A desktop viewer for multiplayer Minecraft servers that run Dynmap.
//! Polls the server's web API for online players and shows a live map
//! panel for each one.

pub mod coord;
pub mod dynmap;
pub mod error;
pub mod poll;
pub mod view;
pub mod window;

pub use coord::{ChunkCoord, BLOCKS_PER_TILE};
pub use dynmap::{DynmapClient, Player, ServerConfig, WorldInfo, WorldUpdate};
pub use error::{Error, Result};
pub use poll::ViewChannels;
pub use view::{
    FrameRenderer, Layout, PanelSprite, PanelTile, TileCache, TileWindow, TileWindows,
    ViewSnapshot, TILE_SIZE, TILE_TTL,
};
