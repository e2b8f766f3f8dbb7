pub mod cache;
pub mod frame;
pub mod layout;
pub mod panel;
pub mod snapshot;

pub use cache::{TileCache, TILE_TTL};
pub use frame::{load_system_font, FrameRenderer};
pub use layout::Layout;
pub use panel::{tiles_needed, PanelTile, TileWindow, TileWindows, TILE_SIZE};
pub use snapshot::{PanelSprite, ViewSnapshot};
