use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;

use crate::dynmap::Player;
use crate::view::panel::PanelTile;

/// Everything the renderer needs to draw one player's panel.
#[derive(Debug, Clone, Default)]
pub struct PanelSprite {
    /// Ordered tile batch, oldest first.
    pub tiles: Vec<PanelTile>,
    /// 16x16 face icon; absent when the fetch failed this tick.
    pub face: Option<Arc<RgbaImage>>,
}

/// Immutable view state published by the poll thread.
///
/// The render loop only ever reads the latest snapshot; intermediate
/// ones are overwritten unseen.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    /// Roster in server order, hidden-world players included.
    pub players: Vec<Player>,
    /// Panel sprites keyed by player name.
    pub sprites: HashMap<String, PanelSprite>,
}

impl ViewSnapshot {
    /// Players that actually get a panel. The server parks players it
    /// wants off the map in a sentinel world; those stay listed in
    /// `players` but never count toward the layout.
    pub fn visible_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_in_hidden_world())
    }

    pub fn sprite(&self, name: &str) -> Option<&PanelSprite> {
        self.sprites.get(name)
    }
}
