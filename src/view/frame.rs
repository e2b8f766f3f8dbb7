//! Frame composition.
//!
//! Turns the latest snapshot into a finished RGBA frame: fallback status
//! screens, or one bordered map panel per visible player. Pure image
//! work; no network and no windowing here, so upstream failures only
//! ever show up as missing sprites.

use ab_glyph::{Font, FontArc, PxScale};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::coord::{ChunkCoord, BLOCKS_PER_TILE};
use crate::dynmap::Player;
use crate::view::layout::Layout;
use crate::view::panel::{PanelTile, TILE_SIZE};
use crate::view::snapshot::{PanelSprite, ViewSnapshot};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BORDER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const NAMEPLATE_BG: Rgba<u8> = Rgba([0, 0, 0, 160]);
const TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STATUS_TEXT: Rgba<u8> = Rgba([180, 180, 180, 255]);

const NAMEPLATE_HEIGHT: u32 = 24;
const NAMEPLATE_FONT_SIZE: f32 = 14.0;
const STATUS_FONT_SIZE: f32 = 24.0;
const OVERLAY_FONT_SIZE: f32 = 12.0;

/// Face icons sit just inside the panel border.
const FACE_POS: (i64, i64) = (4, 4);

/// System font locations tried in order at startup.
///
/// Text drawing is skipped entirely when none of these exists; the
/// map view itself never depends on a font.
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

/// Load the first usable nameplate font from the well-known paths.
pub fn load_system_font() -> Option<FontArc> {
    for path in FONT_PATHS {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                debug!(path, "loaded nameplate font");
                return Some(font);
            }
            Err(err) => debug!(path, error = %err, "unusable font file"),
        }
    }
    warn!("no usable system font found, text will not be drawn");
    None
}

/// Composes frames from view snapshots.
pub struct FrameRenderer {
    font: Option<FontArc>,
    debug_overlay: bool,
}

impl FrameRenderer {
    pub fn new(font: Option<FontArc>, debug_overlay: bool) -> Self {
        Self {
            font,
            debug_overlay,
        }
    }

    /// Compose one frame at the given pixel size.
    ///
    /// No snapshot yet means the first poll has not landed, shown as a
    /// connecting screen. An empty visible roster gets its own screen.
    /// Otherwise each visible player draws at its grid cell, except
    /// players whose tile window has not been populated yet; their cell
    /// stays dark until the first batch lands.
    pub fn render(&self, size: (u32, u32), snapshot: Option<&ViewSnapshot>) -> RgbaImage {
        let (w, h) = size;
        if w == 0 || h == 0 {
            return RgbaImage::new(w, h);
        }

        let Some(snapshot) = snapshot else {
            return self.status_screen(size, "Connecting to server...");
        };

        let visible: Vec<&Player> = snapshot.visible_players().collect();
        if visible.is_empty() {
            return self.status_screen(size, "No players online");
        }

        let mut frame = RgbaImage::from_pixel(w, h, BACKGROUND);
        let layout = Layout::compute(size, visible.len() as u32);
        for (i, player) in visible.iter().enumerate() {
            let Some(sprite) = snapshot.sprite(&player.name) else {
                continue;
            };
            if sprite.tiles.is_empty() {
                continue;
            }
            let panel = self.render_panel(layout.cell_size(), player, sprite);
            let (x, y) = layout.cell_origin(i as u32);
            imageops::overlay(&mut frame, &panel, x, y);
        }
        frame
    }

    /// One player's panel: tile composite, face icon, nameplate, border.
    fn render_panel(&self, size: (u32, u32), player: &Player, sprite: &PanelSprite) -> RgbaImage {
        let (w, h) = size;
        if w == 0 || h == 0 {
            return RgbaImage::new(w, h);
        }
        let mut panel = RgbaImage::from_pixel(w, h, BACKGROUND);

        // Tiles are placed relative to the panel center and clip at the
        // panel edges; the window's spare tiles cover the margins.
        let center = (i64::from(w / 2), i64::from(h / 2));
        for tile in &sprite.tiles {
            let x = center.0 + i64::from(tile.dx) * i64::from(TILE_SIZE);
            let y = center.1 + i64::from(tile.dy) * i64::from(TILE_SIZE);
            imageops::overlay(&mut panel, tile.image.as_ref(), x, y);
            if self.debug_overlay {
                self.draw_tile_overlay(&mut panel, player, tile, (x, y));
            }
        }

        if let Some(face) = &sprite.face {
            imageops::overlay(&mut panel, face.as_ref(), FACE_POS.0, FACE_POS.1);
        }

        if h > NAMEPLATE_HEIGHT {
            let bar = RgbaImage::from_pixel(w, NAMEPLATE_HEIGHT, NAMEPLATE_BG);
            let bar_y = i64::from(h - NAMEPLATE_HEIGHT);
            imageops::overlay(&mut panel, &bar, 0, bar_y);
            if let Some(font) = &self.font {
                let label = format!(
                    "{} ({}, {}, {})",
                    player.name, player.x, player.y, player.z
                );
                draw_text_mut(
                    &mut panel,
                    TEXT,
                    6,
                    (h - NAMEPLATE_HEIGHT + 4) as i32,
                    PxScale::from(NAMEPLATE_FONT_SIZE),
                    font,
                    &label,
                );
            }
        }

        draw_hollow_rect_mut(&mut panel, Rect::at(0, 0).of_size(w, h), BORDER);
        panel
    }

    /// Test-mode decoration: tile outline plus the chunk coordinate the
    /// slot resolved to.
    fn draw_tile_overlay(
        &self,
        panel: &mut RgbaImage,
        player: &Player,
        tile: &PanelTile,
        pos: (i64, i64),
    ) {
        draw_hollow_rect_mut(
            panel,
            Rect::at(pos.0 as i32, pos.1 as i32).of_size(TILE_SIZE, TILE_SIZE),
            BORDER,
        );
        if let Some(font) = &self.font {
            let coord = ChunkCoord::from_world(
                player.x + tile.dx * BLOCKS_PER_TILE,
                player.z + tile.dy * BLOCKS_PER_TILE,
            );
            draw_text_mut(
                panel,
                TEXT,
                pos.0 as i32 + 2,
                pos.1 as i32 + 2,
                PxScale::from(OVERLAY_FONT_SIZE),
                font,
                &format!("{}, {}", coord.x, coord.y),
            );
        }
    }

    /// Full-window message on a plain background.
    fn status_screen(&self, size: (u32, u32), message: &str) -> RgbaImage {
        let (w, h) = size;
        let mut frame = RgbaImage::from_pixel(w, h, BACKGROUND);
        if let Some(font) = &self.font {
            let scale = PxScale::from(STATUS_FONT_SIZE);
            let text_width = measure_text_width(font, message, scale);
            let x = w.saturating_sub(text_width) / 2;
            let y = h.saturating_sub(STATUS_FONT_SIZE as u32) / 2;
            draw_text_mut(&mut frame, STATUS_TEXT, x as i32, y as i32, scale, font, message);
        }
        frame
    }
}

/// Width of `text` in pixels at the given scale.
fn measure_text_width(font: &impl Font, text: &str, scale: PxScale) -> u32 {
    let factor = scale.x / font.height_unscaled();
    let width: f32 = text
        .chars()
        .map(|c| font.h_advance_unscaled(font.glyph_id(c)) * factor)
        .sum();
    width as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn renderer() -> FrameRenderer {
        // No font: text layers drop out, everything else must still draw.
        FrameRenderer::new(None, false)
    }

    fn solid_tile(color: [u8; 4]) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba(color)))
    }

    fn named_player(name: &str) -> Player {
        let mut player = Player::test_fixture("world");
        player.name = name.to_string();
        player
    }

    fn sprite_with_center_tile(color: [u8; 4]) -> PanelSprite {
        PanelSprite {
            tiles: vec![PanelTile {
                dx: 0,
                dy: 0,
                image: solid_tile(color),
            }],
            face: None,
        }
    }

    fn snapshot_of(entries: Vec<(Player, PanelSprite)>) -> ViewSnapshot {
        let mut players = Vec::new();
        let mut sprites = HashMap::new();
        for (player, sprite) in entries {
            sprites.insert(player.name.clone(), sprite);
            players.push(player);
        }
        ViewSnapshot { players, sprites }
    }

    #[test]
    fn test_no_snapshot_renders_connecting_screen() {
        let frame = renderer().render((320, 240), None);
        assert_eq!(frame.dimensions(), (320, 240));
        assert_eq!(*frame.get_pixel(160, 120), BACKGROUND);
    }

    #[test]
    fn test_empty_roster_renders_fallback() {
        let snapshot = ViewSnapshot::default();
        let frame = renderer().render((320, 240), Some(&snapshot));
        assert_eq!(frame.dimensions(), (320, 240));
        assert_eq!(*frame.get_pixel(10, 10), BACKGROUND);
    }

    #[test]
    fn test_zero_size_renders_nothing() {
        let frame = renderer().render((0, 240), None);
        assert_eq!(frame.dimensions(), (0, 240));
    }

    #[test]
    fn test_single_panel_draws_tile_and_border() {
        let snapshot = snapshot_of(vec![(
            named_player("Steve"),
            sprite_with_center_tile([200, 0, 0, 255]),
        )]);
        let frame = renderer().render((256, 256), Some(&snapshot));

        // Center tile sits from the panel center outward.
        assert_eq!(*frame.get_pixel(200, 200), Rgba([200, 0, 0, 255]));
        // Outside the tile the background shows.
        assert_eq!(*frame.get_pixel(10, 10), BACKGROUND);
        // Panel border.
        assert_eq!(*frame.get_pixel(0, 0), BORDER);
    }

    #[test]
    fn test_unpopulated_player_is_skipped() {
        let player = named_player("Steve");
        let snapshot = ViewSnapshot {
            players: vec![player],
            sprites: HashMap::new(),
        };
        let frame = renderer().render((256, 256), Some(&snapshot));
        // No sprite yet: no border, no tiles, just background.
        assert_eq!(*frame.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*frame.get_pixel(200, 200), BACKGROUND);
    }

    #[test]
    fn test_hidden_world_player_is_not_drawn() {
        let mut ghost = named_player("Ghost");
        ghost.world = crate::dynmap::HIDDEN_WORLD.to_string();
        let snapshot = snapshot_of(vec![(ghost, sprite_with_center_tile([200, 0, 0, 255]))]);

        let frame = renderer().render((256, 256), Some(&snapshot));
        // Only player is hidden, so the empty-roster screen shows.
        for &(x, y) in &[(0u32, 0u32), (128, 128), (200, 200)] {
            assert_eq!(*frame.get_pixel(x, y), BACKGROUND);
        }
    }

    #[test]
    fn test_face_icon_sits_inside_the_border() {
        let mut sprite = sprite_with_center_tile([200, 0, 0, 255]);
        sprite.face = Some(Arc::new(RgbaImage::from_pixel(
            16,
            16,
            Rgba([255, 0, 255, 255]),
        )));
        let snapshot = snapshot_of(vec![(named_player("Steve"), sprite)]);

        let frame = renderer().render((256, 256), Some(&snapshot));
        assert_eq!(*frame.get_pixel(10, 10), Rgba([255, 0, 255, 255]));
    }

    #[test]
    fn test_four_players_fill_the_grid() {
        let colors: [[u8; 4]; 4] = [
            [200, 0, 0, 255],
            [0, 200, 0, 255],
            [0, 0, 200, 255],
            [200, 200, 0, 255],
        ];
        let entries = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| (named_player(&format!("P{i}")), sprite_with_center_tile(c)))
            .collect();
        let frame = renderer().render((1024, 768), Some(&snapshot_of(entries)));

        // 2 columns x 3 rows of 512x256 cells; each populated panel shows
        // its own tile just right of its cell center.
        let layout = Layout::compute((1024, 768), 4);
        assert_eq!((layout.cols, layout.rows), (2, 3));
        for (i, &color) in colors.iter().enumerate() {
            let (ox, oy) = layout.cell_origin(i as u32);
            let sample = frame.get_pixel(ox as u32 + 300, oy as u32 + 150);
            assert_eq!(*sample, Rgba(color), "panel {i}");
        }
        // The bottom row has no player and stays dark.
        assert_eq!(*frame.get_pixel(300, 700), BACKGROUND);
    }

    #[test]
    fn test_debug_overlay_outlines_tiles() {
        let renderer = FrameRenderer::new(None, true);
        let snapshot = snapshot_of(vec![(
            named_player("Steve"),
            sprite_with_center_tile([200, 0, 0, 255]),
        )]);
        let frame = renderer.render((256, 256), Some(&snapshot));
        // Tile outline starts at the panel center.
        assert_eq!(*frame.get_pixel(128, 128), BORDER);
    }

    #[test]
    fn test_tiles_clip_at_panel_edges() {
        let sprite = PanelSprite {
            tiles: vec![PanelTile {
                dx: -2,
                dy: -2,
                image: solid_tile([0, 200, 0, 255]),
            }],
            face: None,
        };
        let snapshot = snapshot_of(vec![(named_player("Steve"), sprite)]);
        // Tile origin lands off the panel; drawing must clip, not panic.
        let frame = renderer().render((256, 256), Some(&snapshot));
        assert_eq!(frame.dimensions(), (256, 256));
    }
}
