//! The poll unit.
//!
//! A dedicated thread fetches the roster, refreshes tile windows, and
//! publishes immutable snapshots for the render loop. All network I/O
//! after startup happens here, so a slow server can only ever delay the
//! next snapshot, never a frame.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::coord::ChunkCoord;
use crate::dynmap::{DynmapClient, Player, ServerConfig};
use crate::error::Result;
use crate::view::cache::TileCache;
use crate::view::layout::Layout;
use crate::view::panel::TileWindows;
use crate::view::snapshot::{PanelSprite, ViewSnapshot};

/// Granularity of the inter-poll sleep; bounds how stale the cancel
/// flag can get while idle.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Render-side endpoints of the channels shared with the poll thread.
///
/// All three are single-slot last-write-wins; neither side ever queues
/// or blocks on the other.
pub struct ViewChannels {
    /// Latest published snapshot, `None` until the first successful poll.
    pub snapshot: watch::Receiver<Option<Arc<ViewSnapshot>>>,
    /// Current window inner size, fed from resize events.
    pub window_size: watch::Sender<(u32, u32)>,
    /// Flipped once at shutdown; observed at the next loop top.
    pub cancel: watch::Sender<bool>,
}

/// Start the poll thread. The returned handle must be joined after the
/// cancel flag is flipped so the process exits with the thread stopped.
pub fn spawn(
    client: DynmapClient,
    config: ServerConfig,
    test_mode: bool,
    initial_size: (u32, u32),
) -> (ViewChannels, thread::JoinHandle<()>) {
    let (snapshot_tx, snapshot_rx) = watch::channel(None);
    let (size_tx, size_rx) = watch::channel(initial_size);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let unit = PollUnit {
        client,
        config,
        test_mode,
        cache: TileCache::new(),
        windows: TileWindows::new(),
        snapshot_tx,
        window_size_rx: size_rx,
        cancel_rx,
    };
    let handle = thread::spawn(move || unit.run());

    (
        ViewChannels {
            snapshot: snapshot_rx,
            window_size: size_tx,
            cancel: cancel_tx,
        },
        handle,
    )
}

struct PollUnit {
    client: DynmapClient,
    config: ServerConfig,
    test_mode: bool,
    cache: TileCache,
    windows: TileWindows,
    snapshot_tx: watch::Sender<Option<Arc<ViewSnapshot>>>,
    window_size_rx: watch::Receiver<(u32, u32)>,
    cancel_rx: watch::Receiver<bool>,
}

impl PollUnit {
    fn run(mut self) {
        let interval = self.config.poll_interval();
        info!(
            world = %self.config.defaultworld,
            interval_ms = interval.as_millis() as u64,
            "poll loop started"
        );
        loop {
            if *self.cancel_rx.borrow() {
                break;
            }
            self.tick(Instant::now());
            if sleep_cancelled(&self.cancel_rx, interval) {
                break;
            }
        }
        info!("poll loop stopped");
    }

    /// One poll cycle. A roster failure skips the tick and leaves the
    /// previous snapshot on display; everything else degrades per slot.
    fn tick(&mut self, now: Instant) {
        let update = match self.client.update(&self.config.defaultworld) {
            Ok(update) => update,
            Err(err) => {
                warn!(error = %err, "roster fetch failed, skipping tick");
                return;
            }
        };
        debug!(
            players = update.players.len(),
            count = update.currentcount,
            timestamp = update.timestamp,
            "roster update"
        );

        let size = *self.window_size_rx.borrow();
        let test_world = self.test_mode.then_some(self.config.defaultworld.as_str());
        let client = &self.client;
        let snapshot = build_snapshot(
            update.players,
            test_world,
            size,
            &mut self.windows,
            &mut self.cache,
            now,
            |coord| client.world_tile(coord),
            |name| client.player_face(name),
        );
        self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
    }
}

/// Assemble the snapshot for one tick: inject the synthetic player when
/// asked, size panels from the current window, refresh every visible
/// player's tile window through the cache, and fetch faces fresh.
#[allow(clippy::too_many_arguments)]
fn build_snapshot<T, F>(
    mut players: Vec<Player>,
    test_world: Option<&str>,
    window_size: (u32, u32),
    windows: &mut TileWindows,
    cache: &mut TileCache,
    now: Instant,
    tile_fetch: T,
    face_fetch: F,
) -> ViewSnapshot
where
    T: Fn(ChunkCoord) -> Result<RgbaImage>,
    F: Fn(&str) -> Result<RgbaImage>,
{
    if let Some(world) = test_world {
        players.push(Player::test_fixture(world));
    }

    let visible: Vec<Player> = players
        .iter()
        .filter(|p| !p.is_in_hidden_world())
        .cloned()
        .collect();

    let mut sprites = HashMap::new();
    if !visible.is_empty() {
        let panel = Layout::compute(window_size, visible.len() as u32).cell_size();
        for player in &visible {
            windows.refresh(player, panel, cache, now, &tile_fetch);
            let face = match face_fetch(&player.name) {
                Ok(image) => Some(Arc::new(image)),
                Err(err) => {
                    debug!(player = %player.name, error = %err, "face unavailable");
                    None
                }
            };
            if let Some(window) = windows.get(&player.name) {
                sprites.insert(
                    player.name.clone(),
                    PanelSprite {
                        tiles: window.tiles().cloned().collect(),
                        face,
                    },
                );
            }
        }
    }

    ViewSnapshot { players, sprites }
}

/// Sleep for `duration` in slices, returning early with `true` once the
/// cancel flag flips.
fn sleep_cancelled(cancel: &watch::Receiver<bool>, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if *cancel.borrow() {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}
