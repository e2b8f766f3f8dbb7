use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// World name the server reports for players whose location is hidden.
pub const HIDDEN_WORLD: &str = "-some-other-bogus-world-";

/// Shortest allowed gap between roster polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Server-side configuration fetched once at startup from `/up/configuration`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Milliseconds between server-side map updates.
    pub updaterate: f64,
    #[serde(default)]
    pub title: String,
    pub defaultworld: String,
    #[serde(default)]
    pub worlds: Vec<WorldInfo>,
}

impl ServerConfig {
    /// How often to poll the roster: half the server's update rate,
    /// clamped so a misconfigured server cannot make us busy-loop.
    pub fn poll_interval(&self) -> Duration {
        let half = Duration::from_millis((self.updaterate / 2.0) as u64);
        half.max(MIN_POLL_INTERVAL)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldInfo {
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// One poll result from `/up/world/{world}/0`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldUpdate {
    pub currentcount: u32,
    #[serde(default)]
    pub servertime: i64,
    pub timestamp: i64,
    #[serde(default)]
    pub players: Vec<Player>,
}

/// An online player as reported by the update endpoint.
///
/// Coordinates arrive as floats and are truncated to whole blocks; the
/// viewer never needs sub-block precision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Player {
    pub world: String,
    pub name: String,
    pub account: String,
    #[serde(deserialize_with = "de_block_coord")]
    pub x: i32,
    #[serde(deserialize_with = "de_block_coord")]
    pub y: i32,
    #[serde(deserialize_with = "de_block_coord")]
    pub z: i32,
    /// Set only on the synthetic player injected by `--test`.
    #[serde(skip)]
    pub test_fixture: bool,
}

impl Player {
    /// Synthetic stand-in used to exercise the UI against an empty server.
    pub fn test_fixture(world: &str) -> Self {
        Self {
            world: world.to_string(),
            name: "TestAccount".to_string(),
            account: "TestAccount".to_string(),
            x: 0,
            y: 0,
            z: 0,
            test_fixture: true,
        }
    }

    /// Whether the server is masking this player's real location.
    pub fn is_in_hidden_world(&self) -> bool {
        self.world == HIDDEN_WORLD
    }
}

fn de_block_coord<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value as i32)
}
