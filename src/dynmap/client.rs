use std::time::Duration;

use image::RgbaImage;

use crate::coord::ChunkCoord;
use crate::dynmap::models::{ServerConfig, WorldUpdate};
use crate::error::{Error, Result};

/// Upper bound on any single request. Quit requests are only observed
/// between requests, so this also bounds shutdown latency.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Blocking client for a Dynmap server's public HTTP surface.
///
/// All methods issue a single GET and treat any non-2xx status as
/// [`Error::Endpoint`] carrying the failed URL.
#[derive(Debug, Clone)]
pub struct DynmapClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl DynmapClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the server's static configuration. Called once at startup;
    /// a failure here is fatal to the whole program.
    pub fn configuration(&self) -> Result<ServerConfig> {
        let url = self.configuration_url();
        let body = self.get_text(&url)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the current state of a world, including the online roster.
    pub fn update(&self, world: &str) -> Result<WorldUpdate> {
        let url = self.update_url(world);
        let body = self.get_text(&url)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a player's 16x16 face icon.
    pub fn player_face(&self, name: &str) -> Result<RgbaImage> {
        let url = self.face_url(name);
        let bytes = self.get_bytes(&url)?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    /// Fetch the flat-view map tile at a chunk coordinate.
    pub fn world_tile(&self, coord: ChunkCoord) -> Result<RgbaImage> {
        let url = self.tile_url(coord);
        let bytes = self.get_bytes(&url)?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    fn configuration_url(&self) -> String {
        format!("{}/up/configuration", self.base_url)
    }

    fn update_url(&self, world: &str) -> String {
        format!("{}/up/world/{}/0", self.base_url, world)
    }

    fn face_url(&self, name: &str) -> String {
        format!("{}/tiles/faces/16x16/{}.png", self.base_url, name)
    }

    // The flat view is only published for the overworld, so the world
    // path segment is fixed.
    fn tile_url(&self, coord: ChunkCoord) -> String {
        format!(
            "{}/tiles/world/flat/-1_0/{}_{}.jpg",
            self.base_url, coord.x, coord.y
        )
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send()?;
        if !response.status().is_success() {
            return Err(Error::endpoint(url));
        }
        Ok(response.text()?)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send()?;
        if !response.status().is_success() {
            return Err(Error::endpoint(url));
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DynmapClient {
        DynmapClient::new("http://dynmap.example:8123/").unwrap()
    }

    #[test]
    fn test_base_url_drops_trailing_slash() {
        assert_eq!(client().base_url(), "http://dynmap.example:8123");
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client();
        assert_eq!(
            client.configuration_url(),
            "http://dynmap.example:8123/up/configuration"
        );
        assert_eq!(
            client.update_url("world"),
            "http://dynmap.example:8123/up/world/world/0"
        );
        assert_eq!(
            client.face_url("Steve"),
            "http://dynmap.example:8123/tiles/faces/16x16/Steve.png"
        );
    }

    #[test]
    fn test_tile_url_uses_chunk_coords() {
        assert_eq!(
            client().tile_url(ChunkCoord::new(3, -2)),
            "http://dynmap.example:8123/tiles/world/flat/-1_0/3_-2.jpg"
        );
    }
}
