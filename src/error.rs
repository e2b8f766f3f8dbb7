#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid endpoint: {url}")]
    Endpoint { url: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad image data: {0}")]
    Image(#[from] image::ImageError),

    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("surface: {0}")]
    Surface(#[from] softbuffer::SoftBufferError),
}

impl Error {
    pub fn endpoint(url: impl Into<String>) -> Self {
        Self::Endpoint { url: url.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
