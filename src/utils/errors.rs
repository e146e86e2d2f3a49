use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Source error: {0}")]
    Source(String),

    #[error("Invalid source reference: {0}")]
    InvalidSource(String),

    #[error("Playback not allowed: {0}")]
    NotAllowed(String),

    #[error("Fullscreen request denied: {0}")]
    FullscreenDenied(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Player controller disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Whether the engine refused to start playback because of an
    /// environment policy (autoplay restrictions and the like).
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, Self::NotAllowed(_))
    }
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
