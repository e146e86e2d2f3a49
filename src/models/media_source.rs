use serde::{Deserialize, Serialize};

use super::{PosterRef, SourceRef};

/// The playable resource a controller binds to, plus its display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    pub source_ref: SourceRef,
    pub poster_ref: Option<PosterRef>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl MediaSource {
    pub fn new(source_ref: impl Into<SourceRef>) -> Self {
        Self {
            source_ref: source_ref.into(),
            poster_ref: None,
            title: None,
            description: None,
        }
    }

    pub fn with_poster(mut self, poster: impl Into<PosterRef>) -> Self {
        self.poster_ref = Some(poster.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Title for logs and status lines, falling back to the source reference
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(self.source_ref.as_str())
    }
}

/// Per-source playback options supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackOptions {
    /// Attempt playback as soon as the source is ready
    #[serde(default)]
    pub auto_play: bool,
    #[serde(default)]
    pub start_muted: bool,
}

impl PlaybackOptions {
    pub fn auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    pub fn start_muted(mut self, start_muted: bool) -> Self {
        self.start_muted = start_muted;
        self
    }
}
