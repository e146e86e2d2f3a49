mod media_source;
mod references;
mod session;

pub use media_source::{MediaSource, PlaybackOptions};
pub use references::{PosterRef, SourceRef};
pub use session::{ControlsVisibility, PlaybackSession, PlaybackState, PlayerSnapshot, SeekGesture};
