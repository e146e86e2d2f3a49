pub mod errors;
pub mod format;

pub use errors::{PlaybackError, PlaybackResult};
pub use format::{format_duration, format_seconds};
