use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

use crate::utils::PlaybackError;

macro_rules! impl_ref_type {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(reference: impl Into<String>) -> Self {
                Self(reference.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Resolve the reference to a URL. Strings without a scheme are
            /// treated as filesystem paths, relative ones against the
            /// current directory.
            pub fn to_url(&self) -> Result<Url, PlaybackError> {
                let raw = self.0.trim();
                if raw.is_empty() {
                    return Err(PlaybackError::InvalidSource(
                        "empty reference".to_string(),
                    ));
                }

                match Url::parse(raw) {
                    // Single-letter schemes are Windows drive letters, not URLs
                    Ok(url) if url.scheme().len() > 1 => Ok(url),
                    _ => {
                        let path = Path::new(raw);
                        let absolute = if path.is_absolute() {
                            path.to_path_buf()
                        } else {
                            std::env::current_dir()?.join(path)
                        };
                        Url::from_file_path(&absolute).map_err(|_| {
                            PlaybackError::InvalidSource(format!(
                                "cannot convert {:?} to a file URL",
                                absolute
                            ))
                        })
                    }
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_ref_type!(SourceRef);
impl_ref_type!(PosterRef);
