use super::Configuration;

/// A prebuilt frontend to serve at `/`. Unset by default.
pub struct StaticDirectory;

impl Configuration for StaticDirectory {
    type Type = String;

    fn default() -> Option<Self::Type> {
        None
    }

    fn key() -> &'static str {
        "STATIC_DIR"
    }
}
