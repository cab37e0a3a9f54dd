use super::Configuration;

pub struct ServerPort;

impl Configuration for ServerPort {
    type Type = u16;

    fn default() -> Option<Self::Type> {
        Some(5001)
    }

    fn key() -> &'static str {
        "PORT"
    }
}
