use super::Configuration;

pub struct MaxConnections;

impl Configuration for MaxConnections {
    type Type = u32;

    fn default() -> Option<Self::Type> {
        Some(5)
    }

    fn key() -> &'static str {
        "DATABASE_MAX_CONNECTIONS"
    }
}
