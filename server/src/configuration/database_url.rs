use super::Configuration;

pub struct DatabaseUrl;

impl Configuration for DatabaseUrl {
    type Type = String;

    fn default() -> Option<Self::Type> {
        Some(String::from("sqlite://database.sqlite?mode=rwc"))
    }

    fn key() -> &'static str {
        "DATABASE_URL"
    }
}
