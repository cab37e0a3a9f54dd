use super::Configuration;

pub struct ApiBase;

impl Configuration for ApiBase {
    type Type = String;

    fn default() -> Option<Self::Type> {
        Some(String::from("/api/articles"))
    }

    fn key() -> &'static str {
        "API_BASE"
    }
}
