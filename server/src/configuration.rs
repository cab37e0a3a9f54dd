mod api_base;
mod database_url;
mod max_connections;
mod server_port;
mod static_directory;

pub use self::{
    api_base::ApiBase, database_url::DatabaseUrl, max_connections::MaxConnections,
    server_port::ServerPort, static_directory::StaticDirectory,
};

use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, env};

pub trait Configuration {
    type Type: Serialize + DeserializeOwned;

    fn default() -> Option<Self::Type>;
    fn key() -> &'static str;
}

/// Raw configuration values keyed by environment variable name. Values are
/// decoded on access, falling back to each key's default when missing or
/// unparseable.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationManager {
    active_configuration: HashMap<String, String>,
}

impl ConfigurationManager {
    pub fn from_env() -> Self {
        Self {
            active_configuration: env::vars().collect(),
        }
    }

    pub fn set<T: Configuration>(&mut self, value: impl Into<String>) -> &mut Self {
        self.active_configuration
            .insert(T::key().to_owned(), value.into());
        self
    }

    pub fn get<T: Configuration>(&self) -> Option<T::Type> {
        self.active_configuration
            .get(T::key())
            .and_then(|raw| {
                serde_json::from_str(raw)
                    .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.clone())))
                    .ok()
            })
            .or_else(T::default)
    }
}
