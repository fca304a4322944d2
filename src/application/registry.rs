use crate::application::config_store::{ConfigStore, scalar_to_string};
use crate::domain::entities::Connection;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

pub const CONNECTIONS_KEY: &str = "connections";
pub const SERVICE_URL_KEY: &str = "serviceURL";
pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const HEADERS_KEY: &str = "headers";

/// Connections derived from the `connections` section of the configuration.
///
/// Nothing is cached: each call reads the store again, so a reloaded
/// configuration is visible straight away.
pub struct ConnectionRegistry<'a, S: ConfigStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ConfigStore + ?Sized> ConnectionRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every configured connection, in no particular order.
    pub fn list_all(&self) -> Vec<Connection> {
        match self.store.get(CONNECTIONS_KEY) {
            Some(Value::Object(entries)) => entries
                .into_iter()
                .map(|(name, entry)| connection_from_entry(name, entry))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Looks a connection up by exact name. Missing fields default to empty.
    ///
    /// Names are matched as whole keys of the `connections` section, so a name
    /// containing `.` is found like any other.
    pub fn find(&self, name: &str) -> Option<Connection> {
        if name.is_empty() {
            return None;
        }
        match self.store.get(CONNECTIONS_KEY) {
            Some(Value::Object(mut entries)) => entries
                .remove(name)
                .map(|entry| connection_from_entry(name.to_string(), entry)),
            _ => None,
        }
    }
}

fn connection_from_entry(name: String, entry: Value) -> Connection {
    let Value::Object(mut fields) = entry else {
        warn!(connection = %name, "Connection entry is not a map, its fields are ignored");
        return Connection {
            name,
            ..Connection::default()
        };
    };
    let mut string_field = |key: &str| fields.remove(key).map(scalar_to_string).unwrap_or_default();
    let service_url = string_field(SERVICE_URL_KEY);
    let auth_token = string_field(AUTH_TOKEN_KEY);
    let headers = match fields.remove(HEADERS_KEY) {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| (k, scalar_to_string(v)))
            .collect(),
        _ => HashMap::new(),
    };
    Connection {
        name,
        service_url,
        auth_token,
        headers,
    }
}
