//! Selection of the current connection.
//!
//! Resolution order when nothing has been selected yet:
//!
//! 1. a connection literally named `default`,
//! 2. the connection named by the `defaultConnection` key,
//! 3. the lexicographically first configured connection,
//! 4. a placeholder `default` connection pointing at [`DEFAULT_SERVICE_URL`].
//!
//! A `--connection` flag overrides all of the above for one command. The
//! override is pushed on top of the durable selection and popped again by
//! [`ConnectionManager::reset_connection`].

use crate::application::config_store::{ConfigStore, ConfigStoreExt};
use crate::application::registry::ConnectionRegistry;
use crate::domain::connection_stack::ConnectionStack;
use crate::domain::entities::Connection;
use crate::domain::errors::ConnectionError;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::{debug, info};

pub const DEFAULT_CONNECTION_NAME: &str = "default";
pub const DEFAULT_CONNECTION_NAME_KEY: &str = "defaultConnection";
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:80";

/// A connection as shown by `list connections`.
///
/// Serializes as name, URL and current marker only; the token and headers
/// stay out of listings.
#[derive(Debug, Clone)]
pub struct ConnectionListing {
    pub connection: Connection,
    pub current: bool,
}

impl Serialize for ConnectionListing {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut listing = serializer.serialize_struct("ConnectionListing", 3)?;
        listing.serialize_field("name", &self.connection.name)?;
        listing.serialize_field("serviceURL", &self.connection.service_url)?;
        listing.serialize_field("current", &self.current)?;
        listing.end()
    }
}

/// Owns the configuration store and the current-connection stack.
pub struct ConnectionManager<S: ConfigStore> {
    store: S,
    stack: ConnectionStack,
    flag_override: Option<String>,
    previously_set_by_flag: bool,
}

impl<S: ConfigStore> ConnectionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            stack: ConnectionStack::new(),
            flag_override: None,
            previously_set_by_flag: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn registry(&self) -> ConnectionRegistry<'_, S> {
        ConnectionRegistry::new(&self.store)
    }

    /// Records the connection requested on the command line for the next
    /// [`init_connections`](Self::init_connections). Empty names count as unset.
    pub fn set_flag_override(&mut self, name: Option<String>) {
        self.flag_override = name.filter(|n| !n.is_empty());
    }

    pub fn previously_set_by_flag(&self) -> bool {
        self.previously_set_by_flag
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn current_connection(&self) -> Option<&Connection> {
        self.stack.top()
    }

    pub fn find(&self, name: &str) -> Option<Connection> {
        self.registry().find(name)
    }

    /// Establishes the current connection.
    ///
    /// A flag override is pushed atop whatever is current. Without one, an existing
    /// selection is kept and an empty stack gets the resolved default. An override
    /// naming an unknown connection changes nothing and is returned as
    /// [`ConnectionError::NotFound`].
    pub fn init_connections(&mut self) -> Result<(), ConnectionError> {
        debug!("Initializing connections");

        if let Some(name) = self.flag_override.clone() {
            debug!(connection = %name, "Using connection flag value");
            let conn = self
                .registry()
                .find(&name)
                .ok_or_else(|| ConnectionError::not_found(&name))?;
            self.previously_set_by_flag = true;
            self.push(conn);
            return Ok(());
        }

        if !self.stack.is_empty() {
            return Ok(());
        }

        debug!("No current connection, resolving a default");
        let conn = self.resolve_default();
        self.push(conn);
        Ok(())
    }

    fn resolve_default(&self) -> Connection {
        let registry = self.registry();

        if let Some(conn) = registry.find(DEFAULT_CONNECTION_NAME) {
            return conn;
        }

        if self.store.is_set(DEFAULT_CONNECTION_NAME_KEY) {
            let configured = self.store.get_string(DEFAULT_CONNECTION_NAME_KEY);
            if let Some(conn) = registry.find(&configured) {
                return conn;
            }
        }

        let mut all = registry.list_all();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(first) = all.into_iter().next() {
            return first;
        }

        debug!("No connections configured, using a placeholder");
        Connection::new(DEFAULT_CONNECTION_NAME, DEFAULT_SERVICE_URL)
    }

    fn push(&mut self, conn: Connection) {
        debug!(connection = %conn.name, url = %conn.service_url, "Using connection");
        self.stack.push(conn);
    }

    /// Undoes a flag override once its command has finished.
    ///
    /// The sole remaining entry is never popped, so an override given when
    /// nothing else was selected becomes the durable connection.
    pub fn reset_connection(&mut self) {
        if !self.previously_set_by_flag {
            return;
        }
        self.previously_set_by_flag = false;
        if self.stack.depth() > 1 {
            debug!("Resetting connection to the one in use before the flag");
            self.stack.pop();
        }
    }

    /// Makes `name` the current connection, replacing the top of the stack.
    pub fn set_connection(&mut self, name: &str) -> Result<(), ConnectionError> {
        let conn = self
            .registry()
            .find(name)
            .ok_or_else(|| ConnectionError::not_found(name))?;
        info!(connection = %conn.name, "Switched connection");
        self.stack.replace_top(conn);
        Ok(())
    }

    /// All configured connections sorted by name, marking the current one.
    pub fn list_connections(&self) -> Vec<ConnectionListing> {
        let current = self.current_connection().map(|c| c.name.as_str());
        let mut all = self.registry().list_all();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all.into_iter()
            .map(|connection| ConnectionListing {
                current: Some(connection.name.as_str()) == current,
                connection,
            })
            .collect()
    }
}
