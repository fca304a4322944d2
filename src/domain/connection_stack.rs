use crate::domain::entities::Connection;

/// LIFO of connection selections. The top entry is the current connection.
///
/// A flag given for a single command pushes its connection on top of the durable
/// one, and popping it afterwards brings the durable selection back.
#[derive(Debug, Default, Clone)]
pub struct ConnectionStack {
    entries: Vec<Connection>,
}

impl ConnectionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `conn` unless the top already has the same name.
    ///
    /// Returns whether the stack grew.
    pub fn push(&mut self, conn: Connection) -> bool {
        if self.top().is_some_and(|top| top.same_as(&conn)) {
            return false;
        }
        self.entries.push(conn);
        true
    }

    /// Removes the top entry. Popping an empty stack yields `None`.
    pub fn pop(&mut self) -> Option<Connection> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<&Connection> {
        self.entries.last()
    }

    /// Replaces the top entry with `conn` without growing the stack.
    pub fn replace_top(&mut self, conn: Connection) {
        self.pop();
        self.push(conn);
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
