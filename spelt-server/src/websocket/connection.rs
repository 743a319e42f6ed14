use spelt_types::{ServerMessage, User};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub user: Option<User>,
    pub connected_at: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let connection = Self {
            id,
            user: None,
            connected_at: Instant::now(),
            sender,
        };

        (connection, receiver)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }
}

/// Registry of open connections and who is signed in on each
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> (
        mpsc::UnboundedSender<ServerMessage>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let (conn, receiver) = Connection::new(id);
        let sender = conn.sender.clone();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        (sender, receiver)
    }

    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        connections.remove(&id)
    }

    pub async fn get_user(&self, id: ConnectionId) -> Option<User> {
        let connections = self.connections.read().await;
        connections.get(&id).and_then(|conn| conn.user.clone())
    }

    pub async fn set_connection_user(&self, id: ConnectionId, user: Option<User>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.user = user;
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn signed_in_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.is_authenticated())
            .count()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
