use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::{
    client::ClientId,
    messages::{ClientToServer, ServerToClient},
    role::Role,
};

#[derive(Debug)]
pub enum CoordinatorMessage {
    /// A socket finished its handshake and wants a role
    ClientConnected {
        client_id: ClientId,
        addr: SocketAddr,
        client_response_tx: mpsc::UnboundedSender<Arc<ServerToClient>>,
        role_tx: oneshot::Sender<Role>,
    },

    /// A parsed event read from a client socket
    ClientEvent {
        client_id: ClientId,
        event: ClientToServer,
    },

    /// Client disconnected, release its role and group membership
    ClientDisconnected { client_id: ClientId },

    /// Drop every connection and stop the coordinator
    Shutdown,
}
