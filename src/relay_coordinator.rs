use crate::broadcaster::BroadcastGroup;
use crate::client::ClientId;
use crate::messages::{ClientToServer, CoordinatorMessage, ServerToClient};
use crate::role::{Role, RoleRegistry};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// All role and group state. Only the coordinator task touches it, so every
/// event runs to completion before the next one is looked at.
pub struct Relay {
    registry: RoleRegistry,
    admin_group: BroadcastGroup,
    viewer_group: BroadcastGroup,
    connections: HashMap<ClientId, mpsc::UnboundedSender<Arc<ServerToClient>>>,
}

impl Relay {
    pub fn new(registry: RoleRegistry) -> Self {
        Self {
            registry,
            admin_group: BroadcastGroup::new("adminGroup"),
            viewer_group: BroadcastGroup::new("viewerGroup"),
            connections: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn admin_group(&self) -> &BroadcastGroup {
        &self.admin_group
    }

    pub fn viewer_group(&self) -> &BroadcastGroup {
        &self.viewer_group
    }

    pub fn connect(
        &mut self,
        client_id: ClientId,
        addr: SocketAddr,
        client_response_tx: mpsc::UnboundedSender<Arc<ServerToClient>>,
    ) -> Role {
        let role = self.registry.assign(client_id);
        let group = match role {
            Role::Admin => &mut self.admin_group,
            Role::Viewer => &mut self.viewer_group,
        };
        group.join(client_id, client_response_tx.clone());
        let _ = client_response_tx.send(Arc::new(ServerToClient::role(role)));
        self.connections.insert(client_id, client_response_tx);

        info!("Client {} ({}) joined {} as {}", client_id, addr, group.name(), role);
        role
    }

    pub fn handle_event(&mut self, client_id: ClientId, event: ClientToServer) {
        match event {
            ClientToServer::Admin => {
                info!("Admin is connected ({})", client_id);
                self.send_to(client_id, ServerToClient::Admin);
            }
            ClientToServer::User => {
                info!("User is connected ({})", client_id);
                self.send_to(client_id, ServerToClient::User);
            }
            ClientToServer::BallMoved(data) => {
                self.viewer_group.broadcast(ServerToClient::BallMoved(data));
            }
            ClientToServer::AdminButtonClicked(data) => {
                debug!("Client {} clicked {}", client_id, data);
                self.viewer_group
                    .broadcast(ServerToClient::AdminButtonClicked(data));
            }
            ClientToServer::ViewerButtonClicked(_)
            | ClientToServer::BallPosition(_)
            | ClientToServer::Unhandled { .. } => {
                debug!("Dropping {} from client {}", event.name(), client_id);
            }
        }
    }

    pub fn disconnect(&mut self, client_id: ClientId) {
        if self.registry.release(client_id) {
            info!("Admin is disconnected ({})", client_id);
        }
        self.admin_group.leave(client_id);
        self.viewer_group.leave(client_id);
        self.connections.remove(&client_id);
        debug!(
            "Client {} cleaned up ({} admin, {} viewers left)",
            client_id,
            self.admin_group.len(),
            self.viewer_group.len()
        );
    }

    /// Drops every outbound sender, which closes each client's writer.
    pub fn shutdown(&mut self) {
        self.registry.clear();
        self.admin_group.clear();
        self.viewer_group.clear();
        self.connections.clear();
    }

    fn send_to(&self, client_id: ClientId, response: ServerToClient) {
        if let Some(sender) = self.connections.get(&client_id) {
            let _ = sender.send(Arc::new(response));
        }
    }
}

/// Serialises every connect, event and disconnect through one task
pub async fn relay_coordinator(
    mut rx: mpsc::UnboundedReceiver<CoordinatorMessage>,
    registry: RoleRegistry,
) {
    let mut relay = Relay::new(registry);

    info!("Relay coordinator started");

    while let Some(msg) = rx.recv().await {
        match msg {
            CoordinatorMessage::ClientConnected {
                client_id,
                addr,
                client_response_tx,
                role_tx,
            } => {
                let role = relay.connect(client_id, addr, client_response_tx);
                let _ = role_tx.send(role);
            }
            CoordinatorMessage::ClientEvent { client_id, event } => {
                relay.handle_event(client_id, event);
            }
            CoordinatorMessage::ClientDisconnected { client_id } => {
                relay.disconnect(client_id);
            }
            CoordinatorMessage::Shutdown => {
                relay.shutdown();
                break;
            }
        }
    }

    info!("Relay coordinator stopped");
}
