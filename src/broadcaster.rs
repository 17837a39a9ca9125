use crate::client::ClientId;
use crate::messages::ServerToClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A named set of connections that can be targeted as one.
#[derive(Debug)]
pub struct BroadcastGroup {
    name: &'static str,
    members: HashMap<ClientId, mpsc::UnboundedSender<Arc<ServerToClient>>>,
}

impl BroadcastGroup {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            members: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn join(&mut self, client_id: ClientId, sender: mpsc::UnboundedSender<Arc<ServerToClient>>) {
        self.members.insert(client_id, sender);
    }

    pub fn leave(&mut self, client_id: ClientId) -> bool {
        self.members.remove(&client_id).is_some()
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains_key(&client_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fire-and-forget: a closed member channel is skipped, not reported.
    pub fn broadcast(&self, response: ServerToClient) {
        let message = Arc::new(response);
        for sender in self.members.values() {
            let _ = sender.send(message.clone());
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
