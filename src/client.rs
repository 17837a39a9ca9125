use crate::messages::{ClientToServer, CoordinatorMessage, ServerToClient};
use crate::role::Role;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type ClientId = Uuid;

#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub role: Option<Role>,
    coordinator_channel: mpsc::UnboundedSender<CoordinatorMessage>,
}

impl Client {
    pub fn new(addr: SocketAddr, coordinator_channel: mpsc::UnboundedSender<CoordinatorMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            addr,
            role: None,
            coordinator_channel,
        }
    }

    pub fn send_to_coordinator(
        &self,
        message: CoordinatorMessage,
    ) -> Result<(), mpsc::error::SendError<CoordinatorMessage>> {
        self.coordinator_channel.send(message)
    }
}

/// Drives one upgraded socket from admission to disconnect
pub async fn handle_client(
    socket: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    coordinator_tx: mpsc::UnboundedSender<CoordinatorMessage>,
) {
    let (writer_tx, writer_rx) = mpsc::unbounded_channel::<Arc<ServerToClient>>();
    let mut client = Client::new(addr, coordinator_tx);

    info!("Client {} connected from {}", client.id, addr);

    let (socket_writer, mut socket_reader) = socket.split();

    // The coordinator owns the only sender, so the writer ends when it lets go
    let write_task = tokio::spawn(handle_client_writer(socket_writer, writer_rx));

    let (role_tx, role_rx) = oneshot::channel::<Role>();
    if client
        .send_to_coordinator(CoordinatorMessage::ClientConnected {
            client_id: client.id,
            addr,
            client_response_tx: writer_tx,
            role_tx,
        })
        .is_err()
    {
        error!("Coordinator gone, dropping client {}", client.id);
        write_task.abort();
        return;
    }

    match role_rx.await {
        Ok(role) => client.role = Some(role),
        Err(_) => {
            error!("No role assigned to client {}", client.id);
            write_task.abort();
            return;
        }
    }

    while let Some(frame) = socket_reader.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientToServer::from_json(text.as_str()) {
                Ok(event) => {
                    let message = CoordinatorMessage::ClientEvent {
                        client_id: client.id,
                        event,
                    };
                    if client.send_to_coordinator(message).is_err() {
                        debug!("Coordinator closed while reading from {}", client.id);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to parse event from {}: {}", client.addr, e);
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", client.id);
                break;
            }
            // Ping/Pong are answered by tungstenite, binary frames are not part of the protocol
            Ok(_) => {}
            Err(e) => {
                error!("Client {} ({}) read error: {}", client.id, client.addr, e);
                break;
            }
        }
    }

    let _ = client.send_to_coordinator(CoordinatorMessage::ClientDisconnected {
        client_id: client.id,
    });

    debug!(
        "Client {} cleanup complete (was {})",
        client.id,
        client.role.map(|r| r.to_string()).unwrap_or_default()
    );
}

async fn handle_client_writer(
    mut writer: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut rx: mpsc::UnboundedReceiver<Arc<ServerToClient>>,
) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = writer.send(Message::text(message.to_json())).await {
            error!("Failed to write to client: {}", e);
            break;
        }
    }
    let _ = writer.close().await;
}
