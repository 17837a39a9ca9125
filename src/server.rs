use crate::client::handle_client;
use crate::messages::CoordinatorMessage;
use crate::relay_coordinator::relay_coordinator;
use crate::role::RoleRegistry;
use socket2::{SockRef, TcpKeepalive};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{debug, error, info, warn};

/// Accepts sockets until `shutdown` resolves, then tears the relay down.
pub async fn serve<F>(listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let (coordinator_tx, coordinator_rx) = mpsc::unbounded_channel::<CoordinatorMessage>();
    let coordinator = tokio::spawn(relay_coordinator(coordinator_rx, RoleRegistry::new()));

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let keepalive = TcpKeepalive::new()
                    .with_time(Duration::from_secs(10))
                    .with_interval(Duration::from_secs(1));
                let sf = SockRef::from(&socket);
                let _ = sf.set_tcp_keepalive(&keepalive);

                tokio::spawn(accept_client(socket, addr, coordinator_tx.clone()));
            }
            _ = &mut shutdown => {
                info!("Shutdown requested, closing all connections");
                break;
            }
        }
    }

    let _ = coordinator_tx.send(CoordinatorMessage::Shutdown);
    coordinator.await?;
    Ok(())
}

async fn accept_client(
    socket: TcpStream,
    addr: SocketAddr,
    coordinator_tx: mpsc::UnboundedSender<CoordinatorMessage>,
) {
    match tokio_tungstenite::accept_hdr_async(socket, open_cors).await {
        Ok(ws) => handle_client(ws, addr, coordinator_tx).await,
        Err(e) => warn!("WebSocket handshake with {} failed: {}", addr, e),
    }
}

// Any origin may connect
fn open_cors(request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    if let Some(origin) = request.headers().get("origin") {
        debug!("Handshake from origin {:?}", origin);
    }
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Methods", HeaderValue::from_static("GET, POST"));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio::sync::oneshot;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Start a relay on an OS-assigned port. Dropping the sender shuts it down.
    async fn start_server() -> (String, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            serve(listener, async move {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
        });
        (format!("ws://{}", addr), shutdown_tx)
    }

    async fn connect(url: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        ws
    }

    async fn emit(ws: &mut Ws, event: &str, data: Option<Value>) {
        let frame = match data {
            Some(data) => json!({"event": event, "data": data}),
            None => json!({"event": event}),
        };
        ws.send(Message::text(frame.to_string())).await.unwrap();
    }

    async fn next_event(ws: &mut Ws) -> Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended")
                .expect("websocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("invalid JSON");
            }
        }
    }

    async fn assert_silent(ws: &mut Ws) {
        let got = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
        assert!(got.is_err(), "expected no event, got {:?}", got);
    }

    /// Connect and consume the role event
    async fn join(url: &str, expected_role: &str) -> Ws {
        let mut ws = connect(url).await;
        assert_eq!(next_event(&mut ws).await, json!({"event": expected_role}));
        ws
    }

    #[tokio::test]
    async fn test_ball_moved_reaches_viewer_not_admin() {
        let (url, _shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;
        let mut b = join(&url, "user").await;

        emit(&mut a, "ballMoved", Some(json!({"x": 10, "y": 20}))).await;

        assert_eq!(
            next_event(&mut b).await,
            json!({"event": "ballMoved", "data": {"x": 10, "y": 20}})
        );
        assert_silent(&mut a).await;
    }

    #[tokio::test]
    async fn test_admin_disconnect_promotes_next_connection() {
        let (url, _shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;
        let mut b = join(&url, "user").await;

        a.close(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut c = join(&url, "admin").await;
        let _d = join(&url, "user").await;

        // b kept its viewer role and now hears the new admin
        emit(&mut c, "ballMoved", Some(json!({"x": 3, "y": 4}))).await;
        assert_eq!(
            next_event(&mut b).await,
            json!({"event": "ballMoved", "data": {"x": 3, "y": 4}})
        );
    }

    #[tokio::test]
    async fn test_viewer_disconnect_keeps_admin() {
        let (url, _shutdown) = start_server().await;
        let _a = join(&url, "admin").await;
        let mut b = join(&url, "user").await;

        b.close(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let _c = join(&url, "user").await;
    }

    #[tokio::test]
    async fn test_button_click_relayed_from_any_sender() {
        let (url, _shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;
        let mut b = join(&url, "user").await;
        let mut c = join(&url, "user").await;

        emit(&mut b, "adminButtonClicked", Some(json!("Button 7"))).await;

        let expected = json!({"event": "adminButtonClicked", "data": "Button 7"});
        assert_eq!(next_event(&mut b).await, expected);
        assert_eq!(next_event(&mut c).await, expected);
        assert_silent(&mut a).await;
    }

    #[tokio::test]
    async fn test_dead_events_reach_nobody() {
        let (url, _shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;
        let mut b = join(&url, "user").await;

        emit(&mut a, "ballPosition", Some(json!({"x": 1, "y": 2}))).await;
        emit(&mut b, "userButtonClicked", Some(json!({"x": 1, "y": 2}))).await;
        emit(&mut a, "somethingElse", None).await;

        assert_silent(&mut a).await;
        assert_silent(&mut b).await;
    }

    #[tokio::test]
    async fn test_role_request_is_echoed() {
        let (url, _shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;
        let mut b = join(&url, "user").await;

        emit(&mut a, "admin", None).await;
        assert_eq!(next_event(&mut a).await, json!({"event": "admin"}));

        emit(&mut b, "viewer", None).await;
        assert_eq!(next_event(&mut b).await, json!({"event": "user"}));
        assert_silent(&mut a).await;
    }

    #[tokio::test]
    async fn test_garbage_frame_keeps_connection_open() {
        let (url, _shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;

        a.send(Message::text("definitely not json")).await.unwrap();
        emit(&mut a, "user", None).await;

        assert_eq!(next_event(&mut a).await, json!({"event": "user"}));
    }

    #[tokio::test]
    async fn test_handshake_allows_any_origin() {
        let (url, _shutdown) = start_server().await;
        let (_ws, response) = tokio_tungstenite::connect_async(&url).await.unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_shutdown_closes_clients() {
        let (url, shutdown) = start_server().await;
        let mut a = join(&url, "admin").await;

        drop(shutdown);

        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match a.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;
        assert!(closed.is_ok());
    }
}
