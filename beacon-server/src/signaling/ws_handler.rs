use crate::rendezvous::ServerCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{ClientMessage, ConnectionId};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let connection = ConnectionId::new();
    info!("New WebSocket connection: {}", connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(connection, tx);

    if let Err(e) = service.submit(ServerCommand::Connect { connection }).await {
        error!("Dropping connection {}: {:#}", connection, e);
        service.remove_peer(&connection);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match ClientMessage::decode(text.as_str()) {
                        Ok(message) => {
                            let cmd = ServerCommand::from_message(connection, message);
                            if let Err(e) = service.command_tx.send(cmd).await {
                                error!("Rendezvous server died: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Rejected message from {}: {}", connection, e);
                            service.send_rejection(connection, e.to_string());
                        }
                    },
                    Message::Binary(_) => {
                        warn!("Rejected binary frame from {}", connection);
                        service.send_rejection(
                            connection,
                            "binary frames are not supported".to_owned(),
                        );
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Clean and unclean closes end up here alike.
    let _ = service.submit(ServerCommand::Disconnect { connection }).await;
    service.remove_peer(&connection);
    info!("WebSocket disconnected: {}", connection);
}
