use crate::channel::signalling_channel::{ChannelError, ChannelEvent, SignallingChannel};
use async_trait::async_trait;
use beacon_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket signalling channel to a rendezvous server.
pub struct WsSignallingChannel {
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsSignallingChannel {
    /// Connect to `url` (e.g. `ws://localhost:3001/ws`). The returned receiver
    /// yields `Connected` first and `Disconnected` last.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), ChannelError> {
        let (ws, _response) = connect_async(url).await?;
        info!("Signalling channel open: {}", url);

        let (mut sink, mut stream) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let _ = event_tx.send(ChannelEvent::Connected);

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() || closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ServerMessage::decode(text.as_str()) {
                        Ok(msg) => {
                            if event_tx.send(ChannelEvent::Message(msg)).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid server message: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signalling channel failed: {}", e);
                        break;
                    }
                }
            }

            debug!("Signalling channel reader finished");
            let _ = event_tx.send(ChannelEvent::Disconnected);
        });

        Ok((Self { outbound }, event_rx))
    }
}

#[async_trait]
impl SignallingChannel for WsSignallingChannel {
    async fn send(&self, msg: ClientMessage) -> Result<(), ChannelError> {
        let json = msg.encode()?;
        self.outbound
            .send(Message::text(json))
            .map_err(|_| ChannelError::Closed)
    }

    async fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}
