use crate::peer::capability::{
    AttemptId, CapabilityError, CapabilityEvent, CapabilityFactory, PeerCapability, RemoteStream,
};
use crate::peer::media::LocalStream;
use crate::peer::peer_config::PeerConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use beacon_core::SignalBlob;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// Label of the data channel opened by the offerer.
pub const DATA_CHANNEL_LABEL: &str = "beacon";

/// Opens [`WebRtcCapability`]s.
#[derive(Clone, Debug, Default)]
pub struct WebRtcFactory {
    config: PeerConfig,
}

impl WebRtcFactory {
    pub fn new(config: PeerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CapabilityFactory for WebRtcFactory {
    async fn open(
        &self,
        attempt: AttemptId,
        initiator: bool,
        stream: LocalStream,
        events: mpsc::UnboundedSender<CapabilityEvent>,
    ) -> Result<Box<dyn PeerCapability>, CapabilityError> {
        let capability =
            WebRtcCapability::new(attempt, initiator, &self.config, stream, events).await?;

        if initiator {
            capability.spawn_local_description();
        }

        Ok(Box::new(capability))
    }
}

/// One `RTCPeerConnection` in non-trickle mode: a description is reported
/// only after ICE gathering completes, so every blob carries its candidates.
pub struct WebRtcCapability {
    attempt: AttemptId,
    initiator: bool,
    peer_connection: Arc<RTCPeerConnection>,
    events: mpsc::UnboundedSender<CapabilityEvent>,
}

impl WebRtcCapability {
    pub async fn new(
        attempt: AttemptId,
        initiator: bool,
        config: &PeerConfig,
        stream: LocalStream,
        events: mpsc::UnboundedSender<CapabilityEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            Vec::new()
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers.clone(),
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        for track in stream.tracks {
            peer_connection
                .add_track(track)
                .await
                .context("Failed to attach local track")?;
        }

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state for attempt {}: {:?}", attempt, s);
                    if s == RTCPeerConnectionState::Failed {
                        let _ = tx.send(CapabilityEvent::Failed(
                            attempt,
                            "peer connection failed".to_owned(),
                        ));
                    }
                })
            },
        ));

        let track_tx = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    debug!("Remote {} track for attempt {}", track.kind(), attempt);
                    let _ = tx.send(CapabilityEvent::StreamReady(
                        attempt,
                        RemoteStream::Track(track),
                    ));
                })
            },
        ));

        let dc_tx = events.clone();
        peer_connection.on_data_channel(Box::new(move |channel: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();

            Box::pin(async move {
                debug!(
                    "Data channel '{}' announced for attempt {}",
                    channel.label(),
                    attempt
                );
                report_when_open(attempt, &channel, tx);
            })
        }));

        if initiator {
            let channel = peer_connection
                .create_data_channel(DATA_CHANNEL_LABEL, None)
                .await
                .context("Failed to create data channel")?;
            report_when_open(attempt, &channel, events.clone());
        }

        Ok(Self {
            attempt,
            initiator,
            peer_connection,
            events,
        })
    }

    /// Generate the local offer (initiator) or answer in the background and
    /// report it once ICE gathering is done.
    fn spawn_local_description(&self) {
        let peer_connection = Arc::clone(&self.peer_connection);
        let events = self.events.clone();
        let attempt = self.attempt;
        let initiator = self.initiator;

        tokio::spawn(async move {
            let event = match local_description(&peer_connection, initiator).await {
                Ok(blob) if initiator => CapabilityEvent::LocalOffer(attempt, blob),
                Ok(blob) => CapabilityEvent::LocalAnswer(attempt, blob),
                Err(e) => {
                    warn!("Attempt {} could not describe itself: {:#}", attempt, e);
                    CapabilityEvent::Failed(attempt, format!("{e:#}"))
                }
            };
            let _ = events.send(event);
        });
    }
}

#[async_trait]
impl PeerCapability for WebRtcCapability {
    async fn signal(&self, remote: SignalBlob) -> Result<(), CapabilityError> {
        let desc: RTCSessionDescription = remote
            .to_typed()
            .map_err(|e| CapabilityError::InvalidRemote(e.to_string()))?;

        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to apply remote description")?;

        if !self.initiator {
            self.spawn_local_description();
        }
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close attempt {}: {}", self.attempt, e);
        }
    }
}

async fn local_description(peer_connection: &RTCPeerConnection, initiator: bool) -> Result<SignalBlob> {
    let desc = if initiator {
        peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?
    } else {
        peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?
    };

    let mut gathered = peer_connection.gathering_complete_promise().await;
    peer_connection
        .set_local_description(desc)
        .await
        .context("Failed to apply local description")?;
    let _ = gathered.recv().await;

    let local = peer_connection
        .local_description()
        .await
        .context("Local description missing after ICE gathering")?;
    SignalBlob::from_typed(&local).context("Failed to encode local description")
}

fn report_when_open(
    attempt: AttemptId,
    channel: &Arc<RTCDataChannel>,
    tx: mpsc::UnboundedSender<CapabilityEvent>,
) {
    let weak = Arc::downgrade(channel);

    channel.on_open(Box::new(move || {
        let tx = tx.clone();
        let weak = weak.clone();

        Box::pin(async move {
            if let Some(channel) = weak.upgrade() {
                info!(
                    "Data channel '{}' open for attempt {}",
                    channel.label(),
                    attempt
                );
                let _ = tx.send(CapabilityEvent::StreamReady(
                    attempt,
                    RemoteStream::DataChannel(channel),
                ));
            }
        })
    }));
}
