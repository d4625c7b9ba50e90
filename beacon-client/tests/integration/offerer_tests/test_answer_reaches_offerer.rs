use beacon_client::{AdapterState, CapabilityEvent, ChannelEvent, ClientEvent};
use beacon_core::{PeerId, ServerMessage, SignalEnvelope};

use crate::integration::init_tracing;
use crate::utils::{FakeFactory, answer, data_only_controller, drain_events, fake_stream, offer};

#[tokio::test]
async fn test_answer_reaches_offerer() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, _channel, mut events) = data_only_controller(&factory).await;

    let attempt = controller.create_room().await.unwrap();
    controller
        .handle_capability_event(CapabilityEvent::LocalOffer(attempt, offer("O1")))
        .await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Signal(SignalEnvelope {
            target_id: PeerId::from("a"),
            answer: answer("A1"),
        })))
        .await;

    let opened = factory.find(attempt).unwrap();
    assert_eq!(opened.signals(), vec![answer("A1")]);
    assert_eq!(
        controller.offerer().map(|o| o.state()),
        Some(AdapterState::Answered)
    );

    controller
        .handle_capability_event(CapabilityEvent::StreamReady(attempt, fake_stream()))
        .await;

    assert_eq!(
        controller.offerer().map(|o| o.state()),
        Some(AdapterState::Connected)
    );
    let ready = drain_events(&mut events).into_iter().find_map(|e| match e {
        ClientEvent::StreamReady {
            attempt: a, remote, ..
        } => Some((a, remote)),
        _ => None,
    });
    assert_eq!(ready, Some((attempt, None)));
}

#[tokio::test]
async fn test_answer_for_someone_else_is_ignored() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, _channel, _events) = data_only_controller(&factory).await;

    let attempt = controller.create_room().await.unwrap();
    controller
        .handle_capability_event(CapabilityEvent::LocalOffer(attempt, offer("O1")))
        .await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Signal(SignalEnvelope {
            target_id: PeerId::from("b"),
            answer: answer("A1"),
        })))
        .await;

    assert!(factory.find(attempt).unwrap().signals().is_empty());
    assert_eq!(
        controller.offerer().map(|o| o.state()),
        Some(AdapterState::AwaitingAnswer)
    );
}

#[tokio::test]
async fn test_answer_without_room_is_ignored() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, channel, mut events) = data_only_controller(&factory).await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Signal(SignalEnvelope {
            target_id: PeerId::from("a"),
            answer: answer("A1"),
        })))
        .await;

    assert!(controller.offerer().is_none());
    assert_eq!(channel.sent_count(), 0);
    assert!(drain_events(&mut events).is_empty());
}
