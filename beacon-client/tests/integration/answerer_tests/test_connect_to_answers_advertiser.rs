use beacon_client::{AdapterState, CapabilityEvent, ChannelEvent, ClientEvent, ControllerError};
use beacon_core::{ClientMessage, PeerId, ServerMessage, SignalEnvelope};

use crate::integration::init_tracing;
use crate::utils::{
    FakeFactory, answer, data_only_controller, directory, drain_events, fake_stream, offer,
};

#[tokio::test]
async fn test_connect_to_answers_advertiser() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, channel, mut events) = data_only_controller(&factory).await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Clients(directory(&[
            ("b", "bob"),
            ("c", "carol"),
        ]))))
        .await;
    assert_eq!(controller.directory().len(), 2);

    let attempt = controller.connect_to(&PeerId::from("b")).await.unwrap();

    let opened = factory.find(attempt).unwrap();
    assert!(!opened.initiator);
    assert_eq!(opened.signals(), vec![offer("O-b")]);
    assert_eq!(
        controller.answerer(attempt).map(|a| a.state()),
        Some(AdapterState::Negotiating)
    );

    controller
        .handle_capability_event(CapabilityEvent::LocalAnswer(attempt, answer("A1")))
        .await;

    assert_eq!(
        channel.sent(),
        vec![ClientMessage::Signal(SignalEnvelope {
            target_id: PeerId::from("b"),
            answer: answer("A1"),
        })]
    );

    controller
        .handle_capability_event(CapabilityEvent::StreamReady(attempt, fake_stream()))
        .await;
    assert_eq!(
        controller.answerer(attempt).map(|a| a.state()),
        Some(AdapterState::Connected)
    );

    let events = drain_events(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        ClientEvent::AnswerSent { attempt: a, remote } if *a == attempt && *remote == PeerId::from("b")
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ClientEvent::StreamReady { remote: Some(remote), .. } if *remote == PeerId::from("b")
    )));
}

#[tokio::test]
async fn test_directory_is_replaced_whole() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, _channel, mut events) = data_only_controller(&factory).await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Clients(directory(&[
            ("b", "bob"),
        ]))))
        .await;
    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Clients(directory(&[
            ("c", "carol"),
        ]))))
        .await;

    assert!(!controller.directory().contains(&PeerId::from("b")));
    assert!(controller.directory().contains(&PeerId::from("c")));

    let updates = drain_events(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ClientEvent::DirectoryUpdated(_)))
        .count();
    assert_eq!(updates, 2);
}

#[tokio::test]
async fn test_connect_to_requires_listed_peer() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, _channel, _events) = data_only_controller(&factory).await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Clients(directory(&[
            ("a", "alice"),
        ]))))
        .await;

    assert!(matches!(
        controller.connect_to(&PeerId::from("ghost")).await,
        Err(ControllerError::UnknownPeer(id)) if id == PeerId::from("ghost")
    ));
    assert!(matches!(
        controller.connect_to(&PeerId::from("a")).await,
        Err(ControllerError::OwnOffer)
    ));
    assert_eq!(factory.opened_count(), 0);
}
