use beacon_client::{AdapterState, CapabilityEvent, ChannelEvent, ClientEvent};
use beacon_core::{PeerId, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{FakeFactory, data_only_controller, directory, drain_events, offer};

#[tokio::test]
async fn test_failure_is_isolated() {
    init_tracing();
    let factory = FakeFactory::manual();
    let (mut controller, _channel, mut events) = data_only_controller(&factory).await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Clients(directory(&[
            ("b", "bob"),
            ("c", "carol"),
        ]))))
        .await;

    let room = controller.create_room().await.unwrap();
    controller
        .handle_capability_event(CapabilityEvent::LocalOffer(room, offer("O1")))
        .await;
    let to_bob = controller.connect_to(&PeerId::from("b")).await.unwrap();
    let to_carol = controller.connect_to(&PeerId::from("c")).await.unwrap();
    drain_events(&mut events);

    controller
        .handle_capability_event(CapabilityEvent::Failed(to_bob, "ice failed".to_owned()))
        .await;

    // The failed attempt is closed and forgotten, without a retry.
    assert!(controller.answerer(to_bob).is_none());
    assert!(factory.find(to_bob).unwrap().is_closed());
    assert_eq!(factory.opened_count(), 3);

    assert_eq!(
        controller.answerer(to_carol).map(|a| a.state()),
        Some(AdapterState::Negotiating)
    );
    assert_eq!(
        controller.offerer().map(|o| o.state()),
        Some(AdapterState::AwaitingAnswer)
    );

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        ClientEvent::AttemptFailed { attempt, reason } if *attempt == to_bob && reason == "ice failed"
    ));

    // Late events of the failed attempt change nothing.
    controller
        .handle_capability_event(CapabilityEvent::Failed(to_bob, "again".to_owned()))
        .await;
    assert_eq!(controller.answerer_count(), 1);
}

#[tokio::test]
async fn test_refused_offer_fails_attempt() {
    init_tracing();
    let factory = FakeFactory::refusing();
    let (mut controller, channel, mut events) = data_only_controller(&factory).await;

    controller
        .handle_channel_event(ChannelEvent::Message(ServerMessage::Clients(directory(&[
            ("b", "bob"),
        ]))))
        .await;
    drain_events(&mut events);

    let attempt = controller.connect_to(&PeerId::from("b")).await.unwrap();

    assert!(controller.answerer(attempt).is_none());
    assert!(factory.find(attempt).unwrap().is_closed());
    assert_eq!(channel.sent_count(), 0);
    assert!(matches!(
        drain_events(&mut events).as_slice(),
        [ClientEvent::AttemptFailed { attempt: a, .. }] if *a == attempt
    ));
}
