use beacon_client::{ClientCommand, ClientEvent, ConnectionStatus};
use beacon_core::PeerId;

use crate::integration::init_tracing;
use crate::utils::{FakeFactory, LiveClient, start_live_server};

#[tokio::test]
async fn test_two_clients_handshake() {
    init_tracing();
    let addr = start_live_server().await.unwrap();

    let mut alice = LiveClient::start(addr, "a", "alice", FakeFactory::auto())
        .await
        .unwrap();
    let mut bob = LiveClient::start(addr, "b", "bob", FakeFactory::auto())
        .await
        .unwrap();

    for client in [&mut alice, &mut bob] {
        client
            .wait_for(|e| matches!(e, ClientEvent::StatusChanged(ConnectionStatus::Connected)))
            .await
            .unwrap();
    }

    alice.command(ClientCommand::CreateRoom).await.unwrap();
    alice
        .wait_for(|e| matches!(e, ClientEvent::OfferRegistered(_)))
        .await
        .unwrap();

    bob.wait_for(|e| {
        matches!(e, ClientEvent::DirectoryUpdated(d) if d.get(&PeerId::from("a")).is_some_and(|entry| entry.alias == "alice"))
    })
    .await
    .unwrap();

    bob.command(ClientCommand::ConnectTo(PeerId::from("a")))
        .await
        .unwrap();

    bob.wait_for(|e| matches!(e, ClientEvent::AnswerSent { remote, .. } if *remote == PeerId::from("a")))
        .await
        .unwrap();
    bob.wait_for(|e| matches!(e, ClientEvent::StreamReady { remote: Some(remote), .. } if *remote == PeerId::from("a")))
        .await
        .unwrap();
    alice
        .wait_for(|e| matches!(e, ClientEvent::StreamReady { remote: None, .. }))
        .await
        .unwrap();

    alice.command(ClientCommand::Shutdown).await.unwrap();
    bob.command(ClientCommand::Shutdown).await.unwrap();
}
