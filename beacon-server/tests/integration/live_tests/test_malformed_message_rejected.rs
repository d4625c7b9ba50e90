use beacon_core::{ClientMessage, PeerId};

use crate::integration::init_tracing;
use crate::utils::{WsTestClient, ids, offer, start_live_server};

#[tokio::test]
async fn test_malformed_register_keeps_channel_open() {
    init_tracing();

    let addr = start_live_server().await.expect("server");
    let mut alice = WsTestClient::connect(addr).await.expect("connect alice");
    alice
        .wait_for_directory(|d| d.is_empty())
        .await
        .expect("join snapshot");

    alice
        .send_raw(r#"{"op":"register","d":{"id":"a","alias":"alice"}}"#)
        .await
        .expect("send malformed");
    let reason = alice.wait_for_rejection().await.expect("rejection");
    assert!(reason.contains("offer"), "unexpected reason: {}", reason);

    alice.send_raw("definitely not json").await.expect("send garbage");
    alice.wait_for_rejection().await.expect("rejection");

    // Same channel, valid message
    alice
        .send(&ClientMessage::Register {
            id: PeerId::from("a"),
            alias: "alice".to_string(),
            offer: offer("O1"),
        })
        .await
        .expect("register");
    let directory = alice
        .wait_for_directory(|d| !d.is_empty())
        .await
        .expect("directory");
    assert_eq!(ids(&directory), vec!["a"]);
}

#[tokio::test]
async fn test_malformed_message_does_not_disturb_others() {
    init_tracing();

    let addr = start_live_server().await.expect("server");
    let mut alice = WsTestClient::connect(addr).await.expect("connect alice");
    let mut bob = WsTestClient::connect(addr).await.expect("connect bob");

    alice
        .send(&ClientMessage::Register {
            id: PeerId::from("a"),
            alias: "alice".to_string(),
            offer: offer("O1"),
        })
        .await
        .expect("register");
    for client in [&mut alice, &mut bob] {
        client
            .wait_for_directory(|d| d.contains(&"a".into()))
            .await
            .expect("alice is listed");
    }

    bob.send_raw(r#"{"op":"signalling","d":{"answer":"X"}}"#)
        .await
        .expect("send malformed");
    bob.wait_for_rejection().await.expect("rejection");

    bob.send(&ClientMessage::ClearRooms).await.expect("clear");
    alice
        .wait_for_directory(|d| d.is_empty())
        .await
        .expect("alice is still served");
}

#[tokio::test]
async fn test_binary_frame_is_rejected() {
    init_tracing();

    let addr = start_live_server().await.expect("server");
    let mut alice = WsTestClient::connect(addr).await.expect("connect alice");
    alice
        .wait_for_directory(|d| d.is_empty())
        .await
        .expect("join snapshot");

    alice.send_binary(&[0xde, 0xad]).await.expect("send binary");
    let reason = alice.wait_for_rejection().await.expect("rejection");
    assert!(reason.contains("binary"), "unexpected reason: {}", reason);

    alice
        .send(&ClientMessage::Register {
            id: PeerId::from("a"),
            alias: "alice".to_string(),
            offer: offer("O1"),
        })
        .await
        .expect("register");
    let directory = alice
        .wait_for_directory(|d| !d.is_empty())
        .await
        .expect("directory");
    assert_eq!(ids(&directory), vec!["a"]);
}
