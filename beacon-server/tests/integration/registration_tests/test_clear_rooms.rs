use beacon_server::ServerCommand;

use crate::integration::{create_test_server, init_tracing};
use crate::utils::{connect, ids, offer, register, snapshot};

#[tokio::test]
async fn test_clear_rooms_broadcasts_empty_directory() {
    init_tracing();

    let (cmd_tx, signaling) = create_test_server();

    let alice = connect(&cmd_tx).await.expect("connect alice");
    let bob = connect(&cmd_tx).await.expect("connect bob");
    let lurker = connect(&cmd_tx).await.expect("connect lurker");
    register(&cmd_tx, alice, "a", "alice", offer("O1"))
        .await
        .expect("register alice");
    register(&cmd_tx, bob, "b", "bob", offer("O1"))
        .await
        .expect("register bob");

    cmd_tx
        .send(ServerCommand::ClearRooms {
            connection: Some(bob),
        })
        .await
        .expect("clear");

    let directory = snapshot(&cmd_tx).await.expect("snapshot");
    assert!(directory.is_empty());

    for connection in [alice, bob, lurker] {
        let last = signaling.last_directory_for(&connection).await.unwrap();
        assert!(last.is_empty(), "{} should see an empty directory", connection);
    }
}

#[tokio::test]
async fn test_channels_survive_operator_clear() {
    init_tracing();

    let (cmd_tx, signaling) = create_test_server();

    let alice = connect(&cmd_tx).await.expect("connect alice");
    let bob = connect(&cmd_tx).await.expect("connect bob");
    register(&cmd_tx, alice, "a", "alice", offer("O1"))
        .await
        .expect("register alice");

    cmd_tx
        .send(ServerCommand::ClearRooms { connection: None })
        .await
        .expect("clear");

    // Alice re-advertises on the same open channel
    register(&cmd_tx, alice, "a", "alice", offer("O2"))
        .await
        .expect("register again");

    let directory = snapshot(&cmd_tx).await.expect("snapshot");
    assert_eq!(ids(&directory), vec!["a"]);
    assert_eq!(
        ids(&signaling.last_directory_for(&bob).await.unwrap()),
        vec!["a"]
    );
}
