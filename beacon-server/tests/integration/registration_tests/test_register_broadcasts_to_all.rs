use crate::integration::{create_test_server, init_tracing};
use crate::utils::{connect, ids, offer, register, snapshot};

#[tokio::test]
async fn test_register_broadcasts_to_all() {
    init_tracing();

    let (cmd_tx, signaling) = create_test_server();

    let alice = connect(&cmd_tx).await.expect("connect alice");
    let bob = connect(&cmd_tx).await.expect("connect bob");
    let carol = connect(&cmd_tx).await.expect("connect carol");

    register(&cmd_tx, alice, "a", "alice", offer("O1"))
        .await
        .expect("register alice");
    snapshot(&cmd_tx).await.expect("sync");

    // The sender is included in the broadcast
    for connection in [alice, bob, carol] {
        let directory = signaling.last_directory_for(&connection).await.unwrap();
        assert_eq!(ids(&directory), vec!["a"]);
        let entry = directory.get(&"a".into()).unwrap();
        assert_eq!(entry.alias, "alice");
        assert_eq!(entry.offer, offer("O1"));
    }
}

#[tokio::test]
async fn test_directory_lists_every_advertiser() {
    init_tracing();

    let (cmd_tx, _signaling) = create_test_server();

    for (id, alias) in [("a", "alice"), ("b", "bob"), ("c", "carol")] {
        let connection = connect(&cmd_tx).await.expect("connect");
        register(&cmd_tx, connection, id, alias, offer(id))
            .await
            .expect("register");
    }

    let directory = snapshot(&cmd_tx).await.expect("snapshot");
    assert_eq!(ids(&directory), vec!["a", "b", "c"]);
}
