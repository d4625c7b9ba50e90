use crate::integration::{create_coalescing_server, create_test_server, init_tracing};
use crate::utils::{BROADCAST_TIMEOUT_MS, connect, ids, offer, register, snapshot};

#[tokio::test]
async fn test_rapid_reregister_keeps_latest_offer() {
    init_tracing();

    let (cmd_tx, signaling) = create_coalescing_server(64);

    let alice = connect(&cmd_tx).await.expect("connect alice");
    let bob = connect(&cmd_tx).await.expect("connect bob");

    register(&cmd_tx, alice, "a", "alice", offer("O1"))
        .await
        .expect("register O1");
    register(&cmd_tx, alice, "a", "alice", offer("O2"))
        .await
        .expect("register O2");

    let last = signaling
        .wait_for_directory(
            &bob,
            |d| d.get(&"a".into()).is_some_and(|e| e.offer == offer("O2")),
            BROADCAST_TIMEOUT_MS,
        )
        .await
        .expect("Bob should see O2");
    assert_eq!(ids(&last), vec!["a"]);

    for directory in signaling.directories_for(&bob).await {
        assert!(
            directory.len() <= 1,
            "Directory must never list the same id twice: {:?}",
            directory
        );
    }
}

#[tokio::test]
async fn test_reregister_replaces_alias_and_offer() {
    init_tracing();

    let (cmd_tx, _signaling) = create_test_server();

    let alice = connect(&cmd_tx).await.expect("connect alice");
    for (alias, tag) in [("alice", "O1"), ("alicia", "O2"), ("ally", "O3")] {
        register(&cmd_tx, alice, "a", alias, offer(tag))
            .await
            .expect("register");
    }

    let directory = snapshot(&cmd_tx).await.expect("snapshot");
    assert_eq!(directory.len(), 1);
    let entry = directory.get(&"a".into()).unwrap();
    assert_eq!(entry.alias, "ally");
    assert_eq!(entry.offer, offer("O3"));
}
