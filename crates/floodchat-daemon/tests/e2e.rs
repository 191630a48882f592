//! End-to-end tests for floodchat nodes.
//!
//! Starts real nodes on 127.0.0.1 with ephemeral ports and drives them over
//! HTTP: flood joins, chat fan-out, unreachable peers and malformed input.

use std::collections::HashSet;
use std::time::Duration;

use floodchat_core::{ChatMsg, CoordinatorHandle, Notice, Peer, Peers};
use floodchat_daemon::{DecodePolicy, Node, NodeConfig};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Helpers
// ============================================================================

fn config(name: &str) -> NodeConfig {
    NodeConfig::new(name, 0)
        .with_host("127.0.0.1")
        .with_request_timeout(Duration::from_secs(2))
}

async fn start(name: &str) -> Node {
    Node::start(config(name)).await.expect("Failed to start node")
}

async fn start_joining(name: &str, other: &Node) -> Node {
    Node::start(config(name).with_join(other.self_peer().address.clone()))
        .await
        .expect("Failed to start node")
}

/// An address with nothing listening on it.
fn dead_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);
    address
}

fn addresses(peers: &Peers) -> HashSet<String> {
    peers.keys().cloned().collect()
}

fn address_set(nodes: &[&Node]) -> HashSet<String> {
    nodes.iter().map(|n| n.self_peer().address.clone()).collect()
}

/// Poll a node's directory until `check` holds.
async fn wait_for_peers(handle: &CoordinatorHandle, check: impl Fn(&Peers) -> bool) -> Peers {
    timeout(WAIT, async {
        loop {
            let peers = handle.peers().await.expect("Coordinator stopped");
            if check(&peers) {
                return peers;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Timed out waiting for directory state")
}

/// Wait for a notice matching `check`, skipping others.
async fn expect_notice(
    notices: &mut mpsc::UnboundedReceiver<Notice>,
    check: impl Fn(&Notice) -> bool,
) -> Notice {
    timeout(WAIT, async {
        loop {
            let notice = notices.recv().await.expect("Notice stream ended");
            if check(&notice) {
                return notice;
            }
        }
    })
    .await
    .expect("Timed out waiting for notice")
}

fn join_url(node: &Node) -> String {
    format!("http://{}/join", node.local_addr())
}

fn chat_url(node: &Node) -> String {
    format!("http://{}/chat", node.local_addr())
}

// ============================================================================
// Membership
// ============================================================================

#[tokio::test]
async fn test_two_nodes_join_each_other() {
    let alice = start("alice").await;
    let bob = start_joining("bob", &alice).await;

    let bob_view = wait_for_peers(bob.handle(), |p| p.len() == 1).await;
    assert_eq!(
        bob_view.get(&alice.self_peer().address),
        Some(&Peer::unnamed(alice.self_peer().address.clone()))
    );

    let alice_view = wait_for_peers(alice.handle(), |p| p.len() == 1).await;
    assert_eq!(alice_view.get(&bob.self_peer().address), Some(bob.self_peer()));

    bob.shutdown().await.unwrap();
    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_flood_join_reaches_whole_network() {
    let alice = start("alice").await;
    let bob = start_joining("bob", &alice).await;
    wait_for_peers(alice.handle(), |p| p.len() == 1).await;

    // carol only knows bob, but learns alice from bob's directory
    let carol = start_joining("carol", &bob).await;

    let expected = address_set(&[&alice, &bob, &carol]);
    for node in [&alice, &bob, &carol] {
        let mut others = expected.clone();
        others.remove(&node.self_peer().address);
        let peers = wait_for_peers(node.handle(), |p| addresses(p) == others).await;
        assert!(!peers.contains_key(&node.self_peer().address));
    }

    carol.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_join_endpoint_returns_directory() {
    let alice = start("alice").await;
    let bob = start_joining("bob", &alice).await;
    wait_for_peers(alice.handle(), |p| p.len() == 1).await;

    // Joiner nobody can call back; alice still answers with her directory
    let ghost = Peer::new("ghost", dead_address());
    let response = reqwest::Client::new()
        .post(join_url(&alice))
        .json(&ghost)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body[&bob.self_peer().address]["Name"], "bob");
    assert_eq!(
        body[&bob.self_peer().address]["Address"],
        bob.self_peer().address.as_str()
    );
    assert!(body.get(&alice.self_peer().address).is_none());

    // The announcement back to ghost fails, so alice drops it again
    wait_for_peers(alice.handle(), |p| {
        !p.contains_key(&ghost.address) && p.contains_key(&bob.self_peer().address)
    })
    .await;

    bob.shutdown().await.unwrap();
    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_join_endpoint_on_fresh_node_returns_empty_object() {
    let alice = start("alice").await;

    // Joining as alice herself is ignored and the directory stays empty
    let response = reqwest::Client::new()
        .post(join_url(&alice))
        .json(alice.self_peer())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "{}");

    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bootstrap_to_dead_peer_leaves_empty_directory() {
    let alice = Node::start(config("alice").with_join(dead_address()))
        .await
        .unwrap();

    wait_for_peers(alice.handle(), |p| p.is_empty()).await;

    alice.shutdown().await.unwrap();
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_reaches_every_peer() {
    let mut alice = start("alice").await;
    let mut bob = start_joining("bob", &alice).await;
    let mut carol = start_joining("carol", &alice).await;
    for node in [&alice, &bob, &carol] {
        wait_for_peers(node.handle(), |p| p.len() == 2).await;
    }

    let mut alice_notices = alice.take_notices().unwrap();
    let mut bob_notices = bob.take_notices().unwrap();
    let mut carol_notices = carol.take_notices().unwrap();

    alice.handle().submit("hello everyone").unwrap();

    let sent = expect_notice(&mut alice_notices, |n| matches!(n, Notice::Sent(_))).await;
    assert_eq!(sent.to_string(), "alice (self) says: hello everyone");

    for notices in [&mut bob_notices, &mut carol_notices] {
        let received = expect_notice(notices, |n| matches!(n, Notice::Received(_))).await;
        assert_eq!(received.to_string(), "alice writes: hello everyone");
    }

    carol.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_chat_endpoint_displays_without_relaying() {
    let mut alice = start("alice").await;
    let mut bob = start_joining("bob", &alice).await;
    wait_for_peers(alice.handle(), |p| p.len() == 1).await;
    let mut alice_notices = alice.take_notices().unwrap();
    let mut bob_notices = bob.take_notices().unwrap();

    let msg = ChatMsg::new("psst", Peer::new("mallory", dead_address()));
    let response = reqwest::Client::new()
        .post(chat_url(&alice))
        .json(&msg)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.unwrap().is_empty());

    let received = expect_notice(&mut alice_notices, |n| matches!(n, Notice::Received(_))).await;
    assert_eq!(received, Notice::Received(msg));

    // bob never sees it
    tokio::time::sleep(Duration::from_millis(200)).await;
    while let Ok(notice) = bob_notices.try_recv() {
        assert!(!matches!(notice, Notice::Received(_)), "unexpected relay: {}", notice);
    }

    bob.shutdown().await.unwrap();
    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_peer_removed_on_chat() {
    let alice = start("alice").await;
    let bob = start_joining("bob", &alice).await;
    let carol = start_joining("carol", &alice).await;
    wait_for_peers(alice.handle(), |p| p.len() == 2).await;

    let bob_address = bob.self_peer().address.clone();
    bob.shutdown().await.unwrap();

    alice.handle().submit("who is still here?").unwrap();

    let peers = wait_for_peers(alice.handle(), |p| !p.contains_key(&bob_address)).await;
    assert_eq!(addresses(&peers), address_set(&[&carol]));

    carol.shutdown().await.unwrap();
    alice.shutdown().await.unwrap();
}

// ============================================================================
// Malformed input
// ============================================================================

#[tokio::test]
async fn test_malformed_join_is_tolerated_by_default() {
    let alice = start("alice").await;

    let response = reqwest::Client::new()
        .post(join_url(&alice))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // The zero-value peer is admitted, then dropped when it cannot be reached
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body[""]["Address"], "");
    wait_for_peers(alice.handle(), |p| p.is_empty()).await;

    alice.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_requests_rejected_when_configured() {
    let mut alice = Node::start(config("alice").with_decode_policy(DecodePolicy::Reject))
        .await
        .unwrap();
    let mut notices = alice.take_notices().unwrap();
    let client = reqwest::Client::new();

    let join = client
        .post(join_url(&alice))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(join.status(), reqwest::StatusCode::BAD_REQUEST);

    let chat = client
        .post(chat_url(&alice))
        .body("<message>hi</message>")
        .send()
        .await
        .unwrap();
    assert_eq!(chat.status(), reqwest::StatusCode::BAD_REQUEST);

    assert!(alice.handle().peers().await.unwrap().is_empty());
    alice.handle().shutdown().unwrap();
    while let Some(notice) = notices.recv().await {
        assert!(
            !matches!(notice, Notice::Received(_) | Notice::Connected(_)),
            "rejected request reached the coordinator: {}",
            notice
        );
    }

    alice.shutdown().await.unwrap();
}
