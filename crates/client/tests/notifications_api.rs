//! Notification endpoints and the polling loop against the stub backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{spawn_backend, StubBackend};
use doors_client::poller::PollEvent;
use doors_client::{ClientError, MemoryTokenStore, NotificationPoller};
use doors_core::models::Category;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn notification_polls(backend: &StubBackend) -> usize {
    backend
        .requests()
        .iter()
        .filter(|r| r.as_str() == "GET /api/notifications")
        .count()
}

#[tokio::test]
async fn test_list_and_mark_read() {
    let backend = spawn_backend().await;
    let me = backend.seed_user("Ada", "ada@example.com");
    let other = backend.seed_user("Owner", "owner@example.com");
    let door = backend.seed_door(&other, "Red", Category::A);
    let unread = backend.seed_notification(&me, &door, false);
    backend.seed_notification(&other, &door, false);

    let token = backend.issue_token("ada@example.com");
    let api = backend.api();

    let list = api.list_notifications(&token).await.unwrap();
    assert_eq!(list.len(), 1, "only the caller's notifications are returned");
    assert_eq!(list[0].id, unread.id);
    assert_eq!(list[0].title, "New A Door Discovered!");
    assert!(!list[0].is_read);

    api.mark_notification_read(&token, unread.id).await.unwrap();
    let list = api.list_notifications(&token).await.unwrap();
    assert!(list[0].is_read);
}

#[tokio::test]
async fn test_mark_unknown_notification() {
    let backend = spawn_backend().await;
    backend.seed_user("Ada", "ada@example.com");
    let token = backend.issue_token("ada@example.com");

    let err = backend
        .api()
        .mark_notification_read(&token, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Api { status: 404, ref detail } if detail == "Notification not found");
}

#[tokio::test]
async fn test_poller_publishes_snapshots_until_cancelled() {
    let backend = spawn_backend().await;
    let me = backend.seed_user("Ada", "ada@example.com");
    let other = backend.seed_user("Owner", "owner@example.com");
    let door = backend.seed_door(&other, "Red", Category::A);
    backend.seed_notification(&me, &door, false);
    backend.seed_notification(&me, &door, true);

    let token = backend.issue_token("ada@example.com");
    let session = backend.session(Arc::new(MemoryTokenStore::with_token(token)));
    session.restore().await.unwrap();

    let poller = Arc::new(NotificationPoller::new(session, Duration::from_millis(50)));
    let mut events = poller.subscribe();
    let handle = Arc::clone(&poller).spawn(CancellationToken::new());

    let first = tokio::time::timeout(RECV_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_matches!(first, PollEvent::Snapshot { ref notifications, unread: 1 } if notifications.len() == 2);

    // A second tick follows on the interval.
    let second = tokio::time::timeout(RECV_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_matches!(second, PollEvent::Snapshot { .. });

    handle.shutdown().await;
    let polls = notification_polls(&backend);
    assert!(polls >= 2);

    // Several intervals later nothing else has been fetched.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(notification_polls(&backend), polls);
}

#[tokio::test]
async fn test_poller_keeps_running_when_backend_is_unreachable() {
    let backend = spawn_backend().await;
    backend.seed_user("Ada", "ada@example.com");
    let token = backend.issue_token("ada@example.com");
    let session = backend.unpooled_session(Arc::new(MemoryTokenStore::with_token(token)));
    session.restore().await.unwrap();
    drop(backend);

    let poller = Arc::new(NotificationPoller::new(session, Duration::from_millis(50)));
    let mut events = poller.subscribe();
    let handle = Arc::clone(&poller).spawn(CancellationToken::new());

    let event = tokio::time::timeout(RECV_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_matches!(
        event,
        PollEvent::Failed { ref message } if message == "request failed (could not reach server)"
    );

    // Failures are reported on every tick without stopping the loop.
    let event = tokio::time::timeout(RECV_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_matches!(event, PollEvent::Failed { .. });
    assert!(!handle.is_finished());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_poller_stops_when_session_expires() {
    let backend = spawn_backend().await;
    backend.seed_user("Ada", "ada@example.com");
    let token = backend.issue_token("ada@example.com");
    let session = backend.session(Arc::new(MemoryTokenStore::with_token(token)));
    session.restore().await.unwrap();
    backend.revoke_all_tokens();

    let poller = Arc::new(NotificationPoller::new(session, Duration::from_millis(50)));
    let mut events = poller.subscribe();
    let handle = Arc::clone(&poller).spawn(CancellationToken::new());

    let event = tokio::time::timeout(RECV_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_matches!(event, PollEvent::SessionExpired);

    // The loop exits on its own.
    tokio::time::timeout(RECV_TIMEOUT, async {
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_poll_once_without_session() {
    let backend = spawn_backend().await;
    let session = backend.session(Arc::new(MemoryTokenStore::new()));
    let poller = NotificationPoller::new(session, Duration::from_secs(30));

    assert_matches!(poller.poll_once().await, Err(ClientError::NotAuthenticated));
    assert!(backend.requests().is_empty());
}
