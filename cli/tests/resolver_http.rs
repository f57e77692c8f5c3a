//! Action resolver lifecycle against a mocked reminder service.

use std::time::Duration;

use kilo_cli::client::{PENDING_PATH, ReminderClient, confirm_path, mark_read_path};
use kilo_cli::config::ClientConfig;
use kilo_cli::error::ResolveError;
use kilo_cli::reconciler::Reconciler;
use kilo_cli::resolver::{ActionResolver, Draft, Menu, Phase};
use kilo_core::error::ResolutionError;
use kilo_core::resolution::ResolutionKind;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reconciler_for(server: &MockServer) -> Reconciler {
    let config = ClientConfig::new(server.uri()).with_request_timeout(Duration::from_secs(5));
    Reconciler::new(ReminderClient::new(&config).unwrap())
}

async fn mount_pending(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn resolver_for(reconciler: &Reconciler, id: i64) -> ActionResolver {
    let notification = reconciler.get(id).expect("notification is held");
    ActionResolver::new(notification, reconciler.clone())
}

#[tokio::test]
async fn skip_removes_entry_and_next_poll_re_adds_it() {
    let server = MockServer::start().await;
    mount_pending(
        &server,
        json!([{"id": 1, "message": "Take Adderall", "timestamp": "T1"}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(confirm_path(1)))
        .and(body_json(json!({"action": "skipped"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    assert_eq!(r.len(), 1);

    let resolver = resolver_for(&r, 1);
    let phase = resolver
        .resolve(ResolutionKind::Skipped, None, Some("  "))
        .await
        .unwrap();

    assert_eq!(phase, Phase::Resolved);
    assert!(r.is_empty());

    // Removal is local pruning, not a negative cache.
    r.poll().await;
    assert_eq!(r.snapshot().iter().map(|n| n.id).collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn snooze_sends_duration_and_notes() {
    let server = MockServer::start().await;
    mount_pending(&server, json!([{"id": 3, "message": "Stretch"}])).await;
    Mock::given(method("POST"))
        .and(path(confirm_path(3)))
        .and(body_json(
            json!({"action": "snoozed", "snooze_minutes": 15, "notes": "in a meeting"}),
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    let resolver = resolver_for(&r, 3);
    resolver.update_draft(|d| d.set_notes("in a meeting"));
    resolver.update_draft(Draft::open_snooze_menu);

    assert_eq!(resolver.choose_snooze(15).await.unwrap(), Phase::Resolved);
    assert_eq!(resolver.draft().menu, Menu::Choosing);
    assert!(r.is_empty());
}

#[tokio::test]
async fn snooze_without_duration_never_hits_network() {
    let server = MockServer::start().await;
    mount_pending(&server, json!([{"id": 2, "message": "Water plants"}])).await;
    Mock::given(method("POST"))
        .and(path(confirm_path(2)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    let resolver = resolver_for(&r, 2);

    let err = resolver
        .resolve(ResolutionKind::Snoozed, None, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::InvalidResolution(ResolutionError::MissingSnoozeDuration)
    );
    assert_eq!(resolver.phase(), Phase::Idle);
    assert_eq!(r.len(), 1);
}

#[tokio::test]
async fn second_action_while_processing_is_rejected() {
    let server = MockServer::start().await;
    mount_pending(&server, json!([{"id": 5, "message": "Call mom"}])).await;
    Mock::given(method("POST"))
        .and(path(confirm_path(5)))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(mark_read_path(5)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    let resolver = resolver_for(&r, 5);

    let first = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(ResolutionKind::Completed, None, None).await }
    });
    tokio::time::timeout(Duration::from_secs(2), async {
        while resolver.phase() != Phase::Processing {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("resolver entered processing");

    assert!(!resolver.controls_enabled());
    assert_eq!(resolver.dismiss().await, Err(ResolveError::Busy(5)));
    assert_eq!(
        resolver.resolve(ResolutionKind::Skipped, None, None).await,
        Err(ResolveError::Busy(5))
    );

    assert_eq!(first.await.unwrap(), Ok(Phase::Resolved));
    assert_eq!(
        resolver.dismiss().await,
        Err(ResolveError::AlreadyResolved(5))
    );
}

#[tokio::test]
async fn failure_keeps_entry_and_allows_retry() {
    let server = MockServer::start().await;
    mount_pending(&server, json!([{"id": 8, "message": "Daily habit check"}])).await;
    Mock::given(method("POST"))
        .and(path(confirm_path(8)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(confirm_path(8)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    let resolver = resolver_for(&r, 8);

    let phase = resolver
        .resolve(ResolutionKind::Completed, None, None)
        .await
        .unwrap();
    assert_eq!(phase, Phase::Failed);
    assert!(resolver.controls_enabled());
    assert_eq!(r.len(), 1);

    let phase = resolver
        .resolve(ResolutionKind::Completed, None, None)
        .await
        .unwrap();
    assert_eq!(phase, Phase::Resolved);
    assert!(r.is_empty());
}

#[tokio::test]
async fn dismiss_marks_read_and_removes() {
    let server = MockServer::start().await;
    mount_pending(&server, json!([{"id": 11, "message": "FYI"}, {"id": 12}])).await;
    Mock::given(method("POST"))
        .and(path(mark_read_path(11)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    let resolver = resolver_for(&r, 11);

    assert_eq!(resolver.dismiss().await, Ok(Phase::Resolved));
    assert_eq!(r.snapshot().iter().map(|n| n.id).collect::<Vec<_>>(), vec![12]);
}

#[tokio::test]
async fn failed_dismiss_keeps_entry() {
    let server = MockServer::start().await;
    mount_pending(&server, json!([{"id": 13}])).await;
    Mock::given(method("POST"))
        .and(path(mark_read_path(13)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let r = reconciler_for(&server);
    r.poll().await;
    let resolver = resolver_for(&r, 13);

    assert_eq!(resolver.dismiss().await, Ok(Phase::Failed));
    assert_eq!(r.len(), 1);
}

#[tokio::test]
async fn transport_failure_moves_to_failed_and_keeps_entry() {
    // Nothing listens on the discard port.
    let config = ClientConfig::new("http://127.0.0.1:9").with_request_timeout(Duration::from_secs(2));
    let r = Reconciler::new(ReminderClient::new(&config).unwrap());
    r.merge_items(vec![json!({"id": 21, "message": "Take vitamin"})], chrono::Utc::now());
    let resolver = resolver_for(&r, 21);

    assert_eq!(resolver.dismiss().await, Ok(Phase::Failed));
    assert!(resolver.controls_enabled());
    assert_eq!(r.len(), 1);

    let phase = resolver
        .resolve(ResolutionKind::Completed, None, Some("with breakfast"))
        .await;
    assert_eq!(phase, Ok(Phase::Failed));
    assert!(resolver.controls_enabled());
    assert!(r.get(21).is_some());
}
