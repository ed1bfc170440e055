// tests/run_tests.rs
use health_monitor::config::{
    load_config, NotifierConfig, PersistencePolicy, ProbeConfig, Service, StoreConfig,
};
use health_monitor::health::{HttpProber, Status};
use health_monitor::notify::create_notifier;
use health_monitor::runner::{NotificationOutcome, Persistence, RunController};
use health_monitor::store::{create_store, MemoryStore, StatusStore};
use mockito::Matcher;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Answers every connection with `status` after `delay`.
async fn slow_server(delay: Duration, status: u16) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 {} Status\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    status
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    format!("http://{}/health", addr)
}

fn service(url: &str, threshold_ms: u64) -> Service {
    Service {
        id: "svc-a".to_string(),
        name: "Service A".to_string(),
        url: url.parse().unwrap(),
        threshold_ms,
    }
}

fn probe_config(timeout_secs: u64) -> ProbeConfig {
    ProbeConfig {
        timeout_secs,
        ..ProbeConfig::default()
    }
}

fn slack_config(api_base: String) -> NotifierConfig {
    NotifierConfig {
        slack_bot_token: Some("xoxb-test".to_string()),
        slack_channel_id: Some("C0STATUS".to_string()),
        api_base,
        ..NotifierConfig::default()
    }
}

#[tokio::test]
async fn test_ok_then_slow_then_down() {
    let mut slack = mockito::Server::new_async().await;
    let warn_alert = slack
        .mock("POST", "/chat.postMessage")
        .match_body(Matcher::PartialJson(serde_json::json!({"text": "[WARN] Service A"})))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;
    let error_alert = slack
        .mock("POST", "/chat.postMessage")
        .match_body(Matcher::PartialJson(serde_json::json!({"text": "[ERROR] Service A"})))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let notifier = create_notifier(&slack_config(slack.url())).unwrap();
    let prober = Arc::new(HttpProber::new(probe_config(1)).unwrap());

    let controller = |services: Vec<Service>| {
        RunController::new(store.clone(), prober.clone(), notifier.clone())
            .with_policy(PersistencePolicy::AlwaysLog)
            .with_source(health_monitor::runner::ServiceSource::Static(services))
    };

    // Fast answer well inside a generous threshold
    let fast = slow_server(Duration::from_millis(0), 200).await;
    let report = controller(vec![service(&fast, 5_000)]).run().await.unwrap();
    assert_eq!(report.outcomes[0].result.status, Status::Ok);
    assert_eq!(report.outcomes[0].notification, NotificationOutcome::NotRequired);

    // Same status again: no change
    let report = controller(vec![service(&fast, 5_000)]).run().await.unwrap();
    assert!(!report.outcomes[0].changed);

    // Slower than the threshold
    let slow = slow_server(Duration::from_millis(300), 200).await;
    let report = controller(vec![service(&slow, 50)]).run().await.unwrap();
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.result.status, Status::Warn);
    assert!(outcome.changed);
    assert_eq!(outcome.notification, NotificationOutcome::Sent);
    match &outcome.persistence {
        Persistence::Saved(summary) => {
            assert_eq!(summary.ok_count, 2);
            assert_eq!(summary.warn_count, 1);
            assert_eq!(summary.status, Status::Warn);
        }
        other => panic!("expected saved summary, got {:?}", other),
    }

    // Never answers within the 1s probe timeout
    let hung = slow_server(Duration::from_secs(5), 200).await;
    let report = controller(vec![service(&hung, 5_000)]).run().await.unwrap();
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.result.status, Status::Error);
    assert_eq!(outcome.result.http_status, None);
    assert!(outcome.result.message.is_some());
    assert_eq!(outcome.notification, NotificationOutcome::Sent);

    warn_alert.assert_async().await;
    error_alert.assert_async().await;

    assert_eq!(store.logs("svc-a").len(), 4);
    assert_eq!(
        store.latest_status("svc-a").await.unwrap(),
        Some(Status::Error)
    );
    let summaries = store.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, Status::Error);
    assert_eq!(summaries[0].total(), 4);
}

#[tokio::test]
async fn test_server_error_is_error_regardless_of_speed() {
    let mut target = mockito::Server::new_async().await;
    target
        .mock("GET", "/health")
        .with_status(500)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let controller = RunController::new(
        store.clone(),
        Arc::new(HttpProber::new(probe_config(5)).unwrap()),
        create_notifier(&NotifierConfig::default()).unwrap(),
    )
    .with_source(health_monitor::runner::ServiceSource::Static(vec![service(
        &format!("{}/health", target.url()),
        60_000,
    )]));

    let report = controller.run().await.unwrap();
    let outcome = &report.outcomes[0];

    assert_eq!(outcome.result.status, Status::Error);
    assert_eq!(outcome.result.http_status, Some(500));
    // No channel configured: notable change is skipped, not failed
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);
}

#[tokio::test]
async fn test_slack_outage_does_not_abort_run() {
    let mut slack = mockito::Server::new_async().await;
    slack
        .mock("POST", "/chat.postMessage")
        .with_status(503)
        .create_async()
        .await;
    let mut target = mockito::Server::new_async().await;
    target
        .mock("GET", "/health")
        .with_status(404)
        .create_async()
        .await;

    let down = service(&format!("{}/health", target.url()), 1_000);
    let mut up = down.clone();
    up.id = "svc-b".to_string();
    up.name = "Service B".to_string();
    let fast = slow_server(Duration::from_millis(0), 204).await;
    up.url = fast.parse().unwrap();

    let store = Arc::new(MemoryStore::with_services(vec![down, up]));
    let controller = RunController::new(
        store.clone(),
        Arc::new(HttpProber::new(probe_config(5)).unwrap()),
        create_notifier(&slack_config(slack.url())).unwrap(),
    );

    let report = controller.run().await.unwrap();

    assert_eq!(report.checked(), 2);
    assert!(matches!(
        report.outcomes[0].notification,
        NotificationOutcome::Failed(_)
    ));
    assert_eq!(report.outcomes[1].result.status, Status::Ok);
    assert_eq!(store.logs("svc-a").len(), 1);
    assert_eq!(store.logs("svc-b").len(), 1);
}

#[test]
fn test_missing_store_credentials_fail_startup() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        r#"
services:
  - id: blog
    name: Blog
    url: https://blog.example.com
    threshold_ms: 800
"#
    )
    .unwrap();

    // Startup stops at config load; there is no Config to build a controller from
    let err = load_config(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("store.url"));

    let result = create_store(&StoreConfig::default());
    assert!(result.is_err());

    let result = create_store(&StoreConfig {
        url: Some("https://project.supabase.co".to_string()),
        api_key: None,
        ..StoreConfig::default()
    });
    let err = result.err().unwrap();
    assert!(err.to_string().contains("store.api_key"));
}
