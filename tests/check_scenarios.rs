mod common;

use common::{
    closed_port, mailgun_transport, raw_config, tls_server, tls_server_with_leaf, MockProvider,
};
use ssl_expiry_alert::{CheckError, Checker, ConnectionFailure};
use std::sync::Arc;
use time::Duration;

fn checker(provider: &Arc<MockProvider>) -> Checker {
    Checker::new().with_mail_provider(provider.clone())
}

#[tokio::test]
async fn test_healthy_certificate_sends_nothing() {
    let server = tls_server(Duration::days(90)).await;
    let provider = Arc::new(MockProvider::default());

    let mut raw = raw_config(server.port, 60);
    raw.alert_transport = Some(mailgun_transport());
    let report = checker(&provider).check_raw(&raw).await.unwrap();

    assert_eq!(report.evaluation.days_remaining, 90);
    assert!(!report.evaluation.should_alert);
    assert!(report.dispatch.is_none());
    assert!(report.valid_to.is_some());
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn test_expiring_certificate_sends_alert() {
    let server = tls_server(Duration::days(10)).await;
    let provider = Arc::new(MockProvider::default());

    let mut raw = raw_config(server.port, 60);
    raw.alert_transport = Some(mailgun_transport());
    let report = checker(&provider).check_raw(&raw).await.unwrap();

    assert_eq!(report.evaluation.days_remaining, 10);
    assert!(report.evaluation.should_alert);
    let dispatch = report.dispatch.unwrap();
    assert!(dispatch.delivered);
    assert_eq!(dispatch.detail, "Queued. Thank you.");

    let sent = provider.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[127.0.0.1] SSL Certificate Expiry Alert");
    assert!(sent[0].text.contains("Days Remaining: 10 Day(s)"));
    assert_eq!(sent[0].from, "Cert Bot <alerts@example.com>");
    assert_eq!(sent[0].to, vec!["ops@example.com".to_string()]);
}

#[tokio::test]
async fn test_expired_certificate() {
    let server = tls_server(Duration::days(-5)).await;
    let provider = Arc::new(MockProvider::default());

    let mut raw = raw_config(server.port, 60);
    raw.alert_transport = Some(mailgun_transport());
    let report = checker(&provider).check_raw(&raw).await.unwrap();

    assert_eq!(report.evaluation.days_remaining, -1);
    assert!(report.evaluation.should_alert);
    assert!(report.dispatch.unwrap().delivered);
    assert!(provider.sent()[0].text.contains("was Expired"));
}

#[tokio::test]
async fn test_alert_without_transport_is_evaluate_only() {
    let server = tls_server(Duration::days(3)).await;
    let provider = Arc::new(MockProvider::default());

    let report = checker(&provider)
        .check_raw(&raw_config(server.port, 30))
        .await
        .unwrap();

    assert_eq!(report.evaluation.days_remaining, 3);
    assert!(report.evaluation.should_alert);
    assert!(report.dispatch.is_none());
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn test_connection_refused() {
    let provider = Arc::new(MockProvider::default());

    let mut raw = raw_config(closed_port().await, 60);
    raw.alert_transport = Some(mailgun_transport());
    let err = checker(&provider).check_raw(&raw).await.unwrap_err();

    assert!(matches!(
        err,
        CheckError::Connection {
            source: ConnectionFailure::Connect(_),
            ..
        }
    ));
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_leaf_is_certificate_error() {
    let server = tls_server_with_leaf(b"not a certificate".to_vec()).await;
    let provider = Arc::new(MockProvider::default());

    let mut raw = raw_config(server.port, 60);
    raw.alert_transport = Some(mailgun_transport());
    let err = checker(&provider).check_raw(&raw).await.unwrap_err();

    // The handshake went through, so this is not a connection problem
    assert!(err.is_certificate(), "{:?}", err);
    assert!(!err.is_connection());
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn test_provider_failure_keeps_evaluation() {
    let server = tls_server(Duration::days(10)).await;
    let provider = Arc::new(MockProvider::failing("Forbidden"));

    let mut raw = raw_config(server.port, 60);
    raw.alert_transport = Some(mailgun_transport());
    let report = checker(&provider).check_raw(&raw).await.unwrap();

    assert_eq!(report.evaluation.days_remaining, 10);
    assert!(report.evaluation.should_alert);
    let dispatch = report.dispatch.unwrap();
    assert!(!dispatch.delivered);
    assert_eq!(dispatch.detail, "Forbidden");
}

#[tokio::test]
async fn test_threshold_boundary_alerts() {
    let server = tls_server(Duration::days(30)).await;
    let provider = Arc::new(MockProvider::default());

    let report = checker(&provider)
        .check_raw(&raw_config(server.port, 30))
        .await
        .unwrap();
    assert_eq!(report.evaluation.days_remaining, 30);
    assert!(report.evaluation.should_alert);
}

#[tokio::test]
async fn test_check_many_keeps_order() {
    let soon = tls_server(Duration::days(5)).await;
    let later = tls_server(Duration::days(200)).await;
    let provider = Arc::new(MockProvider::default());

    let configs = vec![
        raw_config(soon.port, 30).validate().unwrap(),
        raw_config(closed_port().await, 30).validate().unwrap(),
        raw_config(later.port, 30).validate().unwrap(),
    ];
    let results = checker(&provider).check_many(configs).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().evaluation.days_remaining, 5);
    assert!(results[1].as_ref().unwrap_err().is_connection());
    assert_eq!(results[2].as_ref().unwrap().evaluation.days_remaining, 200);
}

#[tokio::test]
async fn test_injected_clock_drives_evaluation() {
    let server = tls_server(Duration::days(90)).await;
    let provider = Arc::new(MockProvider::default());
    let later = chrono::Utc::now() + chrono::Duration::days(85);

    let report = checker(&provider)
        .with_clock(move || later)
        .check_raw(&raw_config(server.port, 30))
        .await
        .unwrap();
    assert_eq!(report.evaluation.days_remaining, 5);
    assert!(report.evaluation.should_alert);
}
