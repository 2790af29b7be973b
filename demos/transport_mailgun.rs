// Check github.com and mail an alert through Mailgun when it is due.
//
// Mailgun settings come from the environment:
//   MAILGUN_DOMAIN, MAILGUN_API_KEY, EMAIL_FROM, EMAIL_FROM_NAME, EMAIL_TO
//
//   cargo run --example transport_mailgun

use ssl_expiry_alert::config::{ApiKey, RawNumber, RawTransportConfig, Recipients};
use ssl_expiry_alert::{Checker, RawCheckConfig};
use std::env;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let raw = RawCheckConfig {
        host: Some("github.com".to_string()),
        port: Some(RawNumber::Int(443)),
        alert_days_before_expiry: Some(RawNumber::Int(1)),
        alert_transport: Some(RawTransportConfig {
            name: Some("mailgun".to_string()),
            domain: env::var("MAILGUN_DOMAIN").ok(),
            api_key: env::var("MAILGUN_API_KEY").ok().map(ApiKey::new),
            email_from: env::var("EMAIL_FROM").ok(),
            email_from_name: env::var("EMAIL_FROM_NAME").ok(),
            emails_to: env::var("EMAIL_TO").ok().map(|to| {
                Recipients::Many(to.split(',').map(|s| s.trim().to_string()).collect())
            }),
            api_base: None,
        }),
        ..Default::default()
    };

    match Checker::new().check_raw(&raw).await {
        Ok(report) => println!("{:#?}", report),
        Err(err) => println!("SSL Expiry Alert Error: {}", err),
    }
}
