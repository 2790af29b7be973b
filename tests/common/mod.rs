#![allow(dead_code)]

use async_trait::async_trait;
use rcgen::{CertificateParams, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use rustls::ServerConfig;
use ssl_expiry_alert::config::{
    ApiKey, EmailConfig, RawCheckConfig, RawNumber, RawTransportConfig, Recipients,
};
use ssl_expiry_alert::notify::{MailProvider, OutgoingEmail};
use ssl_expiry_alert::ProviderError;
use std::sync::{Arc, Mutex};
use time::{Duration, OffsetDateTime};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

/// Local TLS listener presenting a self-signed certificate
pub struct TestServer {
    pub port: u16,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve a certificate valid from 365 days ago until `now + expires_in`
pub async fn tls_server(expires_in: Duration) -> TestServer {
    let now = OffsetDateTime::now_utc();
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    params.not_before = now - Duration::days(365);
    params.not_after = now + expires_in;
    let key_pair = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key_pair).unwrap();

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let server_config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![cert.der().clone()],
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der())),
        )
        .unwrap();
    serve(server_config).await
}

/// Always hands out the same chain, whatever the client asked for
#[derive(Debug)]
struct FixedChain(Arc<CertifiedKey>);

impl ResolvesServerCert for FixedChain {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(self.0.clone())
    }
}

/// Complete handshakes while presenting `leaf` as the certificate. The bytes
/// are sent as-is, so they need not be a parseable certificate.
pub async fn tls_server_with_leaf(leaf: Vec<u8>) -> TestServer {
    let key_pair = KeyPair::generate().unwrap();
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let signing_key = provider
        .key_provider
        .load_private_key(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            key_pair.serialize_der(),
        )))
        .unwrap();
    let chain = CertifiedKey::new(vec![CertificateDer::from(leaf)], signing_key);

    let server_config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(FixedChain(Arc::new(chain))));
    serve(server_config).await
}

async fn serve(server_config: ServerConfig) -> TestServer {
    let acceptor = TlsAcceptor::from(Arc::new(server_config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    // Hold the session open until the client hangs up
                    let mut buf = [0u8; 64];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    TestServer { port, handle }
}

/// A port nothing is listening on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

pub fn raw_config(port: u16, days_before: i64) -> RawCheckConfig {
    RawCheckConfig {
        host: Some("127.0.0.1".to_string()),
        port: Some(RawNumber::Int(port as i64)),
        servername: Some("localhost".to_string()),
        timeout: Some(RawNumber::Int(5)),
        alert_days_before_expiry: Some(RawNumber::Int(days_before)),
        alert_transport: None,
    }
}

pub fn mailgun_transport() -> RawTransportConfig {
    RawTransportConfig {
        name: Some("mailgun".to_string()),
        domain: Some("mg.example.com".to_string()),
        api_key: Some(ApiKey::new("key-123")),
        email_from: Some("alerts@example.com".to_string()),
        email_from_name: Some("Cert Bot".to_string()),
        emails_to: Some(Recipients::Many(vec!["ops@example.com".to_string()])),
        api_base: None,
    }
}

/// Records every message and optionally fails them all
#[derive(Default)]
pub struct MockProvider {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail_with: Option<String>,
}

impl MockProvider {
    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailProvider for MockProvider {
    async fn create_message(
        &self,
        _account: &EmailConfig,
        email: &OutgoingEmail,
    ) -> Result<String, ProviderError> {
        self.sent.lock().unwrap().push(email.clone());
        match &self.fail_with {
            Some(reason) => Err(ProviderError::Other(reason.clone())),
            None => Ok("Queued. Thank you.".to_string()),
        }
    }
}
