// Certificate Fetcher - one TLS connection per call, closed before returning

use crate::config::CheckConfig;
use crate::error::{CheckError, ConnectionFailure};
use crate::Result;
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::debug;
use x509_parser::parse_x509_certificate;

/// Upper bound on sending close_notify once the certificate is in hand
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Validity window of the peer's leaf certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// Connect to the configured host, read the leaf certificate, then hang up.
///
/// The configured timeout covers DNS, TCP connect and the handshake. There
/// are no retries.
pub async fn fetch_certificate(config: &CheckConfig) -> Result<CertificateInfo> {
    let target = config.target();
    let connector = TlsConnector::from(Arc::new(client_config(&target)?));
    let server_name = ServerName::try_from(config.server_name().to_string())
        .map_err(|e| CheckError::validation("servername", e.to_string()))?;

    debug!(
        peer = %target,
        server_name = config.server_name(),
        timeout = ?config.timeout(),
        "Connecting to fetch peer certificate"
    );

    let mut tls_stream = timeout(
        config.timeout(),
        open(&connector, config.host(), config.port(), server_name),
    )
    .await
    .map_err(|_| CheckError::connection(&target, ConnectionFailure::Timeout(config.timeout())))?
    .map_err(|failure| CheckError::connection(&target, failure))?;

    let leaf = {
        let (_, session) = tls_stream.get_ref();
        session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .map(|cert| cert.as_ref().to_vec())
    };

    let _ = timeout(CLOSE_GRACE, tls_stream.shutdown()).await;
    drop(tls_stream);

    let der = leaf.ok_or_else(|| CheckError::Certificate("peer presented no certificate".into()))?;
    let info = parse_validity(&der)?;
    debug!(
        peer = %target,
        valid_from = ?info.valid_from,
        valid_to = ?info.valid_to,
        "Fetched peer certificate"
    );
    Ok(info)
}

async fn open(
    connector: &TlsConnector,
    host: &str,
    port: u16,
    server_name: ServerName<'static>,
) -> std::result::Result<TlsStream<TcpStream>, ConnectionFailure> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(ConnectionFailure::Resolve)?
        .collect();
    if addrs.is_empty() {
        return Err(ConnectionFailure::NoAddress);
    }

    let stream = TcpStream::connect(&addrs[..])
        .await
        .map_err(ConnectionFailure::Connect)?;

    connector
        .connect(server_name, stream)
        .await
        .map_err(ConnectionFailure::Handshake)
}

/// Extract the validity window from a DER encoded certificate
pub fn parse_validity(der: &[u8]) -> Result<CertificateInfo> {
    let (_, cert) = parse_x509_certificate(der)
        .map_err(|e| CheckError::Certificate(format!("unparseable peer certificate: {}", e)))?;
    let validity = cert.validity();
    Ok(CertificateInfo {
        valid_from: DateTime::from_timestamp(validity.not_before.timestamp(), 0),
        valid_to: DateTime::from_timestamp(validity.not_after.timestamp(), 0),
    })
}

fn client_config(target: &str) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| {
            CheckError::connection(
                target,
                ConnectionFailure::Handshake(io::Error::new(io::ErrorKind::Other, e)),
            )
        })?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InspectOnlyVerifier { provider }))
        .with_no_client_auth();
    Ok(config)
}

/// Accepts whatever the peer presents so expired, self-signed or malformed
/// certificates can still be inspected. Nothing about the peer's identity is
/// verified; only the leaf's validity window is read.
#[derive(Debug)]
struct InspectOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InspectOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
