//! TLS configuration: SNI, peer/hostname verification toggles, and
//! `SSLKEYLOGFILE`/`keylog_filename` NSS key-log support.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rustls_pki_types::ServerName;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::{self, ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;

use crate::error::Error;

/// Per-client TLS behavior. Defaults to full verification:
/// `verify_peer=true`, `verify_hostname=true`.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub verify_peer: bool,
    pub verify_hostname: bool,
    pub keylog_filename: Option<PathBuf>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            verify_peer: true,
            verify_hostname: true,
            keylog_filename: None,
        }
    }
}

impl TlsConfig {
    pub fn connector(&self) -> Result<TlsConnector, Error> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let mut config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        if !self.verify_peer || !self.verify_hostname {
            config
                .dangerous()
                .set_certificate_verifier(Arc::new(PermissiveVerifier));
        }

        if let Some(keylog) = self.keylog_filename.clone().or_else(env_keylog_path) {
            config.key_log = Arc::new(FileKeyLog::new(keylog));
        }

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

fn env_keylog_path() -> Option<PathBuf> {
    std::env::var_os("SSLKEYLOGFILE").map(PathBuf::from)
}

/// Appends TLS session secrets in NSS key-log format.
struct FileKeyLog {
    path: PathBuf,
    file: Mutex<Option<std::fs::File>>,
}

impl FileKeyLog {
    fn new(path: PathBuf) -> Self {
        FileKeyLog {
            path,
            file: Mutex::new(None),
        }
    }
}

impl rustls::KeyLog for FileKeyLog {
    fn log(&self, label: &str, client_random: &[u8], secret: &[u8]) {
        let mut guard = self.file.lock().unwrap();
        if guard.is_none() {
            *guard = OpenOptions::new().create(true).append(true).open(&self.path).ok();
        }
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(
                file,
                "{label} {} {}",
                hex::encode(client_random),
                hex::encode(secret)
            );
        }
    }
}

/// Used when `verify_peer`/`verify_hostname` is turned off. Accepts any
/// certificate chain; callers who disable verification have opted into
/// this explicitly.
#[derive(Debug)]
struct PermissiveVerifier;

impl ServerCertVerifier for PermissiveVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls_pki_types::CertificateDer<'_>,
        _intermediates: &[rustls_pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls_pki_types::UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::ED25519,
        ]
    }
}
