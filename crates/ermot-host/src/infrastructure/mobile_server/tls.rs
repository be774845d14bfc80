//! Optional TLS for the mobile server.
//!
//! Phones only grant some browser features (clipboard, fullscreen, wake
//! lock) to pages served over HTTPS, so the mobile page can be served with a
//! user-supplied certificate.  The key and certificate are PEM files; a
//! missing or unreadable pair is reported to the caller, which falls back to
//! plain HTTP.

use std::path::Path;
use std::sync::Arc;

use tokio_rustls::rustls::pki_types::pem::PemObject;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::{crypto, ServerConfig};
use tokio_rustls::TlsAcceptor;

use super::MobileServerError;

/// Builds a TLS acceptor from PEM key and certificate files.
///
/// # Errors
///
/// Returns [`MobileServerError::Tls`] if a path is empty, a file cannot be
/// read or parsed, or rustls rejects the pair.
pub fn load_tls(key_path: &Path, cert_path: &Path) -> Result<TlsAcceptor, MobileServerError> {
    if key_path.as_os_str().is_empty() || cert_path.as_os_str().is_empty() {
        return Err(MobileServerError::Tls(
            "key_path and cert_path must both be set".to_string(),
        ));
    }

    let certs = CertificateDer::pem_file_iter(cert_path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|e| {
            MobileServerError::Tls(format!("certificate {}: {e}", cert_path.display()))
        })?;
    if certs.is_empty() {
        return Err(MobileServerError::Tls(format!(
            "certificate {}: no certificates found",
            cert_path.display()
        )));
    }

    let key = PrivateKeyDer::from_pem_file(key_path)
        .map_err(|e| MobileServerError::Tls(format!("key {}: {e}", key_path.display())))?;

    let config = ServerConfig::builder_with_provider(Arc::new(crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| MobileServerError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| MobileServerError::Tls(e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
