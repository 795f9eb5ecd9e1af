//! Client certificate resolution.
//!
//! Certificate provisioning differs per deployment target, so material is
//! located across heterogeneous sources in a fixed priority order: an
//! explicit PEM file pair, a PFX/P12 bundle, then the host platform's
//! certificate store. The first configured source wins; once an explicitly
//! configured source (PEM pair or PFX) has been attempted, later sources are
//! never consulted, even on failure. Store lookups are best-effort and only
//! ever downgrade to "not found".

mod pfx;
mod store;

pub use store::{StoreLookup, platform_store};

use std::fmt;

use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::config::{CertificateConfig, PemPair};
use crate::error::CertificateError;
use crate::types::SerialNumber;

/// An owned certificate + private key byte pair.
///
/// Produced by [`CertificateResolver::resolve`] and consumed exactly once to
/// build the mutual-TLS identity for the login call; not retained afterwards.
/// Store-backed sources export a single bundle carrying both the certificate
/// and the key material, in which case the same bytes fill both slots.
#[derive(Clone)]
pub struct CertificateMaterial {
    certificate: Vec<u8>,
    private_key: Vec<u8>,
}

impl CertificateMaterial {
    pub(crate) fn new(certificate: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            certificate,
            private_key,
        }
    }

    /// Material from a single export that carries both certificate and key.
    pub(crate) fn from_bundle(bytes: Vec<u8>) -> Self {
        Self {
            certificate: bytes.clone(),
            private_key: bytes,
        }
    }

    /// Returns the certificate bytes.
    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    /// Returns the private key bytes.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// PEM buffer for building a TLS identity: certificate followed by key,
    /// or the bundle alone when one export carries both.
    pub(crate) fn identity_pem(&self) -> Vec<u8> {
        if self.certificate == self.private_key {
            return self.certificate.clone();
        }
        let mut pem = Vec::with_capacity(self.certificate.len() + self.private_key.len() + 1);
        pem.extend_from_slice(&self.certificate);
        if !self.certificate.ends_with(b"\n") {
            pem.push(b'\n');
        }
        pem.extend_from_slice(&self.private_key);
        pem
    }
}

// Key material stays out of Debug output
impl fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("certificate_len", &self.certificate.len())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Locates client certificate material across the configured sources.
pub struct CertificateResolver {
    config: CertificateConfig,
    store: Box<dyn StoreLookup>,
}

impl CertificateResolver {
    /// Create a resolver with the store strategy for the host platform.
    pub fn new(config: CertificateConfig) -> Self {
        let store = platform_store(&config);
        Self { config, store }
    }

    /// Create a resolver with an explicit store strategy.
    pub fn with_store(config: CertificateConfig, store: Box<dyn StoreLookup>) -> Self {
        Self { config, store }
    }

    /// Returns the configured serial number.
    pub fn serial(&self) -> &SerialNumber {
        &self.config.serial_number
    }

    /// Resolve certificate material from the first configured source.
    ///
    /// # Errors
    ///
    /// - [`CertificateError::FileRead`] if a configured PEM pair is unreadable
    /// - [`CertificateError::Extraction`] if a configured PFX bundle cannot
    ///   be unpacked
    /// - [`CertificateError::NotFound`] if no source yields material
    #[instrument(skip(self), fields(serial = %self.config.serial_number))]
    pub async fn resolve(&self) -> Result<CertificateMaterial, CertificateError> {
        if let Some(pair) = &self.config.pem {
            debug!(
                certificate = %pair.certificate.display(),
                key = %pair.key.display(),
                "resolving certificate from PEM file pair"
            );
            return read_pem_pair(pair).await;
        }

        if let Some(bundle) = &self.config.pfx {
            debug!(path = %bundle.path.display(), "resolving certificate from PFX bundle");
            return pfx::extract(&bundle.path, bundle.password.as_deref()).await;
        }

        match self.store.find(&self.config.serial_number).await {
            Ok(Some(material)) => {
                info!(store = %self.store.name(), "certificate found in platform store");
                return Ok(material);
            }
            Ok(None) => {
                debug!(store = %self.store.name(), "certificate not found in platform store");
            }
            Err(e) => {
                // Best-effort: a broken store query is not fatal.
                warn!(store = %self.store.name(), error = %e, "platform store lookup failed");
            }
        }

        Err(CertificateError::NotFound {
            serial: self.config.serial_number.as_str().to_string(),
            store: self.store.name(),
        })
    }
}

async fn read_pem_pair(pair: &PemPair) -> Result<CertificateMaterial, CertificateError> {
    let certificate =
        fs::read(&pair.certificate)
            .await
            .map_err(|source| CertificateError::FileRead {
                path: pair.certificate.clone(),
                source,
            })?;
    let private_key = fs::read(&pair.key)
        .await
        .map_err(|source| CertificateError::FileRead {
            path: pair.key.clone(),
            source,
        })?;
    Ok(CertificateMaterial::new(certificate, private_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubStore {
        calls: Arc<AtomicUsize>,
        result: fn() -> Result<Option<CertificateMaterial>, CertificateError>,
    }

    #[async_trait]
    impl StoreLookup for StubStore {
        fn name(&self) -> String {
            "stub".to_string()
        }

        async fn find(
            &self,
            _serial: &SerialNumber,
        ) -> Result<Option<CertificateMaterial>, CertificateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn config(pem: Option<PemPair>, pfx: Option<crate::config::PfxBundle>) -> CertificateConfig {
        CertificateConfig {
            serial_number: SerialNumber::new("00ab"),
            pem,
            pfx,
            store_location: None,
            store_name: None,
        }
    }

    fn stub(
        calls: &Arc<AtomicUsize>,
        result: fn() -> Result<Option<CertificateMaterial>, CertificateError>,
    ) -> Box<dyn StoreLookup> {
        Box::new(StubStore {
            calls: calls.clone(),
            result,
        })
    }

    #[tokio::test]
    async fn pem_pair_wins_and_store_is_never_consulted() {
        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("client.pem");
        let key_path = dir.path().join("client.key");
        std::fs::File::create(&cert_path)
            .unwrap()
            .write_all(b"CERT")
            .unwrap();
        std::fs::File::create(&key_path)
            .unwrap()
            .write_all(b"KEY")
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CertificateResolver::with_store(
            config(
                Some(PemPair {
                    certificate: cert_path,
                    key: key_path,
                }),
                None,
            ),
            stub(&calls, || Ok(None)),
        );

        let material = resolver.resolve().await.unwrap();
        assert_eq!(material.certificate(), b"CERT");
        assert_eq!(material.private_key(), b"KEY");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_pem_pair_is_fatal_without_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CertificateResolver::with_store(
            config(
                Some(PemPair {
                    certificate: PathBuf::from("/nonexistent/cert.pem"),
                    key: PathBuf::from("/nonexistent/key.pem"),
                }),
                None,
            ),
            stub(&calls, || {
                Ok(Some(CertificateMaterial::from_bundle(b"unused".to_vec())))
            }),
        );

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, CertificateError::FileRead { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_pfx_extraction_is_fatal_without_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CertificateResolver::with_store(
            config(
                None,
                Some(crate::config::PfxBundle {
                    path: PathBuf::from("/nonexistent/bundle.pfx"),
                    password: None,
                }),
            ),
            stub(&calls, || {
                Ok(Some(CertificateMaterial::from_bundle(b"unused".to_vec())))
            }),
        );

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, CertificateError::Extraction { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_hit_yields_material() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CertificateResolver::with_store(
            config(None, None),
            stub(&calls, || {
                Ok(Some(CertificateMaterial::from_bundle(b"STORE".to_vec())))
            }),
        );

        let material = resolver.resolve().await.unwrap();
        assert_eq!(material.certificate(), b"STORE");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_miss_becomes_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver =
            CertificateResolver::with_store(config(None, None), stub(&calls, || Ok(None)));

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, CertificateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn store_failure_is_a_warning_not_fatal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CertificateResolver::with_store(
            config(None, None),
            stub(&calls, || {
                Err(CertificateError::Store {
                    store: "stub".into(),
                    message: "store exploded".into(),
                })
            }),
        );

        // The lookup error is swallowed; only total exhaustion is reported.
        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, CertificateError::NotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identity_pem_concatenates_distinct_pair() {
        let material = CertificateMaterial::new(b"CERT".to_vec(), b"KEY".to_vec());
        assert_eq!(material.identity_pem(), b"CERT\nKEY");
    }

    #[test]
    fn identity_pem_does_not_duplicate_bundles() {
        let material = CertificateMaterial::from_bundle(b"BUNDLE".to_vec());
        assert_eq!(material.identity_pem(), b"BUNDLE");
    }
}
