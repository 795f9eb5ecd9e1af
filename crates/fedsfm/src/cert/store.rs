//! Platform certificate store lookup strategies.
//!
//! Each platform satisfies the same contract: find a certificate matching a
//! serial number, or report that none exists. The strategy is picked once by
//! host operating system; every implementation shells out to the platform's
//! own tooling, so all of them compile everywhere and the selection happens
//! at runtime.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::CertificateConfig;
use crate::error::CertificateError;
use crate::types::SerialNumber;

use super::CertificateMaterial;

/// Password protecting the short-lived private-key export on Windows.
///
/// SECURITY: this is a fixed placeholder, not a secret. The exported bundle
/// exists only for the duration of one resolution call and is removed when
/// the temp-file guard drops, but while it exists on disk the password
/// offers no real protection.
const EXPORT_PASSWORD: &str = "fedsfm-export";

/// A certificate store lookup strategy.
///
/// Implementations are best-effort: an `Err` from [`StoreLookup::find`] is
/// logged by the resolver as a warning and treated as "not found".
#[async_trait]
pub trait StoreLookup: Send + Sync {
    /// Human-readable store identifier used in logs and error messages.
    fn name(&self) -> String;

    /// Search the store for a certificate matching the serial number.
    async fn find(
        &self,
        serial: &SerialNumber,
    ) -> Result<Option<CertificateMaterial>, CertificateError>;
}

/// Select the store strategy for the host operating system.
pub fn platform_store(config: &CertificateConfig) -> Box<dyn StoreLookup> {
    match std::env::consts::OS {
        "windows" => Box::new(WindowsStore::from_config(config)),
        "macos" => Box::new(MacosStore),
        _ => Box::new(UnixStore::default()),
    }
}

fn store_error(store: &str, message: impl Into<String>) -> CertificateError {
    CertificateError::Store {
        store: store.to_string(),
        message: message.into(),
    }
}

// ============================================================================
// Windows: current-user personal store via PowerShell
// ============================================================================

/// Lookup in the Windows certificate store (`Cert:` drive).
pub struct WindowsStore {
    location: String,
    name: String,
}

impl WindowsStore {
    fn from_config(config: &CertificateConfig) -> Self {
        Self {
            location: config
                .store_location
                .clone()
                .unwrap_or_else(|| "CurrentUser".to_string()),
            name: config.store_name.clone().unwrap_or_else(|| "My".to_string()),
        }
    }
}

#[async_trait]
impl StoreLookup for WindowsStore {
    fn name(&self) -> String {
        format!("Cert:\\{}\\{}", self.location, self.name)
    }

    async fn find(
        &self,
        serial: &SerialNumber,
    ) -> Result<Option<CertificateMaterial>, CertificateError> {
        let store = self.name();
        let pfx_out = export_file(&store, ".pfx")?;
        let cer_out = export_file(&store, ".cer")?;

        let script = export_script(
            &store,
            &serial.normalized(),
            pfx_out.path(),
            cer_out.path(),
        );

        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .output()
            .await
            .map_err(|e| store_error(&store, format!("failed to run powershell: {e}")))?;

        match output.status.code() {
            Some(0) => {}
            Some(2) => {
                debug!(serial = %serial, store = %store, "no certificate with matching serial");
                return Ok(None);
            }
            _ => {
                return Err(store_error(
                    &store,
                    format!(
                        "powershell exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                ));
            }
        }

        // The exported certificate bytes stand in for both slots; the key
        // material lives in the password-protected bundle export, which is
        // removed together with the guards.
        let certificate = tokio::fs::read(cer_out.path())
            .await
            .map_err(|e| store_error(&store, format!("failed to read exported certificate: {e}")))?;
        Ok(Some(CertificateMaterial::from_bundle(certificate)))
    }
}

/// Build the PowerShell export script.
///
/// Exit code 2 marks "no matching certificate" so it can be told apart from
/// a genuinely failed export. Both export targets already exist when the
/// script runs (the temp-file guards create them), so both cmdlets must
/// overwrite with `-Force`.
fn export_script(
    store: &str,
    serial: &str,
    pfx: &std::path::Path,
    cer: &std::path::Path,
) -> String {
    format!(
        "$c = Get-ChildItem -Path {store} | Where-Object {{ $_.SerialNumber -eq '{serial}' }} | Select-Object -First 1; \
         if (-not $c) {{ exit 2 }}; \
         $pw = ConvertTo-SecureString -String '{password}' -Force -AsPlainText; \
         Export-PfxCertificate -Cert $c -FilePath '{pfx}' -Password $pw -Force | Out-Null; \
         Export-Certificate -Cert $c -FilePath '{cer}' -Force | Out-Null",
        store = store,
        serial = serial,
        password = EXPORT_PASSWORD,
        pfx = pfx.display(),
        cer = cer.display(),
    )
}

fn export_file(store: &str, suffix: &str) -> Result<tempfile::NamedTempFile, CertificateError> {
    tempfile::Builder::new()
        .prefix("fedsfm-store-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| store_error(store, format!("failed to create export file: {e}")))
}

// ============================================================================
// macOS: system keychain via `security`
// ============================================================================

/// Lookup in the macOS keychain.
pub struct MacosStore;

#[async_trait]
impl StoreLookup for MacosStore {
    fn name(&self) -> String {
        "macOS keychain".to_string()
    }

    async fn find(
        &self,
        serial: &SerialNumber,
    ) -> Result<Option<CertificateMaterial>, CertificateError> {
        let store = self.name();
        let needle = serial.normalized();

        let output = Command::new("security")
            .args(["find-certificate", "-a", "-c", &needle, "-p"])
            .output()
            .await
            .map_err(|e| store_error(&store, format!("failed to run security: {e}")))?;

        if !output.status.success() {
            return Err(store_error(
                &store,
                format!(
                    "security exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let pem = output.stdout;
        if !pem
            .windows(b"BEGIN CERTIFICATE".len())
            .any(|w| w == b"BEGIN CERTIFICATE")
        {
            debug!(needle = %needle, store = %store, "no certificate with matching label");
            return Ok(None);
        }

        Ok(Some(CertificateMaterial::from_bundle(pem)))
    }
}

// ============================================================================
// Other Unix: scan the system trust store with openssl
// ============================================================================

/// Lookup across system trust-store directories on generic Unix.
pub struct UnixStore {
    directories: Vec<PathBuf>,
}

impl Default for UnixStore {
    fn default() -> Self {
        Self {
            directories: vec![PathBuf::from("/etc/ssl/certs")],
        }
    }
}

#[async_trait]
impl StoreLookup for UnixStore {
    fn name(&self) -> String {
        "system trust store".to_string()
    }

    async fn find(
        &self,
        serial: &SerialNumber,
    ) -> Result<Option<CertificateMaterial>, CertificateError> {
        let store = self.name();
        let needle = serial.normalized();

        for dir in &self.directories {
            let mut entries = match tokio::fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    trace!(dir = %dir.display(), error = %e, "skipping unreadable trust directory");
                    continue;
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| store_error(&store, format!("failed to list {}: {e}", dir.display())))?
            {
                let path = entry.path();
                let is_cert = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pem") || e.eq_ignore_ascii_case("crt"));
                if !is_cert {
                    continue;
                }

                match certificate_serial(&path).await {
                    Ok(Some(found)) if found == needle => {
                        debug!(path = %path.display(), "serial matched in trust store");
                        let bytes = tokio::fs::read(&path).await.map_err(|e| {
                            store_error(&store, format!("failed to read {}: {e}", path.display()))
                        })?;
                        return Ok(Some(CertificateMaterial::from_bundle(bytes)));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Unparseable certificates are common in trust dirs.
                        trace!(path = %path.display(), error = %e, "skipping candidate");
                    }
                }
            }
        }

        Ok(None)
    }
}

/// Reads the serial of a PEM/DER certificate file via `openssl x509`.
async fn certificate_serial(path: &std::path::Path) -> Result<Option<String>, CertificateError> {
    let output = Command::new("openssl")
        .arg("x509")
        .arg("-noout")
        .arg("-serial")
        .arg("-in")
        .arg(path)
        .output()
        .await
        .map_err(|e| store_error("system trust store", format!("failed to run openssl: {e}")))?;

    if !output.status.success() {
        return Ok(None);
    }

    // Output has the form "serial=00ABCDEF".
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .trim()
        .split_once('=')
        .map(|(_, serial)| serial.trim().to_ascii_uppercase()))
}
