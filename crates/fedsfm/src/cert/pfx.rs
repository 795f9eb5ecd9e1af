//! PFX/P12 bundle extraction.
//!
//! The certificate and the unencrypted private key are unpacked with the
//! external `openssl pkcs12` tool into two temporary files with unique
//! names, read back into memory, and the files are removed on every exit
//! path (the `NamedTempFile` guards delete on drop).

use std::path::Path;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::error::CertificateError;

use super::CertificateMaterial;

pub(crate) async fn extract(
    bundle: &Path,
    password: Option<&str>,
) -> Result<CertificateMaterial, CertificateError> {
    let cert_out = temp_output("fedsfm-pfx-cert-")?;
    let key_out = temp_output("fedsfm-pfx-key-")?;

    let passin = format!("pass:{}", password.unwrap_or(""));

    debug!(bundle = %bundle.display(), "extracting certificate from PFX bundle");
    run_openssl(
        Command::new("openssl")
            .arg("pkcs12")
            .arg("-in")
            .arg(bundle)
            .arg("-clcerts")
            .arg("-nokeys")
            .arg("-out")
            .arg(cert_out.path())
            .arg("-passin")
            .arg(&passin),
    )
    .await?;

    debug!(bundle = %bundle.display(), "extracting private key from PFX bundle");
    run_openssl(
        Command::new("openssl")
            .arg("pkcs12")
            .arg("-in")
            .arg(bundle)
            .arg("-nocerts")
            .arg("-nodes")
            .arg("-out")
            .arg(key_out.path())
            .arg("-passin")
            .arg(&passin),
    )
    .await?;

    let certificate = read_extracted(cert_out.path()).await?;
    let private_key = read_extracted(key_out.path()).await?;

    Ok(CertificateMaterial::new(certificate, private_key))
}

fn temp_output(prefix: &str) -> Result<NamedTempFile, CertificateError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".pem")
        .tempfile()
        .map_err(|e| CertificateError::Extraction {
            message: format!("failed to create temporary file: {e}"),
        })
}

async fn run_openssl(command: &mut Command) -> Result<(), CertificateError> {
    let output = command
        .output()
        .await
        .map_err(|e| CertificateError::Extraction {
            message: format!("failed to run openssl: {e}"),
        })?;

    if !output.status.success() {
        return Err(CertificateError::Extraction {
            message: format!(
                "openssl exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

async fn read_extracted(path: &Path) -> Result<Vec<u8>, CertificateError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CertificateError::Extraction {
            message: format!("failed to read extracted file {}: {e}", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // The leftover scan looks at the shared temp directory, so tests that
    // have extraction files in flight must not overlap.
    static TEMP_SCAN_LOCK: Mutex<()> = Mutex::new(());

    fn leftover_extraction_files() -> Vec<PathBuf> {
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("fedsfm-pfx-"))
            })
            .collect()
    }

    #[tokio::test]
    async fn successful_extraction_leaves_no_temp_files() {
        let _guard = TEMP_SCAN_LOCK.lock().unwrap();

        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("client.pfx");

        let export = std::process::Command::new("openssl")
            .arg("pkcs12")
            .arg("-export")
            .arg("-in")
            .arg(fixtures.join("client-cert.pem"))
            .arg("-inkey")
            .arg(fixtures.join("client-key.pem"))
            .arg("-out")
            .arg(&bundle)
            .arg("-passout")
            .arg("pass:secret")
            .output();
        let Ok(output) = export else {
            // No openssl on this host; the extraction path cannot run either.
            return;
        };
        assert!(
            output.status.success(),
            "building the test bundle failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let material = extract(&bundle, Some("secret")).await.unwrap();
        let certificate = String::from_utf8_lossy(material.certificate()).into_owned();
        let private_key = String::from_utf8_lossy(material.private_key()).into_owned();
        assert!(certificate.contains("BEGIN CERTIFICATE"));
        assert!(private_key.contains("PRIVATE KEY"));

        assert!(
            leftover_extraction_files().is_empty(),
            "extraction temp files must be removed on the success path"
        );
    }

    #[tokio::test]
    async fn missing_bundle_fails_and_leaves_no_temp_files() {
        let _guard = TEMP_SCAN_LOCK.lock().unwrap();

        let result = extract(Path::new("/nonexistent/bundle.pfx"), Some("secret")).await;

        // Fails whether openssl is installed (bad input) or absent (spawn error).
        let err = result.unwrap_err();
        assert!(matches!(err, CertificateError::Extraction { .. }));
        assert!(err.to_string().contains("openssl"));

        assert!(
            leftover_extraction_files().is_empty(),
            "extraction temp files must be removed on the failure path"
        );
    }
}
