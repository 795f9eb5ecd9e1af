//! Process configuration loaded from environment variables.
//!
//! Credential and certificate-source settings are supplied through
//! `FEDSFM_API_*` variables. Values are read once at startup; nothing here
//! re-reads the environment later. Emptiness of required credentials is
//! checked by the authenticator, not here, so that a partially configured
//! process can still construct settings for diagnostics.

use std::path::PathBuf;

use crate::auth::Credentials;
use crate::endpoints::BASE_URL;
use crate::error::{Error, InvalidInputError};
use crate::types::{SerialNumber, ServiceUrl};

/// Environment variable names understood by [`AppSettings::from_env`].
pub mod env_vars {
    pub const BASE_URL: &str = "FEDSFM_API_BASE_URL";
    pub const USERNAME: &str = "FEDSFM_API_USERNAME";
    pub const PASSWORD: &str = "FEDSFM_API_PASSWORD";
    pub const SERIAL_NUMBER: &str = "FEDSFM_API_CERTIFICATE_SERIAL_NUMBER";
    pub const STORE_LOCATION: &str = "FEDSFM_API_CERTIFICATE_STORE_LOCATION";
    pub const STORE_NAME: &str = "FEDSFM_API_CERTIFICATE_STORE_NAME";
    pub const CERT_FILE: &str = "FEDSFM_API_CERT_FILE";
    pub const KEY_FILE: &str = "FEDSFM_API_KEY_FILE";
    pub const PFX_FILE: &str = "FEDSFM_API_PFX_FILE";
    pub const PFX_PASSWORD: &str = "FEDSFM_API_PFX_PASSWORD";
}

/// An explicitly configured certificate + private key PEM file pair.
#[derive(Clone, Debug)]
pub struct PemPair {
    pub certificate: PathBuf,
    pub key: PathBuf,
}

/// An explicitly configured PFX/P12 bundle.
#[derive(Clone, Debug)]
pub struct PfxBundle {
    pub path: PathBuf,
    pub password: Option<String>,
}

/// Certificate source configuration.
///
/// At most one of the explicit sources (`pem`, `pfx`) is consulted; if
/// neither is set the platform certificate store is searched by serial.
#[derive(Clone, Debug)]
pub struct CertificateConfig {
    pub serial_number: SerialNumber,
    pub pem: Option<PemPair>,
    pub pfx: Option<PfxBundle>,
    pub store_location: Option<String>,
    pub store_name: Option<String>,
}

/// Complete process settings.
#[derive(Clone, Debug)]
pub struct AppSettings {
    pub base_url: ServiceUrl,
    pub credentials: Credentials,
    pub certificate: CertificateConfig,
}

impl AppSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup function.
    ///
    /// `lookup` returning `None` or an empty string both mean "unset".
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let base_url = ServiceUrl::new(get(env_vars::BASE_URL).as_deref().unwrap_or(BASE_URL))?;

        let pem = match (get(env_vars::CERT_FILE), get(env_vars::KEY_FILE)) {
            (Some(cert), Some(key)) => Some(PemPair {
                certificate: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(InvalidInputError::Empty {
                    field: env_vars::KEY_FILE,
                }
                .into());
            }
            (None, Some(_)) => {
                return Err(InvalidInputError::Empty {
                    field: env_vars::CERT_FILE,
                }
                .into());
            }
        };

        let pfx = get(env_vars::PFX_FILE).map(|path| PfxBundle {
            path: PathBuf::from(path),
            password: get(env_vars::PFX_PASSWORD),
        });

        Ok(Self {
            base_url,
            credentials: Credentials::new(
                get(env_vars::USERNAME).unwrap_or_default(),
                get(env_vars::PASSWORD).unwrap_or_default(),
            ),
            certificate: CertificateConfig {
                serial_number: SerialNumber::new(
                    get(env_vars::SERIAL_NUMBER).unwrap_or_default(),
                ),
                pem,
                pfx,
                store_location: get(env_vars::STORE_LOCATION),
                store_name: get(env_vars::STORE_NAME),
            },
        })
    }
}
