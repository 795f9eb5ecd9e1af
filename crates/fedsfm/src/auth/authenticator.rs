//! The login exchange over mutual TLS.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cert::CertificateResolver;
use crate::config::CertificateConfig;
use crate::endpoints::{self, Environment};
use crate::error::{AuthError, Error, InvalidInputError, TransportError};
use crate::types::ServiceUrl;

use super::{AccessToken, Credentials};

/// Request body for the authenticate endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

/// Envelope returned by the authenticate endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    value: Option<LoginValue>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    has_errors: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginValue {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    current_user: Option<CurrentUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUser {
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    kb_short_name: Option<String>,
    #[serde(default)]
    is_authenticated: bool,
}

/// Performs the mutually-authenticated login exchange.
///
/// The client certificate is presented only for this one call; subsequent
/// catalog traffic authenticates with the issued bearer token instead.
pub struct Authenticator {
    url: String,
    resolver: CertificateResolver,
}

impl Authenticator {
    /// Create an authenticator for the given base URL and environment.
    pub fn new(
        base: &ServiceUrl,
        environment: Environment,
        certificate: CertificateConfig,
    ) -> Self {
        Self {
            url: base.endpoint_url(endpoints::authenticate(environment)),
            resolver: CertificateResolver::new(certificate),
        }
    }

    /// Authenticate and obtain a bearer token. A single attempt; a failure
    /// is terminal for this call.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if user name, password, or serial number is
    ///   blank (checked before any certificate or network activity)
    /// - [`Error::Auth`] for everything that goes wrong afterwards, with the
    ///   underlying cause preserved
    #[instrument(skip(self, credentials), fields(url = %self.url))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AccessToken, Error> {
        require_non_blank("user name", credentials.user_name())?;
        require_non_blank("password", credentials.password())?;
        if self.resolver.serial().is_blank() {
            return Err(InvalidInputError::Empty {
                field: "certificate serial number",
            }
            .into());
        }

        debug!(serial = %self.resolver.serial(), "resolving client certificate");
        let material = self.resolver.resolve().await.map_err(AuthError::Certificate)?;

        let identity = reqwest::Identity::from_pem(&material.identity_pem())
            .map_err(|e| AuthError::Identity {
                message: e.to_string(),
            })?;

        // Server certificate verification stays at the reqwest default:
        // strict, with no opt-out.
        let client = reqwest::Client::builder()
            .user_agent(concat!("fedsfm/", env!("CARGO_PKG_VERSION")))
            .identity(identity)
            .build()
            .map_err(|e| AuthError::Identity {
                message: e.to_string(),
            })?;

        debug!(user_name = credentials.user_name(), "sending authentication request");
        let response = client
            .post(&self.url)
            .json(&LoginRequest {
                user_name: credentials.user_name(),
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Transport(TransportError::from(e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(TransportError::from(e)))?;
        debug!(status, body = %body, "authentication response");

        if status != 200 {
            return Err(AuthError::Status { status, body }.into());
        }

        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::MalformedResponse {
                message: e.to_string(),
            })?;

        if !parsed.success {
            return Err(AuthError::Rejected {
                message: rejection_message(&parsed),
            }
            .into());
        }

        let value = parsed.value.ok_or(AuthError::MissingToken)?;
        let token = value
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        match &value.current_user {
            Some(user) => info!(
                user_name = user.user_name.as_deref().unwrap_or("n/a"),
                kb_short_name = user.kb_short_name.as_deref().unwrap_or("n/a"),
                is_authenticated = user.is_authenticated,
                "authentication successful"
            ),
            None => info!("authentication successful"),
        }

        Ok(AccessToken::new(token))
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(InvalidInputError::Empty { field }.into());
    }
    Ok(())
}

fn rejection_message(response: &LoginResponse) -> String {
    let mut message = response
        .error
        .clone()
        .unwrap_or_else(|| "unknown authentication error".to_string());

    if response.has_errors
        && let Some(errors) = response.errors.as_ref().filter(|e| !e.is_empty())
    {
        let joined = errors
            .iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        message = format!("{message}. Additional errors: {joined}");
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_joins_secondary_errors() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"success": false, "error": "bad login", "hasErrors": true, "errors": ["a", "b"]}"#,
        )
        .unwrap();
        let message = rejection_message(&response);
        assert!(message.contains("bad login"));
        assert!(message.contains("a"));
        assert!(message.contains("b"));
    }

    #[test]
    fn rejection_message_without_secondary_errors() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"success": false, "error": "bad login", "hasErrors": false}"#)
                .unwrap();
        assert_eq!(rejection_message(&response), "bad login");
    }

    #[test]
    fn rejection_message_defaults_when_error_is_absent() {
        let response: LoginResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(rejection_message(&response), "unknown authentication error");
    }
}
