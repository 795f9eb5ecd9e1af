//! Login credentials type.

use std::fmt;

/// Login credentials for the fedsfm service.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental
/// logging.
///
/// # Example
///
/// ```
/// use fedsfm::Credentials;
///
/// let creds = Credentials::new("operator", "s3cret");
/// assert_eq!(creds.user_name(), "operator");
/// ```
#[derive(Clone)]
pub struct Credentials {
    user_name: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    /// Returns the user name.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the authentication request.
    /// Never log or display this value.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

// Intentionally hide password in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
