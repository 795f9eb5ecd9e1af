//! Endpoint path table for the fedsfm REST service.
//!
//! The service exposes a test circuit ("test-contur") and a production
//! circuit. TE2 and MVK lists exist in both; the TE2.1 and UN lists are
//! published only on the production circuit, so their selectors ignore the
//! environment.

use std::fmt;

/// Default base URL of the fedsfm service.
pub const BASE_URL: &str = "https://portal.fedsfm.ru:8081/Services/fedsfm-service";

/// Which circuit of the service to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    /// The "test-contur" integration circuit.
    Test,
    /// The production circuit.
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// ============================================================================
// Test circuit paths
// ============================================================================

pub const TEST_AUTHENTICATE: &str = "/test-contur/authenticate";
pub const TEST_TE2_CATALOG: &str = "/test-contur/suspect-catalogs/current-te2-catalog";
pub const TEST_TE2_FILE: &str = "/test-contur/suspect-catalogs/current-te2-file";
pub const TEST_MVK_CATALOG: &str = "/test-contur/suspect-catalogs/current-mvk-catalog";
pub const TEST_MVK_ZIP_FILE: &str = "/test-contur/suspect-catalogs/current-mvk-file-zip";
pub const TEST_MVK_FILE: &str = "/test-contur/suspect-catalogs/mvk-catalog-file";

// ============================================================================
// Production circuit paths
// ============================================================================

pub const PROD_AUTHENTICATE: &str = "/authenticate";
pub const PROD_TE2_CATALOG: &str = "/suspect-catalogs/current-te2-catalog";
pub const PROD_TE2_FILE: &str = "/suspect-catalogs/current-te2-file";
pub const PROD_TE21_CATALOG: &str = "/suspect-catalogs/current-te21-catalog";
pub const PROD_TE21_FILE: &str = "/suspect-catalogs/current-te21-file";
pub const PROD_MVK_CATALOG: &str = "/suspect-catalogs/current-mvk-catalog";
pub const PROD_MVK_ZIP_FILE: &str = "/suspect-catalogs/current-mvk-file-zip";
pub const PROD_MVK_FILE: &str = "/suspect-catalogs/mvk-catalog-file";
pub const PROD_UN_CATALOG: &str = "/suspect-catalogs/current-un-catalog";
pub const PROD_UN_FILE: &str = "/suspect-catalogs/current-un-file";

// ============================================================================
// Per-environment selection
// ============================================================================

/// Path of the authenticate endpoint.
pub fn authenticate(env: Environment) -> &'static str {
    match env {
        Environment::Test => TEST_AUTHENTICATE,
        Environment::Production => PROD_AUTHENTICATE,
    }
}

/// Catalog of the TE2 terrorism/extremism list.
pub fn te2_catalog(env: Environment) -> &'static str {
    match env {
        Environment::Test => TEST_TE2_CATALOG,
        Environment::Production => PROD_TE2_CATALOG,
    }
}

/// File of the TE2 terrorism/extremism list.
pub fn te2_file(env: Environment) -> &'static str {
    match env {
        Environment::Test => TEST_TE2_FILE,
        Environment::Production => PROD_TE2_FILE,
    }
}

/// Catalog of the TE2.1 list. Production only.
pub fn te21_catalog(_env: Environment) -> &'static str {
    PROD_TE21_CATALOG
}

/// File of the TE2.1 list. Production only.
pub fn te21_file(_env: Environment) -> &'static str {
    PROD_TE21_FILE
}

/// Catalog of the MVK asset-freeze list.
pub fn mvk_catalog(env: Environment) -> &'static str {
    match env {
        Environment::Test => TEST_MVK_CATALOG,
        Environment::Production => PROD_MVK_CATALOG,
    }
}

/// XML file of the MVK asset-freeze list.
pub fn mvk_file(env: Environment) -> &'static str {
    match env {
        Environment::Test => TEST_MVK_FILE,
        Environment::Production => PROD_MVK_FILE,
    }
}

/// ZIP file of the MVK asset-freeze list.
pub fn mvk_zip_file(env: Environment) -> &'static str {
    match env {
        Environment::Test => TEST_MVK_ZIP_FILE,
        Environment::Production => PROD_MVK_ZIP_FILE,
    }
}

/// Catalog of the UN consolidated list. Production only.
pub fn un_catalog(_env: Environment) -> &'static str {
    PROD_UN_CATALOG
}

/// File of the UN consolidated list. Production only.
pub fn un_file(_env: Environment) -> &'static str {
    PROD_UN_FILE
}
