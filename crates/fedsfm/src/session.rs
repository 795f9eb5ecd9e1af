//! Authorized session over the fedsfm service.

use std::path::Path;

use tracing::{info, instrument};

use crate::auth::Authenticator;
use crate::catalog::{CatalogClient, CatalogDescriptor, CatalogOutcome, DownloadOutcome};
use crate::config::AppSettings;
use crate::endpoints::{self, Environment};
use crate::error::Error;
use crate::types::ServiceUrl;

/// An authorized session against one environment of the service.
///
/// A `Session` exists only after a successful login: the access token lives
/// inside it and is read-only afterwards, so every catalog and download
/// operation is authorized by construction. Re-authorizing means calling
/// [`Session::authorize`] again and replacing the value.
///
/// # Example
///
/// ```no_run
/// use fedsfm::{AppSettings, Environment, Session};
///
/// # async fn example() -> Result<(), fedsfm::Error> {
/// let settings = AppSettings::from_env()?;
/// let session = Session::authorize(&settings, Environment::Test).await?;
///
/// if let Some(catalog) = session.te2_catalog().await.found() {
///     session.download_te2_file(&catalog, ".".as_ref()).await;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    base: ServiceUrl,
    environment: Environment,
    catalog: CatalogClient,
}

impl Session {
    /// Authenticate and create a session.
    ///
    /// Resolves the client certificate, performs the mutual-TLS login
    /// exchange, and stores the issued bearer token in the returned session.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential field is blank, the certificate
    /// cannot be resolved, or the login exchange fails. Authentication
    /// failures are fatal to the calling workflow; there is no token to
    /// proceed with.
    #[instrument(skip(settings), fields(base = %settings.base_url, environment = %environment))]
    pub async fn authorize(
        settings: &AppSettings,
        environment: Environment,
    ) -> Result<Self, Error> {
        info!(user_name = settings.credentials.user_name(), "authorizing");

        let authenticator = Authenticator::new(
            &settings.base_url,
            environment,
            settings.certificate.clone(),
        );
        let token = authenticator.login(&settings.credentials).await?;

        info!("authorization successful");

        Ok(Self {
            base: settings.base_url.clone(),
            environment,
            catalog: CatalogClient::new(token)?,
        })
    }

    /// The environment this session was authorized against.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The service base URL.
    pub fn base_url(&self) -> &ServiceUrl {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        self.base.endpoint_url(path)
    }

    // ========================================================================
    // Catalog operations
    // ========================================================================

    /// Current catalog of the TE2 terrorism/extremism list.
    pub async fn te2_catalog(&self) -> CatalogOutcome {
        self.catalog
            .fetch_catalog(&self.url(endpoints::te2_catalog(self.environment)))
            .await
    }

    /// Current catalog of the TE2.1 terrorism/extremism list (production
    /// only, regardless of the session environment).
    pub async fn te21_catalog(&self) -> CatalogOutcome {
        self.catalog
            .fetch_catalog(&self.url(endpoints::te21_catalog(self.environment)))
            .await
    }

    /// Current catalog of the MVK asset-freeze list.
    pub async fn mvk_catalog(&self) -> CatalogOutcome {
        self.catalog
            .fetch_catalog(&self.url(endpoints::mvk_catalog(self.environment)))
            .await
    }

    /// Current catalog of the UN consolidated list (production only,
    /// regardless of the session environment).
    pub async fn un_catalog(&self) -> CatalogOutcome {
        self.catalog
            .fetch_catalog(&self.url(endpoints::un_catalog(self.environment)))
            .await
    }

    // ========================================================================
    // Download operations
    // ========================================================================

    /// Download the TE2 list file into `dir` as `suspect_{YYYYMMDD}.zip`.
    pub async fn download_te2_file(
        &self,
        descriptor: &CatalogDescriptor,
        dir: &Path,
    ) -> DownloadOutcome {
        self.catalog
            .download_file(
                descriptor,
                &self.url(endpoints::te2_file(self.environment)),
                "zip",
                "suspect",
                dir,
            )
            .await
    }

    /// Download the TE2.1 list file into `dir` as `suspect_{YYYYMMDD}.zip`.
    pub async fn download_te21_file(
        &self,
        descriptor: &CatalogDescriptor,
        dir: &Path,
    ) -> DownloadOutcome {
        self.catalog
            .download_file(
                descriptor,
                &self.url(endpoints::te21_file(self.environment)),
                "zip",
                "suspect",
                dir,
            )
            .await
    }

    /// Download the MVK list XML into `dir` as `freeze_{YYYYMMDD}.xml`.
    pub async fn download_mvk_file(
        &self,
        descriptor: &CatalogDescriptor,
        dir: &Path,
    ) -> DownloadOutcome {
        self.catalog
            .download_file(
                descriptor,
                &self.url(endpoints::mvk_file(self.environment)),
                "xml",
                "freeze",
                dir,
            )
            .await
    }

    /// Download the MVK list archive into `dir` as `freeze_{YYYYMMDD}.zip`.
    pub async fn download_mvk_zip_file(
        &self,
        descriptor: &CatalogDescriptor,
        dir: &Path,
    ) -> DownloadOutcome {
        self.catalog
            .download_file(
                descriptor,
                &self.url(endpoints::mvk_zip_file(self.environment)),
                "zip",
                "freeze",
                dir,
            )
            .await
    }

    /// Download the UN consolidated list into `dir` as `un_{YYYYMMDD}.xml`.
    pub async fn download_un_file(
        &self,
        descriptor: &CatalogDescriptor,
        dir: &Path,
    ) -> DownloadOutcome {
        self.catalog
            .download_file(
                descriptor,
                &self.url(endpoints::un_file(self.environment)),
                "xml",
                "un",
                dir,
            )
            .await
    }
}
