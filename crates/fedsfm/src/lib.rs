//! fedsfm - Client for the Rosfinmonitoring sanctions list service.
//!
//! This library authenticates against the mutual-TLS-protected fedsfm REST
//! service with a client certificate plus username/password, then fetches
//! catalog metadata for the published sanctions/suspect lists and downloads
//! the corresponding list files. All authenticated operations flow through a
//! [`Session`] object.
//!
//! # Example
//!
//! ```no_run
//! use fedsfm::{AppSettings, CatalogOutcome, Environment, Session};
//!
//! # async fn example() -> Result<(), fedsfm::Error> {
//! let settings = AppSettings::from_env()?;
//! let session = Session::authorize(&settings, Environment::Production).await?;
//!
//! match session.mvk_catalog().await {
//!     CatalogOutcome::Found(catalog) => {
//!         session.download_mvk_zip_file(&catalog, ".".as_ref()).await;
//!     }
//!     CatalogOutcome::NotPublished => println!("nothing published"),
//!     CatalogOutcome::TransportFailed(e) => eprintln!("fetch failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod catalog;
pub mod cert;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod session;
pub mod types;

// Re-export primary types at crate root for convenience
pub use auth::{AccessToken, Credentials};
pub use catalog::{CatalogDescriptor, CatalogOutcome, DownloadOutcome, SkipReason};
pub use config::AppSettings;
pub use endpoints::Environment;
pub use error::Error;
pub use session::Session;
pub use types::{SerialNumber, ServiceUrl};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
