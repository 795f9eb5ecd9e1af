//! Fetch command implementation.
//!
//! Authorizes once, then walks the per-environment set of lists: catalog
//! first, download next. A failed list never stops the remaining ones.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fedsfm::{AppSettings, CatalogOutcome, DownloadOutcome, Environment, Session};

use crate::cli::EnvArg;
use crate::output;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Service circuit to fetch from
    #[arg(long, value_enum, default_value = "test")]
    pub env: EnvArg,

    /// Directory to write downloaded list files into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

pub async fn run(args: FetchArgs) -> Result<()> {
    let settings = AppSettings::from_env().context("Failed to load FEDSFM_API_* settings")?;
    let environment = Environment::from(args.env);

    eprintln!("{}", "Authorizing...".dimmed());
    let session = Session::authorize(&settings, environment)
        .await
        .context("Failed to authorize")?;
    output::success(&format!("Authorized against {environment}"));

    match environment {
        Environment::Test => fetch_test(&session, &args.output_dir).await,
        Environment::Production => fetch_production(&session, &args.output_dir).await,
    }
}

async fn fetch_test(session: &Session, dir: &Path) -> Result<()> {
    let suspect = session.te2_catalog().await;
    report_catalog("TE2 suspect list", &suspect)?;
    if let Some(catalog) = suspect.as_found() {
        report_download("TE2 archive", session.download_te2_file(catalog, dir).await);
    }

    let freeze = session.mvk_catalog().await;
    report_catalog("MVK asset-freeze list", &freeze)?;
    if let Some(catalog) = freeze.as_found() {
        report_download("MVK file", session.download_mvk_file(catalog, dir).await);
        report_download(
            "MVK archive",
            session.download_mvk_zip_file(catalog, dir).await,
        );
    }

    Ok(())
}

async fn fetch_production(session: &Session, dir: &Path) -> Result<()> {
    let suspect = session.te21_catalog().await;
    report_catalog("TE2.1 suspect list", &suspect)?;
    if let Some(catalog) = suspect.as_found() {
        report_download(
            "TE2.1 archive",
            session.download_te21_file(catalog, dir).await,
        );
    }

    let freeze = session.mvk_catalog().await;
    report_catalog("MVK asset-freeze list", &freeze)?;
    if let Some(catalog) = freeze.as_found() {
        report_download(
            "MVK archive",
            session.download_mvk_zip_file(catalog, dir).await,
        );
    }

    let un = session.un_catalog().await;
    report_catalog("UN consolidated list", &un)?;
    if let Some(catalog) = un.as_found() {
        report_download("UN file", session.download_un_file(catalog, dir).await);
    }

    Ok(())
}

fn report_catalog(label: &str, outcome: &CatalogOutcome) -> Result<()> {
    match outcome {
        CatalogOutcome::Found(catalog) => {
            output::field(label, "published");
            output::json_pretty(catalog)?;
        }
        CatalogOutcome::NotPublished => output::field(label, "not published"),
        CatalogOutcome::TransportFailed(e) => {
            output::error(&format!("{label}: fetch failed: {e}"));
        }
    }
    Ok(())
}

fn report_download(label: &str, outcome: DownloadOutcome) {
    match outcome {
        DownloadOutcome::Saved(path) => {
            output::success(&format!("{label} saved to {}", path.display()));
        }
        DownloadOutcome::Skipped(reason) => {
            output::error(&format!("{label} skipped: {reason}"));
        }
    }
}
