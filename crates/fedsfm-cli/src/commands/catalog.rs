//! Catalog command implementation.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use fedsfm::{AppSettings, CatalogOutcome, Environment, Session};

use crate::cli::EnvArg;
use crate::output;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Service circuit to query
    #[arg(long, value_enum, default_value = "test")]
    pub env: EnvArg,

    /// Which list's catalog to fetch
    #[arg(value_enum)]
    pub list: ListArg,
}

/// Sanctions list selector.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ListArg {
    /// Suspected terrorism/extremism involvement list
    Te2,
    /// Superseding suspect list (production only)
    Te21,
    /// Interagency commission asset-freeze list
    Mvk,
    /// UN Security Council consolidated list (production only)
    Un,
}

pub async fn run(args: CatalogArgs) -> Result<()> {
    let settings = AppSettings::from_env().context("Failed to load FEDSFM_API_* settings")?;
    let environment = Environment::from(args.env);

    let session = Session::authorize(&settings, environment)
        .await
        .context("Failed to authorize")?;

    let outcome = match args.list {
        ListArg::Te2 => session.te2_catalog().await,
        ListArg::Te21 => session.te21_catalog().await,
        ListArg::Mvk => session.mvk_catalog().await,
        ListArg::Un => session.un_catalog().await,
    };

    match outcome {
        CatalogOutcome::Found(catalog) => output::json_pretty(&catalog)?,
        CatalogOutcome::NotPublished => output::field("catalog", "not published"),
        CatalogOutcome::TransportFailed(e) => {
            output::error(&format!("catalog fetch failed: {e}"));
            anyhow::bail!("catalog fetch failed");
        }
    }

    Ok(())
}
