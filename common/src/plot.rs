use core::fmt::Debug;
use std::path::Path;

use downcast_rs::{Downcast, impl_downcast};
use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use tracing::debug;

use crate::config::Settings;

#[typetag::serde(tag = "type")]
#[async_trait::async_trait]
pub trait Plot: Debug + DynClone + Downcast + Send + Sync {
    /// Plots the data
    ///
    /// Arguments:
    /// * `data_path` - The directory holding the report files; charts are
    ///   written next to them
    /// * `settings` - The settings from config.yaml
    async fn plot(&self, data_path: &Path, settings: &Settings) -> Result<()>;
}
clone_trait_object!(Plot);
impl_downcast!(Plot);

/// Runs every configured plot over one data directory, in order.
pub async fn plot(
    plots: &Option<Vec<Box<dyn Plot>>>,
    data_path: &Path,
    settings: &Settings,
) -> Result<()> {
    let Some(plots) = plots else {
        debug!("No plots");
        return Ok(());
    };
    for plot in plots {
        plot.plot(data_path, settings).await?
    }
    Ok(())
}
