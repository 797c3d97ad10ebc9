use std::path::{Path, PathBuf};

use common::{config::Settings, plot::Plot, report};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod chart;

use chart::ChartSpec;

/// Chart dimensions in pixels when the config does not override them.
pub const DEFAULT_CHART_SIZE: (u32, u32) = (640, 480);

/// Line chart per report: both timing series over the workload sizes, each
/// point annotated with its value, saved as `<subject>.png` next to the
/// report.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChurnBasic;

#[async_trait::async_trait]
#[typetag::serde]
impl Plot for ChurnBasic {
    async fn plot(&self, data_path: &Path, settings: &Settings) -> Result<()> {
        let size = settings.chart_size.unwrap_or(DEFAULT_CHART_SIZE);
        // one report read, converted and rendered before the next is touched
        for path in report::scan(data_path).await? {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("Reading data from {file_name}");
            let report = report::load(&path).await?;
            println!("Presenting data for {}", report.subject);
            let out = chart_path(data_path, &report.subject);
            ChartSpec::from_report(&report).render(&out, size)?;
            debug!("Saved {}", out.display());
        }
        Ok(())
    }
}

/// Chart image path for a subject, next to its report.
pub fn chart_path(data_path: &Path, subject: &str) -> PathBuf {
    data_path.join(format!("{subject}.png"))
}
