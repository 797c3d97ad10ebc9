use std::{collections::HashMap, path::PathBuf, time::Duration};

use chrono::Local;
use common::{
    DEFAULT_DATA_DIR,
    bench::{Bench, BenchArgs, SubjectInfo},
    config::Config,
    report,
};
use eyre::Result;
use futures::future::join_all;
use indicatif::ProgressBar;
use tokio::{
    fs::{canonicalize, copy, create_dir_all, read_to_string, write},
    task::spawn_blocking,
};
use tracing::debug;

pub async fn run_benchmark(config_file: String, no_progress: bool, skip_plot: bool) -> Result<()> {
    let config: Config = serde_yml::from_str(&read_to_string(&config_file).await?)?;

    let data_path = PathBuf::from(
        config
            .settings
            .data_dir
            .clone()
            .unwrap_or(DEFAULT_DATA_DIR.to_owned()),
    );
    create_dir_all(&data_path).await?;
    println!("Results created in folder: {}", data_path.display());

    let config_copy = data_path.join("config.yaml");
    // re-runs may point at the copy itself
    if canonicalize(&config_file).await.ok() != canonicalize(&config_copy).await.ok() {
        copy(&config_file, &config_copy).await?;
    }

    let mut run_info = HashMap::new();
    for experiment in config.benches {
        let bench_args = get_bench_args(&config.bench_args, &*experiment.bench);
        let bench_name = experiment.bench.name();
        debug!(
            "experiment={} subjects={:?}",
            experiment.name,
            experiment.bench.subjects()
        );

        let progress = if no_progress {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        progress.set_message(format!("Running {}", experiment.name));
        progress.enable_steady_tick(Duration::from_millis(120));

        let bench = experiment.bench;
        let settings = config.settings.clone();
        let reports = spawn_blocking(move || bench.run(&settings, &*bench_args)).await??;
        progress.finish_and_clear();

        let recorded_at = Local::now();
        for report in &reports {
            run_info.insert(
                report.subject.clone(),
                SubjectInfo {
                    bench: bench_name.to_owned(),
                    labels: [
                        report.series[0].label.clone(),
                        report.series[1].label.clone(),
                    ],
                    points: report.amounts.len(),
                    recorded_at,
                },
            );
        }

        let writes = reports.iter().map(|report| report::save(&data_path, report));
        for saved in join_all(writes).await {
            debug!("Wrote {}", saved?.display());
        }
        write(
            data_path.join("info.json"),
            serde_json::to_string(&run_info)?,
        )
        .await?;

        if !skip_plot {
            common::plot::plot(&experiment.plots, &data_path, &config.settings).await?;
        }
    }

    debug!("Exiting");
    Ok(())
}

fn get_bench_args(bench_args: &[Box<dyn BenchArgs>], bench: &dyn Bench) -> Box<dyn BenchArgs> {
    for args in bench_args {
        if args.name() == bench.name() {
            return args.clone();
        }
    }
    bench.default_bench_args()
}
