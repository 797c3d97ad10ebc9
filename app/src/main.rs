use std::{collections::HashMap, path::PathBuf};

use clap::{Parser, Subcommand};
use common::{
    DEFAULT_DATA_DIR,
    bench::SubjectInfo,
    config::{Config, Settings},
    report::subject_for,
};
use console::style;
use eyre::Result;
use tokio::fs::read_to_string;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod bench;

/// Workspace crates whose tracing output follows the default log level.
const LOG_MODULES: &[&str] = &["common", "churn", "churn_basic", "buddy"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded benchmark subjects
    Ls {
        /// Benchmark folder
        #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
        folder: String,
    },
    /// Run the configured benchmarks
    Bench {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        /// Do not generate charts
        #[arg(long, default_value_t = false)]
        skip_plot: bool,
    },
    /// Generate charts for recorded benchmarks
    Plot {
        /// Benchmark folder
        #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
        folder: String,
    },
    /// Print the subjects each configured bench would produce
    Print {
        /// Folder holding config.yaml
        #[arg(short, long, default_value = ".")]
        folder: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("alloc_benchmark={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in LOG_MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    register_plugins();

    match args.command {
        Commands::Ls { folder } => list_subjects(&folder).await?,
        Commands::Bench {
            config_file,
            skip_plot,
        } => {
            if let Err(err) = bench::run_benchmark(config_file, args.no_progress, skip_plot).await {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Plot { folder } => plot(&folder).await?,
        Commands::Print { folder } => print_subjects(&folder).await?,
    };

    Ok(())
}

// hack to keep the plugin crates linked so their typetag registrations exist
fn register_plugins() {
    _ = serde_json::to_string(&churn::Churn::default());
    _ = serde_json::to_string(&churn::ChurnConfig::default());
    _ = serde_json::to_string(&churn_basic::ChurnBasic);
}

async fn list_subjects(folder: &str) -> Result<()> {
    let base_path = PathBuf::from(folder);
    let info_path = base_path.join("info.json");
    if info_path.exists() {
        let info: HashMap<String, SubjectInfo> =
            serde_json::from_str(&read_to_string(info_path).await?)?;
        let mut subjects = info.into_iter().collect::<Vec<_>>();
        subjects.sort_by(|a, b| a.0.cmp(&b.0));
        for (subject, info) in subjects {
            println!(
                "{} -> {} @ {}",
                style(subject).bold(),
                info.bench,
                info.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            );
        }
        return Ok(());
    }

    // no run metadata, fall back to the report files themselves
    for path in common::report::scan(&base_path).await? {
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            println!("{} -> {name}", style(subject_for(name)).bold());
        }
    }
    Ok(())
}

async fn plot(folder: &str) -> Result<()> {
    let base_path = PathBuf::from(folder);
    let config_file = base_path.join("config.yaml");
    if config_file.exists() {
        let config: Config = serde_yml::from_str(&read_to_string(config_file).await?)?;
        for experiment in &config.benches {
            common::plot::plot(&experiment.plots, &base_path, &config.settings).await?;
        }
        return Ok(());
    }

    // bare report folder without a config, run the default chart pass
    let plots: Option<Vec<Box<dyn common::plot::Plot>>> =
        Some(vec![Box::new(churn_basic::ChurnBasic)]);
    common::plot::plot(&plots, &base_path, &Settings::default()).await
}

async fn print_subjects(folder: &str) -> Result<()> {
    let base_path = PathBuf::from(folder);
    let config: Config =
        serde_yml::from_str(&read_to_string(base_path.join("config.yaml")).await?)?;

    for experiment in &config.benches {
        println!("{}: {:?}", experiment.name, experiment.bench.subjects());
    }
    Ok(())
}
