use core::fmt::Debug;

use chrono::{DateTime, Local};
use downcast_rs::{Downcast, impl_downcast};
use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::{config::Settings, report::SeriesReport};

/// Metadata recorded in info.json for every subject a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub bench: String,
    pub labels: [String; 2],
    pub points: usize,
    pub recorded_at: DateTime<Local>,
}

#[typetag::serde(tag = "type")]
pub trait Bench: Debug + DynClone + Downcast + Send + Sync {
    /// The name of the bench, matched against [`BenchArgs::name`]
    fn name(&self) -> &'static str;
    /// Args used when the config does not carry any for this bench
    fn default_bench_args(&self) -> Box<dyn BenchArgs>;
    /// The subjects this bench produces, in run order
    fn subjects(&self) -> Vec<String>;
    /// Runs every workload, producing one report per subject.
    ///
    /// Blocks until all timing loops finish; async callers should wrap this
    /// in [`tokio::task::spawn_blocking`].
    fn run(&self, settings: &Settings, bench_args: &dyn BenchArgs) -> Result<Vec<SeriesReport>>;
}
clone_trait_object!(Bench);
impl_downcast!(Bench);

#[typetag::serde(tag = "type")]
pub trait BenchArgs: Debug + DynClone + Downcast + Send + Sync {
    fn name(&self) -> &'static str;
}
clone_trait_object!(BenchArgs);
impl_downcast!(BenchArgs);
