use serde::{Deserialize, Serialize};

use crate::{
    bench::{Bench, BenchArgs},
    plot::Plot,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub settings: Settings,
    pub benches: Vec<InnerBench>,
    pub bench_args: Vec<Box<dyn BenchArgs>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory reports and charts land in, [`crate::DEFAULT_DATA_DIR`] when unset
    pub data_dir: Option<String>,
    /// Chart dimensions in pixels as (width, height)
    pub chart_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnerBench {
    pub name: String,
    pub bench: Box<dyn Bench>,
    pub plots: Option<Vec<Box<dyn Plot>>>,
}
