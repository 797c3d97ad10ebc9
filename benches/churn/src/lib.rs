use common::{
    bench::{Bench, BenchArgs},
    config::Settings,
    report::{Series, SeriesReport},
    util::time_micros,
};
use eyre::{ContextCompat, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;


pub use strategy::{BuddyHeap, Strategy, SystemHeap};

/// Sample points per workload; point `i` runs at scale `i + 1`.
pub const DEFAULT_POINTS: usize = 10;

/// Allocator churn bench: times every workload against the system heap and
/// the buddy arena, one report per workload.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Churn {
    pub points: Option<usize>,
    pub workloads: Option<Vec<Workload>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChurnConfig {
    /// Buddy arena capacity in bytes, rounded up to a power of two
    pub arena_bytes: Option<usize>,
}

#[typetag::serde]
impl BenchArgs for ChurnConfig {
    fn name(&self) -> &'static str {
        "churn"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    /// Allocate, touch and free one integer, 10000 * n times
    IntegerChurn,
    /// Allocate, touch and free a 1000 integer block, 100000 * n times
    BlockChurn,
    /// Allocate one 5000 * n integer array, fill a prefix, free it
    LargeArrays,
}

impl Workload {
    pub const ALL: [Workload; 3] = [
        Workload::IntegerChurn,
        Workload::BlockChurn,
        Workload::LargeArrays,
    ];

    pub fn subject(&self) -> &'static str {
        match self {
            Workload::IntegerChurn => "integer_churn",
            Workload::BlockChurn => "block_churn",
            Workload::LargeArrays => "large_arrays",
        }
    }

    /// Runs the workload at scale `n`, returning the amount of work done.
    fn run<S: Strategy>(&self, heap: &mut S, n: usize) -> Result<u64> {
        match self {
            Workload::IntegerChurn => {
                let iterations = 10_000 * n;
                for i in 0..iterations {
                    let mut a = heap.alloc_ints(1)?;
                    heap.store(&mut a, 0, i as u32);
                    heap.release(a);
                }
                Ok(iterations as u64)
            }
            Workload::BlockChurn => {
                let iterations = 100_000 * n;
                for i in 0..iterations {
                    let mut a = heap.alloc_ints(1000)?;
                    heap.store(&mut a, 0, i as u32);
                    heap.release(a);
                }
                Ok(iterations as u64)
            }
            Workload::LargeArrays => {
                let ints = 5000 * n;
                let mut a = heap.alloc_ints(ints)?;
                // the touched prefix stays fixed as the array grows with n
                for i in 0..5000 {
                    heap.store(&mut a, i, i as u32);
                }
                heap.release(a);
                Ok(ints as u64)
            }
        }
    }
}

#[typetag::serde]
impl Bench for Churn {
    fn name(&self) -> &'static str {
        "churn"
    }

    fn default_bench_args(&self) -> Box<dyn BenchArgs> {
        Box::new(ChurnConfig::default())
    }

    fn subjects(&self) -> Vec<String> {
        self.selected()
            .iter()
            .map(|workload| workload.subject().to_owned())
            .collect()
    }

    fn run(&self, _settings: &Settings, bench_args: &dyn BenchArgs) -> Result<Vec<SeriesReport>> {
        let bench_args = bench_args
            .downcast_ref::<ChurnConfig>()
            .context("Invalid bench args, expected args for churn")?;
        let points = self.points.unwrap_or(DEFAULT_POINTS);
        self.selected()
            .into_iter()
            .map(|workload| measure(workload, points, bench_args))
            .collect()
    }
}

impl Churn {
    fn selected(&self) -> Vec<Workload> {
        self.workloads
            .clone()
            .unwrap_or_else(|| Workload::ALL.to_vec())
    }
}

/// Times one workload over both backends at every sample point.
///
/// The amounts come from the system heap run; both backends do identical
/// work, so the buddy run would report the same values.
fn measure(workload: Workload, points: usize, args: &ChurnConfig) -> Result<SeriesReport> {
    let mut system = SystemHeap;
    let mut buddy = args
        .arena_bytes
        .map_or_else(BuddyHeap::new, BuddyHeap::with_arena);

    let mut amounts = Vec::with_capacity(points);
    let mut system_times = Vec::with_capacity(points);
    let mut buddy_times = Vec::with_capacity(points);
    for i in 0..points {
        let n = i + 1;
        let (amount, micros) = time_micros(|| workload.run(&mut system, n));
        amounts.push(amount? as i64);
        system_times.push(micros as i64);
        let (outcome, micros) = time_micros(|| workload.run(&mut buddy, n));
        outcome?;
        buddy_times.push(micros as i64);
        debug!(
            "{} n={n} system={}us buddy={}us",
            workload.subject(),
            system_times[i],
            buddy_times[i],
        );
    }

    Ok(SeriesReport {
        subject: workload.subject().to_owned(),
        amounts,
        series: [
            Series {
                label: system.label().to_owned(),
                values: system_times,
            },
            Series {
                label: buddy.label().to_owned(),
                values: buddy_times,
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct OtherArgs;

    #[typetag::serde]
    impl BenchArgs for OtherArgs {
        fn name(&self) -> &'static str {
            "other"
        }
    }

    fn small_args() -> ChurnConfig {
        ChurnConfig {
            arena_bytes: Some(1 << 22),
        }
    }

    #[test]
    fn runs_every_workload_in_order() {
        let churn = Churn {
            points: Some(1),
            workloads: None,
        };
        let reports = churn.run(&Settings::default(), &small_args()).unwrap();
        let subjects: Vec<_> = reports.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, ["integer_churn", "block_churn", "large_arrays"]);
    }

    #[test]
    fn reports_carry_both_series() {
        let churn = Churn {
            points: Some(2),
            workloads: Some(vec![Workload::IntegerChurn]),
        };
        let reports = churn.run(&Settings::default(), &small_args()).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.amounts, vec![10_000, 20_000]);
        assert_eq!(report.series[0].label, "system");
        assert_eq!(report.series[1].label, "buddy");
        assert_eq!(report.series[0].values.len(), 2);
        assert_eq!(report.series[1].values.len(), 2);
    }

    #[test]
    fn amounts_scale_linearly() {
        let churn = Churn {
            points: Some(3),
            workloads: Some(vec![Workload::LargeArrays]),
        };
        let reports = churn.run(&Settings::default(), &small_args()).unwrap();
        assert_eq!(reports[0].amounts, vec![5000, 10_000, 15_000]);
    }

    #[test]
    fn subjects_follow_the_selection() {
        let churn = Churn {
            points: None,
            workloads: Some(vec![Workload::LargeArrays, Workload::IntegerChurn]),
        };
        assert_eq!(churn.subjects(), ["large_arrays", "integer_churn"]);
    }

    #[test]
    fn mismatched_args_are_rejected() {
        let churn = Churn::default();
        assert!(churn.run(&Settings::default(), &OtherArgs).is_err());
    }

    #[test]
    fn arena_too_small_for_a_workload_errors() {
        let churn = Churn {
            points: Some(1),
            workloads: Some(vec![Workload::LargeArrays]),
        };
        let args = ChurnConfig {
            arena_bytes: Some(1 << 10),
        };
        assert!(churn.run(&Settings::default(), &args).is_err());
    }
}
