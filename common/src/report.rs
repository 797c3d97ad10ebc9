use std::{
    num::ParseIntError,
    path::{Path, PathBuf},
};

use eyre::{Context, ContextCompat, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{read_dir, read_to_string, write};

/// Suffix a file must carry to be picked up as a report.
pub const REPORT_SUFFIX: &str = ".txt";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("missing {0} line")]
    MissingLine(&'static str),
    #[error("missing label on {0} line")]
    MissingLabel(&'static str),
    #[error("invalid sample {token:?} on {line} line: {source}")]
    BadSample {
        line: &'static str,
        token: String,
        source: ParseIntError,
    },
}

/// One labelled line of samples.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<i64>,
}

/// One report: the workload sizes and two timing series measured over them.
///
/// On disk this is three whitespace separated lines. The first holds the
/// amounts behind a throwaway label, the next two hold one series each
/// behind its label:
///
/// ```text
/// amount 10000 20000 30000
/// system 521423 634721 782401
/// buddy 912834 1023411 1154329
/// ```
///
/// Series lengths are not validated against the amounts; consumers pair
/// values positionally and ignore the overhang.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesReport {
    pub subject: String,
    pub amounts: Vec<i64>,
    pub series: [Series; 2],
}

/// Subject of a report file: everything before the first `.` in its name.
pub fn subject_for(file_name: &str) -> &str {
    file_name.split_once('.').map_or(file_name, |(subject, _)| subject)
}

/// Display form of an amount in thousands, e.g. 12345 -> "12k".
pub fn thousands_label(amount: i64) -> String {
    format!("{}k", amount.div_euclid(1000))
}

/// Display form of a microsecond count in milliseconds, e.g. 12345 -> "12ms".
pub fn millis_label(micros: i64) -> String {
    format!("{}ms", micros.div_euclid(1000))
}

/// Parses the three-line report format.
///
/// Lines beyond the third are ignored. The first token of the amount line is
/// discarded, the first token of each series line becomes its label.
pub fn parse(subject: &str, text: &str) -> Result<SeriesReport, ReportError> {
    let mut lines = text.lines();
    let mut line = |name| lines.next().ok_or(ReportError::MissingLine(name));

    let (_, amounts) = samples(line("amount")?, "amount")?;
    let (label, values) = samples(line("first series")?, "first series")?;
    let first = Series { label, values };
    let (label, values) = samples(line("second series")?, "second series")?;
    let second = Series { label, values };

    Ok(SeriesReport {
        subject: subject.to_owned(),
        amounts,
        series: [first, second],
    })
}

fn samples(line: &str, name: &'static str) -> Result<(String, Vec<i64>), ReportError> {
    let mut tokens = line.split_whitespace();
    let label = tokens.next().ok_or(ReportError::MissingLabel(name))?;
    let values = tokens
        .map(|token| {
            token.parse::<i64>().map_err(|source| ReportError::BadSample {
                line: name,
                token: token.to_owned(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((label.to_owned(), values))
}

/// Serializes a report into the three-line on-disk format.
pub fn render(report: &SeriesReport) -> String {
    let line = |label: &str, values: &[i64]| {
        if values.is_empty() {
            label.to_owned()
        } else {
            format!("{label} {}", values.iter().join(" "))
        }
    };
    format!(
        "{}\n{}\n{}\n",
        line("amount", &report.amounts),
        line(&report.series[0].label, &report.series[0].values),
        line(&report.series[1].label, &report.series[1].values),
    )
}

/// Reads and parses the report at `path`, deriving the subject from the file
/// name.
pub async fn load(path: &Path) -> Result<SeriesReport> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context(format!("Invalid report path {}", path.display()))?;
    let text = read_to_string(path)
        .await
        .context(format!("Read report {}", path.display()))?;
    let report = parse(subject_for(file_name), &text)
        .context(format!("Parse report {}", path.display()))?;
    Ok(report)
}

/// Writes `report` to `<dir>/<subject>.txt`, returning the path written.
pub async fn save(dir: &Path, report: &SeriesReport) -> Result<PathBuf> {
    let path = dir.join(format!("{}{REPORT_SUFFIX}", report.subject));
    write(&path, render(report))
        .await
        .context(format!("Write report {}", path.display()))?;
    Ok(path)
}

/// Paths of the report files under `dir`, in directory enumeration order.
pub async fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = read_dir(dir)
        .await
        .context(format!("Scan {}", dir.display()))?;
    let mut reports = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().ends_with(REPORT_SUFFIX) {
            reports.push(entry.path());
        }
    }
    Ok(reports)
}
