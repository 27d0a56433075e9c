//! Semicolon-delimited record log written at the end of a run.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::evolve::Species;
use crate::runner::RunReport;

pub const RECORD_HEADER: &str = "Generation;Species;Chromosome;Performance;Live Time;Survivors";

pub const ALL_TRIALS_FILE: &str = "trials.csv";
pub const BEST_TRIALS_FILE: &str = "best_per_generation.csv";

/// One header line, then one line per species.
pub fn write_records<'a, W: Write>(mut out: W, records: impl IntoIterator<Item = &'a Species>) -> io::Result<()> {
    writeln!(out, "{RECORD_HEADER}")?;
    for s in records {
        writeln!(
            out,
            "{};{};{};{};{};{}",
            s.generation, s.id, s.genome, s.performance, s.live_time, s.survivors
        )?;
    }
    out.flush()
}

/// Write both logs of a run into `dir`, creating it if needed. Returns the
/// paths written: every trial first, then each generation's best.
pub fn write_run(dir: &Path, report: &RunReport) -> io::Result<[PathBuf; 2]> {
    fs::create_dir_all(dir)?;
    let all = dir.join(ALL_TRIALS_FILE);
    let best = dir.join(BEST_TRIALS_FILE);
    write_records(BufWriter::new(File::create(&all)?), &report.history)?;
    write_records(BufWriter::new(File::create(&best)?), &report.best_per_generation)?;
    Ok([all, best])
}
