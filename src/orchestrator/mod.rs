use crate::aggregate::aggregate;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geojson::{polygon_stem, read_region};
use crate::intake::{intake, Intake};
use crate::pool::Dispatcher;
use crate::region::Region;
use crate::schema::Schema;
use crate::splitter::split_file;
use crate::writer::write_run_result;
use std::fmt;
use std::fs::{read_dir, remove_file};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Intaking,
    Splitting,
    Filtering,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Intaking => "intaking",
            Stage::Splitting => "splitting",
            Stage::Filtering => "filtering",
            Stage::Aggregating => "aggregating",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} failed for {path:?}: {error}")]
pub struct RunFailure {
    pub path: PathBuf,
    /// Last stage entered before the failure.
    pub stage: Stage,
    pub error: Error,
}

#[derive(Debug)]
pub struct RunSummary {
    pub source: PathBuf,
    pub output: PathBuf,
    pub fragments: usize,
    pub failed_fragments: usize,
    pub rows: usize,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<RunSummary>,
    pub failures: Vec<RunFailure>,
}

impl BatchReport {
    /// False when an object failed or a completed run lost fragments.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self
                .completed
                .iter()
                .all(|summary| summary.failed_fragments == 0)
    }

    pub fn failed_fragments(&self) -> usize {
        self.completed
            .iter()
            .map(|summary| summary.failed_fragments)
            .sum()
    }

    fn record(&mut self, outcome: std::result::Result<RunSummary, RunFailure>) {
        match outcome {
            Ok(summary) => self.completed.push(summary),
            Err(failure) => self.failures.push(failure),
        }
    }
}

struct Run<'a> {
    path: &'a Path,
    stage: Stage,
}

impl<'a> Run<'a> {
    fn new(path: &'a Path) -> Self {
        Run {
            path,
            stage: Stage::Idle,
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(object = ?self.path, from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    fn fail(&mut self, error: Error) -> RunFailure {
        let failure = RunFailure {
            path: self.path.to_path_buf(),
            stage: self.stage,
            error,
        };
        self.advance(Stage::Failed);
        error!(object = ?self.path, stage = %failure.stage, error = %failure.error, "run failed");
        failure
    }
}

fn is_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    children.sort();
    Ok(children)
}

/// Runs intake, split, filter and aggregation for input objects.
pub struct Extractor {
    config: Config,
    schema: Schema,
    region: Region,
    polygon_stem: String,
    dispatcher: Dispatcher,
}

impl Extractor {
    pub fn new(config: Config, region: Region, polygon_stem: String) -> Result<Self> {
        let schema = config.schema()?;
        let dispatcher = Dispatcher::new(config.worker_count())?;
        info!(workers = dispatcher.workers(), "worker pool ready");
        Ok(Extractor {
            config,
            schema,
            region,
            polygon_stem,
            dispatcher,
        })
    }

    pub fn from_polygon_file(config: Config, polygon_path: &Path) -> Result<Self> {
        let region = read_region(polygon_path)?;
        info!(polygon = ?polygon_path, parts = region.parts(), "polygon region loaded");
        Self::new(config, region, polygon_stem(polygon_path))
    }

    pub fn run(&self, source: &Path) -> std::result::Result<RunSummary, RunFailure> {
        let start = Instant::now();
        let mut run = Run::new(source);
        let outcome = self.run_stages(&mut run);
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(summary) => info!(
                object = ?source,
                output = ?summary.output,
                rows = summary.rows,
                elapsed_ms,
                "extraction done"
            ),
            Err(_) => info!(object = ?source, elapsed_ms, "extraction aborted"),
        }
        outcome
    }

    fn run_stages(&self, run: &mut Run) -> std::result::Result<RunSummary, RunFailure> {
        let source = run.path;
        run.advance(Stage::Intaking);
        let payload = intake(source).map_err(|e| run.fail(e))?;
        let outcome = self.process(run, payload.path());
        if let Intake::Extracted(path) = &payload {
            if let Err(e) = remove_file(path) {
                warn!(file = ?path, error = %e, "could not delete extracted file");
            }
        }
        outcome
    }

    fn process(&self, run: &mut Run, data_file: &Path) -> std::result::Result<RunSummary, RunFailure> {
        let source = run.path;
        if !is_data_file(data_file) {
            return Err(run.fail(Error::EmptyExtraction {
                path: source.to_path_buf(),
                reason: "not a csv or txt data file".into(),
            }));
        }
        info!(file = ?data_file, "processing file");

        run.advance(Stage::Splitting);
        let scratch_dir = &self.config.scratch_dir;
        let fragments =
            split_file(data_file, self.config.chunk_size, scratch_dir).map_err(|e| run.fail(e))?;

        run.advance(Stage::Filtering);
        let dispatch = self
            .dispatcher
            .dispatch(&fragments, scratch_dir, &self.region, &self.schema);
        for failure in &dispatch.failures {
            error!(fragment = ?failure.fragment, error = %failure.error, "fragment failed");
        }
        let failed_fragments = dispatch.failures.len();
        if failed_fragments > 0 {
            warn!(
                object = ?source,
                failed_fragments,
                "rows of failed fragments are missing from the output"
            );
        }
        if self.config.strict {
            if let Some(failure) = dispatch.failures.into_iter().next() {
                return Err(run.fail(failure.error));
            }
        }

        run.advance(Stage::Aggregating);
        let run_result = aggregate(dispatch.results, source).map_err(|e| run.fail(e))?;
        let output = write_run_result(
            &run_result,
            &self.schema,
            &self.config.output_dir,
            &self.polygon_stem,
        )
        .map_err(|e| run.fail(e))?;

        run.advance(Stage::Done);
        Ok(RunSummary {
            source: source.to_path_buf(),
            output,
            fragments: fragments.len(),
            failed_fragments,
            rows: run_result.records.len(),
        })
    }

    /// Multi-day mode: every file directly under `dir`, and every file of
    /// each per-day sub directory, is one object. Failures are recorded and
    /// the batch moves on.
    pub fn run_batch(&self, dir: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let objects = sorted_children(dir)?;
        if objects.is_empty() {
            report.record(Err(Run::new(dir).fail(Error::EmptyExtraction {
                path: dir.to_path_buf(),
                reason: "input directory is empty".into(),
            })));
        }
        for object in objects {
            if object.is_dir() {
                let files: Vec<PathBuf> = sorted_children(&object)?
                    .into_iter()
                    .filter(|file| file.is_file())
                    .collect();
                if files.is_empty() {
                    report.record(Err(Run::new(&object).fail(Error::EmptyExtraction {
                        path: object.clone(),
                        reason: "day directory holds no files".into(),
                    })));
                }
                for file in &files {
                    report.record(self.run(file));
                }
            } else if object.is_file() {
                report.record(self.run(&object));
            }
        }
        info!(
            completed = report.completed.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Single object or, with `multiple`, a directory of daily objects.
    pub fn extract(&self, input: &Path, multiple: bool) -> Result<BatchReport> {
        if !input.exists() {
            return Err(Error::InvalidInputPath(input.to_path_buf()));
        }
        if multiple {
            return self.run_batch(input);
        }
        let mut report = BatchReport::default();
        report.record(self.run(input));
        Ok(report)
    }
}
