use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while extracting one input object.
#[derive(Debug, Error)]
pub enum Error {
    #[error("archive {path:?} holds {entries} entries, expected exactly one")]
    MultiEntryArchive { path: PathBuf, entries: usize },
    #[error("archive {path:?} is corrupt: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },
    #[error("extracting {archive:?} would overwrite existing {target:?}")]
    ExtractionTargetExists { archive: PathBuf, target: PathBuf },
    #[error("could not split {path:?}: {source}")]
    SplitFailure { path: PathBuf, source: io::Error },
    #[error("fragment {fragment:?} line {line}: {reason}")]
    FragmentParseFailure {
        fragment: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("nothing extracted from {path:?}: {reason}")]
    EmptyExtraction { path: PathBuf, reason: String },
    #[error("input path {0:?} not valid or not found")]
    InvalidInputPath(PathBuf),
    #[error("polygon region error: {0}")]
    Region(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("could not build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("could not write {path:?}: {source}")]
    Output { path: PathBuf, source: csv::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
}
