//! Fan-out/fan-in of fragments over a fixed-size rayon pool.
//!
//! `dispatch` is a barrier: it returns once every fragment has produced a
//! result or a failure, so all filtered rows of one source file are held in
//! memory at the same time. That is the memory ceiling of a run; lower
//! `chunk_size` or the worker count when matches are dense.

use crate::error::{Error, Result};
use crate::filter::{filter_fragment, FilteredResult};
use crate::region::Region;
use crate::schema::Schema;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs::{remove_dir_all, remove_file};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct FragmentFailure {
    pub fragment: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct Dispatch {
    pub results: Vec<FilteredResult>,
    pub failures: Vec<FragmentFailure>,
}

pub struct Dispatcher {
    pool: ThreadPool,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|idx| format!("fcd-worker-{}", idx))
            .build()?;
        Ok(Dispatcher { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Filters every fragment, deleting each one once it is processed and
    /// `scratch_dir` after all of them, whatever the outcome. A failing
    /// fragment never cancels its siblings.
    pub fn dispatch(
        &self,
        fragments: &[PathBuf],
        scratch_dir: &Path,
        region: &Region,
        schema: &Schema,
    ) -> Dispatch {
        let outcomes: Vec<Result<FilteredResult>> = self.pool.install(|| {
            fragments
                .par_iter()
                .map(|fragment| {
                    let outcome = filter_fragment(fragment, region, schema);
                    if let Err(e) = remove_file(fragment) {
                        warn!(fragment = ?fragment, error = %e, "could not delete fragment");
                    }
                    outcome
                })
                .collect()
        });
        if scratch_dir.exists() {
            if let Err(e) = remove_dir_all(scratch_dir) {
                warn!(scratch_dir = ?scratch_dir, error = %e, "could not remove scratch dir");
            }
        }

        let mut dispatch = Dispatch::default();
        for (fragment, outcome) in fragments.iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    debug!(fragment = ?fragment, matches = result.records.len(), "fragment filtered");
                    dispatch.results.push(result);
                }
                Err(error) => dispatch.failures.push(FragmentFailure {
                    fragment: fragment.clone(),
                    error,
                }),
            }
        }
        dispatch
    }
}
