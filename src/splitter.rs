use crate::error::{Error, Result};
use std::fs::{create_dir_all, remove_dir_all, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

fn fragment_path(scratch_dir: &Path, index: usize) -> PathBuf {
    scratch_dir.join(format!("split{:02}", index))
}

/// Recreates `scratch_dir` and writes `source` into it as fragment files of
/// at most `chunk_size` lines each. Line bytes are copied unchanged.
pub fn split_file(source: &Path, chunk_size: usize, scratch_dir: &Path) -> Result<Vec<PathBuf>> {
    let fail = |e: io::Error, path: &Path| Error::SplitFailure {
        path: path.to_path_buf(),
        source: e,
    };
    if chunk_size == 0 {
        let e = io::Error::new(io::ErrorKind::InvalidInput, "chunk size must be positive");
        return Err(fail(e, source));
    }
    if scratch_dir.exists() {
        remove_dir_all(scratch_dir).map_err(|e| fail(e, scratch_dir))?;
    }
    create_dir_all(scratch_dir).map_err(|e| fail(e, scratch_dir))?;

    let file = File::open(source).map_err(|e| fail(e, source))?;
    let mut reader = BufReader::new(file);
    let mut fragments = Vec::new();
    let mut writer: Option<BufWriter<File>> = None;
    let mut lines_in_fragment = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| fail(e, source))?;
        if read == 0 {
            break;
        }
        if writer.is_none() {
            let path = fragment_path(scratch_dir, fragments.len());
            let file = File::create(&path).map_err(|e| fail(e, &path))?;
            writer = Some(BufWriter::new(file));
            fragments.push(path);
        }
        if let Some(out) = writer.as_mut() {
            out.write_all(&line).map_err(|e| fail(e, source))?;
        }
        lines_in_fragment += 1;
        if lines_in_fragment == chunk_size {
            if let Some(mut out) = writer.take() {
                out.flush().map_err(|e| fail(e, source))?;
            }
            lines_in_fragment = 0;
        }
    }
    if let Some(mut out) = writer.take() {
        out.flush().map_err(|e| fail(e, source))?;
    }

    debug!(source = ?source, fragments = fragments.len(), chunk_size, "file split");
    Ok(fragments)
}
