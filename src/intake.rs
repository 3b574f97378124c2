use crate::error::{Error, Result};
use std::fs::{remove_file, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Payload produced by intake.
#[derive(Debug, Clone, PartialEq)]
pub enum Intake {
    /// The input was not an archive and is used as is.
    Plain(PathBuf),
    /// The single archive entry, written next to the archive.
    Extracted(PathBuf),
}

impl Intake {
    pub fn path(&self) -> &Path {
        match self {
            Intake::Plain(path) | Intake::Extracted(path) => path,
        }
    }
}

fn corrupt(path: &Path, reason: impl ToString) -> Error {
    Error::CorruptArchive {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Extracts the only entry of a zip archive to `<archive-stem>.csv` in the
/// archive's directory. An existing file of that name is never overwritten.
/// Non-archives pass through untouched.
pub fn intake(path: &Path) -> Result<Intake> {
    if !is_archive(path) {
        return Ok(Intake::Plain(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| match e {
        ZipError::Io(e) if e.kind() != io::ErrorKind::UnexpectedEof => Error::Io(e),
        e => corrupt(path, e),
    })?;
    if archive.len() == 0 {
        return Err(corrupt(path, "archive has no entries"));
    }
    if archive.len() > 1 {
        return Err(Error::MultiEntryArchive {
            path: path.to_path_buf(),
            entries: archive.len(),
        });
    }

    let stem = path
        .file_stem()
        .ok_or_else(|| corrupt(path, "archive has no file stem"))?;
    let mut name = stem.to_os_string();
    name.push(".csv");
    let target = path.parent().unwrap_or_else(|| Path::new("")).join(name);

    let mut entry = archive.by_index(0).map_err(|e| corrupt(path, e))?;
    if entry.is_dir() {
        return Err(corrupt(path, "only entry is a directory"));
    }
    debug!(archive = ?path, entry = entry.name(), target = ?target, "extracting");
    let mut out = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::ExtractionTargetExists {
                archive: path.to_path_buf(),
                target: target.clone(),
            },
            _ => Error::Io(e),
        })?;
    if let Err(e) = io::copy(&mut entry, &mut out) {
        drop(out);
        let _ = remove_file(&target);
        return Err(corrupt(path, e));
    }
    Ok(Intake::Extracted(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{read_dir, read_to_string, write};
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("fcd_2019_03_01_all.zip");
        build_zip(&archive, &[("export.txt", "1,53.0,8.0\n")]);

        let intake = intake(&archive).unwrap();
        let expected = dir.path().join("fcd_2019_03_01_all.csv");
        assert_eq!(intake, Intake::Extracted(expected.clone()));
        assert_eq!(read_to_string(expected).unwrap(), "1,53.0,8.0\n");
        assert!(archive.exists());
    }

    #[test]
    fn refuses_multi_entry_archives() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("day.zip");
        build_zip(&archive, &[("a.csv", "1\n"), ("b.csv", "2\n")]);

        let result = intake(&archive);
        assert!(matches!(
            result,
            Err(Error::MultiEntryArchive { entries: 2, .. })
        ));
        let names: Vec<String> = read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["day.zip"]);
    }

    #[test]
    fn empty_archive_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("empty.zip");
        build_zip(&archive, &[]);
        assert!(matches!(intake(&archive), Err(Error::CorruptArchive { .. })));
        assert!(!dir.path().join("empty.csv").exists());
    }

    #[test]
    fn keeps_existing_file_with_target_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("day.zip");
        let existing = dir.path().join("day.csv");
        build_zip(&archive, &[("export.txt", "from archive\n")]);
        write(&existing, "user data\n").unwrap();

        let result = intake(&archive);
        assert!(matches!(result, Err(Error::ExtractionTargetExists { .. })));
        assert_eq!(read_to_string(existing).unwrap(), "user data\n");
    }

    #[test]
    fn reports_corrupt_archives() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        write(&archive, b"definitely not a zip file").unwrap();
        assert!(matches!(intake(&archive), Err(Error::CorruptArchive { .. })));
    }

    #[test]
    fn passes_plain_files_through() {
        let path = Path::new("/data/fcd_2019_03_01.csv");
        assert_eq!(intake(path).unwrap(), Intake::Plain(path.to_path_buf()));
    }
}
