use crate::error::{Error, Result};
use crate::filter::FilteredResult;
use crate::record::Record;
use std::path::Path;

/// All matching rows of one source file.
#[derive(Debug)]
pub struct RunResult {
    pub output_id: String,
    pub records: Vec<Record>,
}

/// First four underscore separated tokens of the source file stem, so
/// `fcd_bologna_2019_03_01_all.zip` becomes `fcd_bologna_2019_03`.
pub fn output_id(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    stem.split('_').take(4).collect::<Vec<_>>().join("_")
}

/// Concatenates fragment results in arrival order.
pub fn aggregate(results: Vec<FilteredResult>, source: &Path) -> Result<RunResult> {
    if results.is_empty() {
        return Err(Error::EmptyExtraction {
            path: source.to_path_buf(),
            reason: "no fragment produced a result, check data files".into(),
        });
    }
    let total = results.iter().map(|result| result.records.len()).sum();
    let mut records = Vec::with_capacity(total);
    for result in results {
        records.extend(result.records);
    }
    Ok(RunResult {
        output_id: output_id(source),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::schema::Value;
    use std::path::PathBuf;

    fn result(n: usize) -> FilteredResult {
        let records = (0..n)
            .map(|i| Record {
                values: vec![Value::Integer(i as i64)],
                location: Location::new(1.0, 1.0).unwrap(),
            })
            .collect();
        FilteredResult {
            fragment: PathBuf::from(format!("split{:02}", n)),
            records,
        }
    }

    #[test]
    fn sums_fragment_counts() {
        let results = vec![result(3), result(0), result(5), result(1)];
        let run = aggregate(results, Path::new("fcd_a_b_c_d.csv")).unwrap();
        assert_eq!(run.records.len(), 9);
    }

    #[test]
    fn empty_job_list_fails() {
        let err = aggregate(vec![], Path::new("fcd.csv")).unwrap_err();
        assert!(matches!(err, Error::EmptyExtraction { .. }));
    }

    #[test]
    fn derives_output_id() {
        assert_eq!(output_id(Path::new("/in/fcd_bo_2019_03_01_all.zip")), "fcd_bo_2019_03");
        assert_eq!(output_id(Path::new("fcd_2019.csv")), "fcd_2019");
        assert_eq!(output_id(Path::new("plain.txt")), "plain");
    }
}
