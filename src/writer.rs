use crate::aggregate::RunResult;
use crate::error::{Error, Result};
use crate::schema::Schema;
use csv::WriterBuilder;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

pub fn output_path(output_dir: &Path, output_id: &str, polygon_stem: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.csv", output_id, polygon_stem))
}

/// Writes the schema columns plus a WKT `geometry` column. Returns the path
/// of the written file.
pub fn write_run_result(
    run: &RunResult,
    schema: &Schema,
    output_dir: &Path,
    polygon_stem: &str,
) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let path = output_path(output_dir, &run.output_id, polygon_stem);
    let output_err = |source: csv::Error| Error::Output {
        path: path.clone(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(schema.delimiter)
        .from_path(&path)
        .map_err(output_err)?;

    let mut header: Vec<&str> = schema.names().collect();
    header.push("geometry");
    writer.write_record(&header).map_err(output_err)?;
    for record in &run.records {
        let mut row: Vec<String> = record.values.iter().map(|v| v.to_string()).collect();
        row.push(record.location.to_string());
        writer.write_record(&row).map_err(output_err)?;
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::record::Record;
    use crate::schema::{Column, ColumnType, Value};
    use std::fs::read_to_string;

    #[test]
    fn writes_header_and_geometry() {
        let columns = vec![
            Column {
                name: "ID".into(),
                kind: ColumnType::String,
            },
            Column {
                name: "Long".into(),
                kind: ColumnType::Float,
            },
            Column {
                name: "Lat".into(),
                kind: ColumnType::Float,
            },
        ];
        let schema = Schema::new(columns, "Long", "Lat", b',').unwrap();
        let run = RunResult {
            output_id: "fcd_a_b_c".into(),
            records: vec![Record {
                values: vec![Value::Str("car".into()), Value::Float(10.5), Value::Float(20.0)],
                location: Location::new(10.5, 20.0).unwrap(),
            }],
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let path = write_run_result(&run, &schema, &out, "zone").unwrap();
        assert_eq!(path, out.join("fcd_a_b_c_zone.csv"));
        assert_eq!(
            read_to_string(path).unwrap(),
            "ID,Long,Lat,geometry\ncar,10.5,20,POINT (10.5 20)\n"
        );
    }
}
