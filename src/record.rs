use crate::location::Location;
use crate::schema::{Schema, Value};
use csv::StringRecord;

/// One source row coerced to the schema, with the point derived from its
/// coordinate columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<Value>,
    pub location: Location,
}

impl Record {
    pub fn parse(row: &StringRecord, schema: &Schema) -> Result<Self, String> {
        if row.len() != schema.len() {
            return Err(format!(
                "row has {} fields, schema declares {}",
                row.len(),
                schema.len()
            ));
        }
        let values = schema
            .columns
            .iter()
            .zip(row.iter())
            .map(|(column, raw)| {
                column
                    .kind
                    .coerce(raw)
                    .map_err(|e| format!("column {}: {}", column.name, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let coordinate = |idx: usize| -> Result<f64, String> {
            let name = &schema.columns[idx].name;
            match &values[idx] {
                Value::Null => Err(format!("column {} is empty", name)),
                value => match value.as_f64() {
                    Some(v) => Ok(v),
                    None => row[idx]
                        .trim()
                        .parse::<f64>()
                        .map_err(|e| format!("column {}: {}", name, e)),
                },
            }
        };
        let location = Location::new(coordinate(schema.longitude)?, coordinate(schema.latitude)?)?;
        Ok(Record { values, location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};

    fn schema() -> Schema {
        let columns = vec![
            Column {
                name: "ID".into(),
                kind: ColumnType::String,
            },
            Column {
                name: "Lat".into(),
                kind: ColumnType::Float,
            },
            Column {
                name: "Long".into(),
                kind: ColumnType::Float,
            },
            Column {
                name: "Velocity".into(),
                kind: ColumnType::Integer,
            },
        ];
        Schema::new(columns, "Long", "Lat", b',').unwrap()
    }

    #[test]
    fn parses_row_and_location() {
        let row = StringRecord::from(vec!["car-1", "53.089", "8.822", "42"]);
        let record = Record::parse(&row, &schema()).unwrap();
        assert_eq!(record.location, Location::new(8.822, 53.089).unwrap());
        assert_eq!(record.values[3], Value::Integer(42));
    }

    #[test]
    fn allows_empty_non_coordinate_fields() {
        let row = StringRecord::from(vec!["car-1", "53.089", "8.822", ""]);
        let record = Record::parse(&row, &schema()).unwrap();
        assert_eq!(record.values[3], Value::Null);
    }

    #[test]
    fn rejects_missing_coordinates() {
        let row = StringRecord::from(vec!["car-1", "", "8.822", "1"]);
        assert!(Record::parse(&row, &schema()).is_err());
    }

    #[test]
    fn rejects_wrong_field_count() {
        let row = StringRecord::from(vec!["car-1", "53.089", "8.822"]);
        let err = Record::parse(&row, &schema()).unwrap_err();
        assert!(err.contains("3 fields"));
    }
}
