use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "str", alias = "object")]
    String,
    #[serde(alias = "float64", alias = "float32", alias = "double")]
    Float,
    #[serde(alias = "int", alias = "int64", alias = "int32")]
    Integer,
    #[serde(alias = "datetime", alias = "datetime64")]
    Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

/// Column declarations in the order they appear in the config mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns(pub Vec<Column>);

impl<'de> Deserialize<'de> for Columns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColumnsVisitor;

        impl<'de> Visitor<'de> for ColumnsVisitor {
            type Value = Columns;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of column name to value type")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Columns, A::Error> {
                let mut columns: Vec<Column> = Vec::new();
                while let Some((name, kind)) = map.next_entry::<String, ColumnType>()? {
                    if columns.iter().any(|column| column.name == name) {
                        return Err(de::Error::custom(format!("duplicate column {}", name)));
                    }
                    columns.push(Column { name, kind });
                }
                Ok(Columns(columns))
            }
        }

        deserializer.deserialize_map(ColumnsVisitor)
    }
}

/// Row layout of the source files, fixed for a whole run.
#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<Column>,
    pub longitude: usize,
    pub latitude: usize,
    pub delimiter: u8,
}

impl Schema {
    pub fn new(
        columns: Vec<Column>,
        longitude: &str,
        latitude: &str,
        delimiter: u8,
    ) -> Result<Self, String> {
        let position = |name: &str| {
            columns
                .iter()
                .position(|column| column.name == name)
                .ok_or_else(|| format!("coordinate column {} missing from schema", name))
        };
        let longitude = position(longitude)?;
        let latitude = position(latitude)?;
        if longitude == latitude {
            return Err("longitude and latitude must be distinct columns".into());
        }
        Ok(Schema {
            columns,
            longitude,
            latitude,
            delimiter,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Float(f64),
    Integer(i64),
    Timestamp(OffsetDateTime),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Float(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Timestamp(ts) => {
                let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
                let formatted = ts.format(format).map_err(|_| fmt::Error)?;
                f.write_str(&formatted)
            }
        }
    }
}

impl ColumnType {
    pub fn coerce(&self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() && *self != ColumnType::String {
            return Ok(Value::Null);
        }
        match self {
            ColumnType::String => Ok(Value::Str(raw.to_string())),
            ColumnType::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("{:?} is not a float: {}", raw, e)),
            ColumnType::Integer => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| format!("{:?} is not an integer: {}", raw, e)),
            ColumnType::Timestamp => parse_timestamp(trimmed)
                .map(Value::Timestamp)
                .ok_or_else(|| format!("{:?} is not a timestamp", raw)),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }
    let layouts = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ];
    for layout in layouts {
        if let Ok(ts) = PrimitiveDateTime::parse(s, layout) {
            return Some(ts.assume_utc());
        }
    }
    let secs: i64 = s.parse().ok()?;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}
