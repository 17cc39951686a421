use super::value::{NativeRows, NativeValue};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::SecondsFormat;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub type Row = Map<String, Value>;

/// rows ready for json output, each keyed by column in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

/// convert driver rows into portable json scalars
pub fn shape(raw: NativeRows) -> ResultSet {
    let columns = unique_column_names(&raw.columns);

    let rows = raw
        .rows
        .into_iter()
        .map(|cells| {
            columns
                .iter()
                .cloned()
                .zip(cells.into_iter().map(portable))
                .collect::<Row>()
        })
        .collect();

    ResultSet { columns, rows }
}

/// repeated names (e.g. two joined `id` columns) get a numeric suffix
fn unique_column_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name.clone();
            }
            let mut n = 2;
            loop {
                let candidate = format!("{}_{}", name, n);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

fn portable(value: NativeValue) -> Value {
    match value {
        NativeValue::Null => Value::Null,
        NativeValue::Bool(b) => Value::Bool(b),
        NativeValue::Int(i) => Value::from(i),
        NativeValue::UInt(u) => Value::from(u),
        NativeValue::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        // always strings so precision never depends on the magnitude
        NativeValue::Decimal(d) => Value::String(d.to_string()),
        NativeValue::Text(s) => Value::String(s),
        NativeValue::Bytes(b) => Value::String(STANDARD.encode(b)),
        NativeValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        NativeValue::DateTime(dt) => {
            Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        NativeValue::Timestamp(ts) => {
            Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        NativeValue::Time(t) => Value::String(t.to_string()),
        NativeValue::Json(v) => v,
    }
}
