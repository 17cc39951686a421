use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// a cell as decoded from the driver, before shaping
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Time(TimeValue),
    Json(serde_json::Value),
}

/// a mysql TIME, which is a signed duration up to 838:59:59 rather than a
/// time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeValue {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub microseconds: u32,
}

impl fmt::Display for TimeValue {
    /// `[-]HH:MM:SS` plus `.fff` or `.ffffff` when there is a fraction
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)?;
        match self.microseconds {
            0 => Ok(()),
            us if us % 1000 == 0 => write!(f, ".{:03}", us / 1000),
            us => write!(f, ".{:06}", us),
        }
    }
}

pub type NativeRow = Vec<NativeValue>;

/// raw result of one statement: column names and positional rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeRows {
    pub columns: Vec<String>,
    pub rows: Vec<NativeRow>,
}

impl NativeRows {
    pub fn new(columns: Vec<String>, rows: Vec<NativeRow>) -> Self {
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }
}
