//! Cell values of a result row.
//!
//! The driver hands out [CqlValue]s, one variant per CQL type. The shell only
//! needs to print them, so they are folded into the small closed set of
//! [CellValue] variants, each with a fixed human-readable rendering.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use num_bigint::BigInt;
use scylla::value::{
    CqlDate, CqlDecimal, CqlDuration, CqlTime, CqlTimestamp, CqlValue, CqlVarint,
};
use uuid::Uuid;

/// A single value of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Absent value (`null`, or an empty value of a non-string type).
    Null,
    /// `boolean`.
    Boolean(bool),
    /// `tinyint`, `smallint`, `int`, `bigint` and `counter`.
    Integer(i64),
    /// `float`, kept at single precision so it prints as written.
    Float32(f32),
    /// `double`.
    Float(f64),
    /// `ascii`, `text`, and every type best shown as preformatted text
    /// (`varint`, `decimal`, `uuid`, `timeuuid`, `inet`, `date`, `time`,
    /// `timestamp`, `duration`).
    Text(String),
    /// `blob`.
    Bytes(Vec<u8>),
    /// `list`, `set` and `tuple`.
    List(Vec<CellValue>),
    /// `map`, and user defined types keyed by field name.
    Map(Vec<(CellValue, CellValue)>),
}

impl From<Option<CqlValue>> for CellValue {
    fn from(value: Option<CqlValue>) -> Self {
        value.map_or(CellValue::Null, CellValue::from)
    }
}

impl From<CqlValue> for CellValue {
    fn from(value: CqlValue) -> Self {
        match value {
            CqlValue::Empty => CellValue::Null,
            CqlValue::Boolean(b) => CellValue::Boolean(b),
            CqlValue::TinyInt(i) => CellValue::Integer(i.into()),
            CqlValue::SmallInt(i) => CellValue::Integer(i.into()),
            CqlValue::Int(i) => CellValue::Integer(i.into()),
            CqlValue::BigInt(i) => CellValue::Integer(i),
            CqlValue::Counter(c) => CellValue::Integer(c.0),
            CqlValue::Float(f) => CellValue::Float32(f),
            CqlValue::Double(f) => CellValue::Float(f),
            CqlValue::Ascii(s) | CqlValue::Text(s) => CellValue::Text(s),
            CqlValue::Blob(b) => CellValue::Bytes(b),
            CqlValue::Varint(v) => CellValue::Text(format_varint(&v)),
            CqlValue::Decimal(d) => CellValue::Text(format_decimal(&d)),
            CqlValue::Uuid(u) => CellValue::Text(u.to_string()),
            CqlValue::Timeuuid(u) => CellValue::Text(Uuid::from_bytes(*u.as_bytes()).to_string()),
            CqlValue::Inet(ip) => CellValue::Text(ip.to_string()),
            CqlValue::Date(d) => CellValue::Text(format_date(d)),
            CqlValue::Time(t) => CellValue::Text(format_time(t)),
            CqlValue::Timestamp(t) => CellValue::Text(format_timestamp(t)),
            CqlValue::Duration(d) => CellValue::Text(format_duration(d)),
            CqlValue::List(items) | CqlValue::Set(items) => {
                CellValue::List(items.into_iter().map(CellValue::from).collect())
            }
            CqlValue::Tuple(items) => {
                CellValue::List(items.into_iter().map(CellValue::from).collect())
            }
            CqlValue::Map(entries) => CellValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (CellValue::from(k), CellValue::from(v)))
                    .collect(),
            ),
            CqlValue::UserDefinedType { fields, .. } => CellValue::Map(
                fields
                    .into_iter()
                    .map(|(name, v)| (CellValue::Text(name), CellValue::from(v)))
                    .collect(),
            ),
            other => CellValue::Text(format!("{other:?}")),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("null"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float32(x) => write!(f, "{x}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bytes(bytes) => {
                f.write_str("0x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            CellValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", Nested(item))?;
                }
                f.write_str("]")
            }
            CellValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", Nested(key), Nested(value))?;
                }
                f.write_str("}")
            }
        }
    }
}

// Text inside a collection is quoted, so that `['a, b']` and `['a', 'b']`
// stay distinguishable.
struct Nested<'a>(&'a CellValue);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            CellValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            other => write!(f, "{other}"),
        }
    }
}

fn format_varint(value: &CqlVarint) -> String {
    BigInt::from_signed_bytes_be(value.as_signed_bytes_be_slice()).to_string()
}

fn format_decimal(value: &CqlDecimal) -> String {
    let (unscaled, scale) = value.as_signed_be_bytes_slice_and_exponent();
    let unscaled = BigInt::from_signed_bytes_be(unscaled);
    let negative = unscaled.sign() == num_bigint::Sign::Minus;
    let digits = unscaled.magnitude().to_string();
    let sign = if negative { "-" } else { "" };

    if scale <= 0 {
        let zeros = "0".repeat(scale.unsigned_abs() as usize);
        if digits == "0" {
            return "0".to_owned();
        }
        return format!("{sign}{digits}{zeros}");
    }

    let scale = scale as usize;
    if digits.len() > scale {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        format!("{sign}{int_part}.{frac_part}")
    } else {
        let padding = "0".repeat(scale - digits.len());
        format!("{sign}0.{padding}{digits}")
    }
}

// Days between -5877641-06-23 (day 0 of CqlDate) and -250000-01-01, which is
// within chrono's NaiveDate range.
const DATE_OFFSET_DAYS: u32 = 2_055_453_495;

fn format_date(value: CqlDate) -> String {
    let days = i64::from(value.0) - i64::from(DATE_OFFSET_DAYS);
    NaiveDate::from_ymd_opt(-250_000, 1, 1)
        .zip(Duration::try_days(days))
        .and_then(|(base, offset)| base.checked_add_signed(offset))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("Invalid date: {} days", value.0))
}

fn format_time(value: CqlTime) -> String {
    let nanoseconds = value.0;
    let seconds = nanoseconds.div_euclid(1_000_000_000);
    let nanos = nanoseconds.rem_euclid(1_000_000_000);
    u32::try_from(seconds)
        .ok()
        .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos as u32))
        .map(|time| time.format("%H:%M:%S%.9f").to_string())
        .unwrap_or_else(|| format!("Invalid time: {nanoseconds} nanoseconds"))
}

fn format_timestamp(value: CqlTimestamp) -> String {
    match Utc.timestamp_millis_opt(value.0).single() {
        Some(datetime) => format!(
            "{}.{:06}+0000",
            datetime.format("%Y-%m-%d %H:%M:%S"),
            datetime.timestamp_subsec_micros()
        ),
        None => format!("Invalid timestamp: {} milliseconds", value.0),
    }
}

fn format_duration(value: CqlDuration) -> String {
    let mut out = String::new();
    let negative = value.months < 0 || value.days < 0 || value.nanoseconds < 0;
    if negative {
        out.push('-');
    }

    let months = i64::from(value.months).unsigned_abs();
    let days = i64::from(value.days).unsigned_abs();
    let nanoseconds = value.nanoseconds.unsigned_abs();

    let parts = [
        (months / 12, "y"),
        (months % 12, "mo"),
        (days / 7, "w"),
        (days % 7, "d"),
        (nanoseconds / 3_600_000_000_000, "h"),
        ((nanoseconds % 3_600_000_000_000) / 60_000_000_000, "m"),
        ((nanoseconds % 60_000_000_000) / 1_000_000_000, "s"),
        ((nanoseconds % 1_000_000_000) / 1_000_000, "ms"),
        ((nanoseconds % 1_000_000) / 1_000, "us"),
        (nanoseconds % 1_000, "ns"),
    ];
    for (amount, unit) in parts {
        if amount != 0 {
            out.push_str(&format!("{amount}{unit}"));
        }
    }

    if out.is_empty() || out == "-" {
        return "0s".to_owned();
    }
    out
}
