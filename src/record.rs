//! User records and age coercion.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::store::{Row, StoreError, Value};

/// Columns projected for a full record, in output order.
pub const RECORD_COLUMNS: [&str; 4] = ["user_id", "name", "email", "age"];

/// One user row.
///
/// `age` is always `Value::Integer` unless the stored value could not be
/// coerced, in which case the raw value is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "age_serde")]
    pub age: Value,
}

impl Record {
    /// Decodes a row, coercing `age` leniently.
    ///
    /// A missing or NULL identity column is a decode failure; an age that
    /// cannot be coerced is logged and passed through unchanged.
    pub fn from_row(mut row: Row) -> Result<Self, StoreError> {
        let user_id = text_column(&mut row, "user_id")?;
        let name = text_column(&mut row, "name")?;
        let email = text_column(&mut row, "email")?;
        let raw_age = row
            .take("age")
            .ok_or_else(|| StoreError::MissingColumn("age".to_string()))?;

        let age = match coerce_age(&raw_age) {
            Some(age) => Value::Integer(age),
            None => {
                warn!("age {raw_age} of user {user_id} is not an integer; keeping raw value");
                raw_age
            }
        };

        Ok(Record {
            user_id,
            name,
            email,
            age,
        })
    }

    /// Integer age, if coercion succeeded when the record was decoded or
    /// succeeds now.
    pub fn age_as_int(&self) -> Option<i64> {
        coerce_age(&self.age)
    }
}

fn text_column(row: &mut Row, column: &str) -> Result<String, StoreError> {
    match row.take(column) {
        None => Err(StoreError::MissingColumn(column.to_string())),
        Some(Value::Null) => Err(StoreError::UnexpectedNull(column.to_string())),
        Some(Value::Text(s)) => Ok(s),
        Some(Value::Integer(i)) => Ok(i.to_string()),
        Some(Value::Real(r)) => Ok(r.to_string()),
        Some(Value::Blob(b)) => Ok(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Converts a stored age to an integer.
///
/// Integers pass through, finite reals and numeric text are truncated toward
/// zero. Anything else yields `None`.
pub fn coerce_age(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Real(r) => truncate(*r),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        Value::Null | Value::Blob(_) => None,
    }
}

fn truncate(r: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
        Some(r.trunc() as i64)
    } else {
        None
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'user_id': {}, 'name': {}, 'email': {}, 'age': ",
            Quoted(&self.user_id),
            Quoted(&self.name),
            Quoted(&self.email),
        )?;
        match &self.age {
            Value::Null => f.write_str("None")?,
            Value::Text(s) => write!(f, "{}", Quoted(s))?,
            other => write!(f, "{other}")?,
        }
        f.write_str("}")
    }
}

/// Single-quoted string literal with `\` and `'` escaped.
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for c in self.0.chars() {
            match c {
                '\'' => f.write_str("\\'")?,
                '\\' => f.write_str("\\\\")?,
                c => write!(f, "{c}")?,
            }
        }
        f.write_str("'")
    }
}

mod age_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::store::Value;

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Null,
        Integer(i64),
        Real(f64),
        Text(String),
        Blob(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match value {
            Value::Null => Repr::Null,
            Value::Integer(i) => Repr::Integer(*i),
            Value::Real(r) => Repr::Real(*r),
            Value::Text(s) => Repr::Text(s.clone()),
            Value::Blob(b) => Repr::Blob(b.clone()),
        };
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Null => Value::Null,
            Repr::Integer(i) => Value::Integer(i),
            Repr::Real(r) => Value::Real(r),
            Repr::Text(s) => Value::Text(s),
            Repr::Blob(b) => Value::Blob(b),
        })
    }
}
