//! Bound parameters and column values.
//!
//! [`Value`] is the single currency between records, the clause builder and the
//! drivers. Integer and float variants keep their width so a dialect can pick a
//! column type from a zero-valued sample of a field.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Canonical text form used when an instant is stored as text.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A value bound to a `?` placeholder or read back from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Any integer (or boolean) value widened to `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::Bool(b) => Some(i128::from(b)),
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v.into()),
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Any numeric value as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v.into()),
            Self::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Self::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Self::Bytes(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Interpret this value as an instant.
    ///
    /// Text is accepted in `YYYY-MM-DD HH:MM:SS[.fff]` and RFC 3339 forms, which is how
    /// drivers without a native timestamp type hand datetimes back.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(value) => Some(*value),
            Self::Text(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.naive_utc())
                }),
            _ => None,
        }
    }
}

/// Convert a Rust value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Build a Rust value from a [`Value`] read out of a row.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> OrmResult<Self>;
}

/// A type that can back a model field.
///
/// `zero_value` is the sample a dialect inspects to choose the column type. For
/// `Option<T>` it is the sample of `T`, so nullable fields map to the same column type.
pub trait SqlField: ToValue + FromValue {
    fn zero_value() -> Value;
}

fn mismatch(expected: &str, got: &Value) -> OrmError {
    OrmError::Conversion(format!("expected {expected}, got {}", got.kind_name()))
}

macro_rules! impl_integer {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> OrmResult<Self> {
                let wide = value
                    .as_i128()
                    .ok_or_else(|| mismatch(stringify!($ty), &value))?;
                <$ty>::try_from(wide).map_err(|_| {
                    OrmError::Conversion(format!(
                        "value {wide} does not fit in {}",
                        stringify!($ty)
                    ))
                })
            }
        }

        impl SqlField for $ty {
            fn zero_value() -> Value {
                Value::$variant(0)
            }
        }
    )*};
}

impl_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::F32(*self)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::F32(v) => Ok(v),
            other => other
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| mismatch("f32", &other)),
        }
    }
}

impl SqlField for f32 {
    fn zero_value() -> Value {
        Value::F32(0.0)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::F64(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> OrmResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", &value))
    }
}

impl SqlField for f64 {
    fn zero_value() -> Value {
        Value::F64(0.0)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => other
                .as_i128()
                .map(|v| v != 0)
                .ok_or_else(|| mismatch("bool", &other)),
        }
    }
}

impl SqlField for bool {
    fn zero_value() -> Value {
        Value::Bool(false)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl SqlField for String {
    fn zero_value() -> Value {
        Value::Text(String::new())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl SqlField for Vec<u8> {
    fn zero_value() -> Value {
        Value::Bytes(Vec::new())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> OrmResult<Self> {
        value
            .as_datetime()
            .ok_or_else(|| mismatch("datetime", &value))
    }
}

impl SqlField for NaiveDateTime {
    fn zero_value() -> Value {
        Value::DateTime(NaiveDateTime::default())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value.naive_utc())
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::DateTime(self.naive_utc())
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> OrmResult<Self> {
        NaiveDateTime::from_value(value).map(|dt| dt.and_utc())
    }
}

impl SqlField for DateTime<Utc> {
    fn zero_value() -> Value {
        Value::DateTime(NaiveDateTime::default())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: SqlField> SqlField for Option<T> {
    fn zero_value() -> Value {
        T::zero_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> OrmResult<Self> {
        Ok(value)
    }
}

/// Build a `Vec<Value>` from heterogeneous arguments.
///
/// ```
/// use tinyorm::{Value, params};
///
/// let args = params![10, "Tom"];
/// assert_eq!(args, vec![Value::I32(10), Value::Text("Tom".into())]);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
