use crate::{Error, Result};
use rust_decimal::Decimal;
use std::{any, mem};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed scalar moved between entities, query parameters and
/// result rows. Every variant wraps an `Option` so a typed NULL stays
/// representable without losing the column type.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* prec: */ u8, /* scale: */ u8),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v, ..) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    /// Whether this value equals the zero value of its type. Drives the
    /// insert-vs-update branch in `Repository::save`: a default primary key
    /// marks the entity as new.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => !v.unwrap_or(false),
            Value::Int8(v) => v.unwrap_or(0) == 0,
            Value::Int16(v) => v.unwrap_or(0) == 0,
            Value::Int32(v) => v.unwrap_or(0) == 0,
            Value::Int64(v) => v.unwrap_or(0) == 0,
            Value::UInt8(v) => v.unwrap_or(0) == 0,
            Value::UInt16(v) => v.unwrap_or(0) == 0,
            Value::UInt32(v) => v.unwrap_or(0) == 0,
            Value::UInt64(v) => v.unwrap_or(0) == 0,
            Value::Float32(v) => v.unwrap_or(0.0) == 0.0,
            Value::Float64(v) => v.unwrap_or(0.0) == 0.0,
            Value::Decimal(v, ..) => v.map_or(true, |v| v.is_zero()),
            Value::Varchar(v) => v.as_ref().map_or(true, |v| v.is_empty()),
            Value::Blob(v) => v.as_ref().map_or(true, |v| v.is_empty()),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.map_or(true, |v| v.is_nil()),
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Int8(l), Value::Int8(r)) => l == r,
            (Value::Int16(l), Value::Int16(r)) => l == r,
            (Value::Int32(l), Value::Int32(r)) => l == r,
            (Value::Int64(l), Value::Int64(r)) => l == r,
            (Value::UInt8(l), Value::UInt8(r)) => l == r,
            (Value::UInt16(l), Value::UInt16(r)) => l == r,
            (Value::UInt32(l), Value::UInt32(r)) => l == r,
            (Value::UInt64(l), Value::UInt64(r)) => l == r,
            (Value::Float32(l), Value::Float32(r)) => l == r,
            (Value::Float64(l), Value::Float64(r)) => l == r,
            (Value::Decimal(l, ..), Value::Decimal(r, ..)) => l == r,
            (Value::Varchar(l), Value::Varchar(r)) => l == r,
            (Value::Blob(l), Value::Blob(r)) => l == r,
            (Value::Date(l), Value::Date(r)) => l == r,
            (Value::Time(l), Value::Time(r)) => l == r,
            (Value::Timestamp(l), Value::Timestamp(r)) => l == r,
            (Value::Uuid(l), Value::Uuid(r)) => l == r,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

/// Conversion seam between native Rust types and the dynamically typed
/// [`Value`] representation backing parameters and row decoding.
///
/// `try_from_value` coerces NULL (or an absent column) to the type's zero
/// value: this is the contract result rows follow when they materialize
/// into entity fields.
pub trait AsValue {
    /// A NULL-like value carrying this type's variant, used as a column
    /// type prototype.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::Conversion(format!(
        "{:?} does not fit {}",
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_integer_as_value {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                let wide: i128 = match value {
                    v if v.is_null() => return Ok(0),
                    $variant(Some(v)) => return Ok(v),
                    Value::Int8(Some(v)) => v as i128,
                    Value::Int16(Some(v)) => v as i128,
                    Value::Int32(Some(v)) => v as i128,
                    Value::Int64(Some(v)) => v as i128,
                    Value::UInt8(Some(v)) => v as i128,
                    Value::UInt16(Some(v)) => v as i128,
                    Value::UInt32(Some(v)) => v as i128,
                    Value::UInt64(Some(v)) => v as i128,
                    other => return Err(conversion_error::<$source>(&other)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::Conversion(format!(
                        "{} is out of range for {}",
                        wide,
                        any::type_name::<$source>()
                    ))
                })
            }
        }
    };
}

impl_integer_as_value!(i8, Value::Int8);
impl_integer_as_value!(i16, Value::Int16);
impl_integer_as_value!(i32, Value::Int32);
impl_integer_as_value!(i64, Value::Int64);
impl_integer_as_value!(u8, Value::UInt8);
impl_integer_as_value!(u16, Value::UInt16);
impl_integer_as_value!(u32, Value::UInt32);
impl_integer_as_value!(u64, Value::UInt64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(false),
            Value::Boolean(Some(v)) => Ok(v),
            other => i64::try_from_value(other).map(|v| v != 0),
        }
    }
}

macro_rules! impl_float_as_value {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    v if v.is_null() => Ok(0.0),
                    $variant(Some(v)) => Ok(v),
                    Value::Float32(Some(v)) => Ok(v as $source),
                    Value::Float64(Some(v)) => Ok(v as $source),
                    Value::Int8(Some(v)) => Ok(v as $source),
                    Value::Int16(Some(v)) => Ok(v as $source),
                    Value::Int32(Some(v)) => Ok(v as $source),
                    Value::Int64(Some(v)) => Ok(v as $source),
                    other => Err(conversion_error::<$source>(&other)),
                }
            }
        }
    };
}

impl_float_as_value!(f32, Value::Float32);
impl_float_as_value!(f64, Value::Float64);

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(String::new()),
            Value::Varchar(Some(v)) => Ok(v),
            other => Err(conversion_error::<String>(&other)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(Default::default()),
            Value::Blob(Some(v)) => Ok(v),
            other => Err(conversion_error::<Box<[u8]>>(&other)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, 0)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(Decimal::ZERO),
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Int64(Some(v)) => Ok(Decimal::from(v)),
            Value::Int32(Some(v)) => Ok(Decimal::from(v)),
            other => Err(conversion_error::<Decimal>(&other)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(Date::MIN),
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            other => Err(conversion_error::<Date>(&other)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(Time::MIDNIGHT),
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            other => Err(conversion_error::<Time>(&other)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(PrimitiveDateTime::MIN),
            Value::Timestamp(Some(v)) => Ok(v),
            other => Err(conversion_error::<PrimitiveDateTime>(&other)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            v if v.is_null() => Ok(Uuid::nil()),
            Value::Uuid(Some(v)) => Ok(v),
            other => Err(conversion_error::<Uuid>(&other)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}
