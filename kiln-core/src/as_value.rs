use crate::{Error, Result, Value};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use uuid::Uuid;

/// Text layout of dates, used by transports storing temporal values as strings.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// Text layout of times.
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
/// Text layout of timestamps without offset.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
/// Text layout of timestamps with offset.
pub const TIMESTAMPTZ_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
);

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Every type that can be a property of an entity, a bound argument or a projected column
/// implements it. Decoding is lenient about the source variant (a SQLite integer decodes into
/// any integer type that can hold it) but never lossy: out of range values are errors.
///
/// ```rust
/// use kiln_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null of this type. It is also the prototype used to derive the column type.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Whether the type accepts null, only `Option<T>` does.
    fn nullable() -> bool {
        false
    }
}

fn unexpected<T>(value: &Value) -> Error {
    if value.is_null() {
        Error::msg(format!(
            "Cannot decode a null value into non nullable {}",
            any::type_name::<T>()
        ))
    } else {
        Error::msg(format!(
            "Cannot convert {} ({}) into {}",
            value.type_name(),
            value,
            any::type_name::<T>()
        ))
    }
}

fn out_of_range<T>(value: impl std::fmt::Display) -> Error {
    Error::msg(format!(
        "Value {value} is out of range for {}",
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Int16(Some(v)) => <$source>::try_from(v).map_err(|_| out_of_range::<Self>(v)),
                    Value::Int32(Some(v)) => <$source>::try_from(v).map_err(|_| out_of_range::<Self>(v)),
                    Value::Int64(Some(v)) => <$source>::try_from(v).map_err(|_| out_of_range::<Self>(v)),
                    Value::Decimal(Some(v)) if v.fract().is_zero() => {
                        v.to_i64()
                            .and_then(|v| <$source>::try_from(v).ok())
                            .ok_or_else(|| out_of_range::<Self>(v))
                    }
                    Value::Varchar(Some(ref v)) => v
                        .trim()
                        .parse::<$source>()
                        .map_err(|_| unexpected::<Self>(&value)),
                    v => Err(unexpected::<Self>(&v)),
                }
            }
        }
    };
}
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path, $from_decimal:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Int16(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v.$from_decimal().ok_or_else(|| out_of_range::<Self>(v)),
                    v => Err(unexpected::<Self>(&v)),
                }
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32, to_f32);
impl_as_value_float!(f64, Value::Float64, to_f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int16(Some(v @ 0..=1)) => Ok(v == 1),
            Value::Int32(Some(v @ 0..=1)) => Ok(v == 1),
            Value::Int64(Some(v @ 0..=1)) => Ok(v == 1),
            v => Err(unexpected::<Self>(&v)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or_else(|| out_of_range::<Self>(v)),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| out_of_range::<Self>(v)),
            Value::Varchar(Some(ref v)) => v
                .trim()
                .parse::<Decimal>()
                .map_err(|_| unexpected::<Self>(&value)),
            v => Err(unexpected::<Self>(&v)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            v => Err(unexpected::<Self>(&v)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            v => Err(unexpected::<Self>(&v)),
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
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => {
                Date::parse(v, DATE_FORMAT).map_err(|_| unexpected::<Self>(&value))
            }
            v => Err(unexpected::<Self>(&v)),
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
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => {
                Time::parse(v, TIME_FORMAT).map_err(|_| unexpected::<Self>(&value))
            }
            v => Err(unexpected::<Self>(&v)),
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
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Varchar(Some(ref v)) => PrimitiveDateTime::parse(v, TIMESTAMP_FORMAT)
                .map_err(|_| unexpected::<Self>(&value)),
            v => Err(unexpected::<Self>(&v)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(ref v)) => OffsetDateTime::parse(v, TIMESTAMPTZ_FORMAT)
                .map_err(|_| unexpected::<Self>(&value)),
            v => Err(unexpected::<Self>(&v)),
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
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Uuid::parse_str(v).map_err(|_| unexpected::<Self>(&value)),
            Value::Blob(Some(ref v)) => Uuid::from_slice(v).map_err(|_| unexpected::<Self>(&value)),
            v => Err(unexpected::<Self>(&v)),
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
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
    fn nullable() -> bool {
        true
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn integers_widen_and_narrow() {
        assert_eq!(i32::try_from_value(Value::Int64(Some(16))).unwrap(), 16);
        assert_eq!(i64::try_from_value(Value::Int16(Some(-3))).unwrap(), -3);
        assert!(i16::try_from_value(Value::Int64(Some(100_000))).is_err());
        assert!(i32::try_from_value(Value::Int32(None)).is_err());
    }

    #[test]
    fn options_accept_null() {
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int64(None)).unwrap(),
            None
        );
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::try_from_value(Value::Varchar(Some("a".into()))).unwrap(),
            Some("a".to_string())
        );
        assert!(Option::<i32>::nullable());
        assert!(!i32::nullable());
    }

    #[test]
    fn temporal_from_text() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2025-01-02".into()))).unwrap(),
            date!(2025 - 01 - 02)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2025-01-02 10:20:30.5".into()
            )))
            .unwrap(),
            datetime!(2025-01-02 10:20:30.5)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::TimestampWithTimezone(Some(
                datetime!(2025-01-02 10:00 +02:00)
            )))
            .unwrap(),
            datetime!(2025-01-02 08:00)
        );
    }

    #[test]
    fn bool_from_integer() {
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert!(!bool::try_from_value(Value::Int64(Some(0))).unwrap());
        assert!(bool::try_from_value(Value::Int64(Some(2))).is_err());
    }
}
