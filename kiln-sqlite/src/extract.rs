use kiln_core::{
    DATE_FORMAT, Error, Result, TIME_FORMAT, TIMESTAMP_FORMAT, TIMESTAMPTZ_FORMAT, Value,
};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use time::UtcOffset;

/// Converts an argument into the storage class SQLite keeps it as.
pub(crate) fn to_sqlite(value: &Value) -> Result<SqliteValue> {
    Ok(match value {
        v if v.is_null() => SqliteValue::Null,
        Value::Boolean(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int16(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int32(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int64(Some(v)) => SqliteValue::Integer(*v),
        Value::Float32(Some(v)) => SqliteValue::Real(*v as f64),
        Value::Float64(Some(v)) => SqliteValue::Real(*v),
        Value::Decimal(Some(v)) => SqliteValue::Text(v.to_string()),
        Value::Varchar(Some(v)) => SqliteValue::Text(v.clone()),
        Value::Blob(Some(v)) => SqliteValue::Blob(v.to_vec()),
        Value::Date(Some(v)) => SqliteValue::Text(v.format(DATE_FORMAT)?),
        Value::Time(Some(v)) => SqliteValue::Text(v.format(TIME_FORMAT)?),
        Value::Timestamp(Some(v)) => SqliteValue::Text(v.format(TIMESTAMP_FORMAT)?),
        Value::TimestampWithTimezone(Some(v)) => {
            SqliteValue::Text(v.to_offset(UtcOffset::UTC).format(TIMESTAMPTZ_FORMAT)?)
        }
        Value::Uuid(Some(v)) => SqliteValue::Text(v.hyphenated().to_string()),
        _ => {
            let error = Error::msg(format!("Cannot bind {:?}", value));
            log::error!("{:#}", error);
            return Err(error);
        }
    })
}

/// Reads a column of the current row, the property type narrows it later.
pub(crate) fn extract_value(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(String::from_utf8(v.to_vec())?)),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::AsValue;
    use time::macros::{date, datetime, time};

    #[test]
    fn temporal_values_are_stored_as_text() {
        assert_eq!(
            to_sqlite(&date!(2024 - 02 - 29).as_value()).unwrap(),
            SqliteValue::Text("2024-02-29".into())
        );
        let stored = to_sqlite(&datetime!(2024-01-01 10:30:00.25 +02:00).as_value()).unwrap();
        let SqliteValue::Text(text) = stored else {
            panic!("Expected text, got {:?}", stored);
        };
        assert!(text.starts_with("2024-01-01 08:30:00.25"), "{text}");
        let decoded = time::OffsetDateTime::try_from_value(Value::Varchar(Some(text))).unwrap();
        assert_eq!(decoded, datetime!(2024-01-01 08:30:00.25 UTC));
        let stored = to_sqlite(&time!(12:00:01.5).as_value()).unwrap();
        let SqliteValue::Text(text) = stored else {
            panic!("Expected text, got {:?}", stored);
        };
        assert_eq!(
            time::Time::try_from_value(Value::Varchar(Some(text))).unwrap(),
            time!(12:00:01.5)
        );
    }

    #[test]
    fn nulls_and_booleans() {
        assert_eq!(to_sqlite(&Value::Int32(None)).unwrap(), SqliteValue::Null);
        assert_eq!(to_sqlite(&true.as_value()).unwrap(), SqliteValue::Integer(1));
        assert!(matches!(
            extract_value(ValueRef::Integer(1)).unwrap(),
            Value::Int64(Some(1))
        ));
        assert!(extract_value(ValueRef::Null).unwrap().is_null());
    }
}
