use crate::{
    Dialect, DriverError, Error, SqlWriter, Value,
    writer::{Context, StatementBuffer},
};

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter;

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_placeholder(&self, _context: &mut Context, out: &mut String, index: usize) {
        out.push('$');
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(index + 1));
    }

    fn write_column_type(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Blob(..) => out.push_str("BYTEA"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMPTZ"),
            _ => crate::GenericSqlWriter.write_column_type(context, out, value),
        }
    }

    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("'\\x");
        for b in value {
            out.push_str(&format!("{:02x}", b));
        }
        out.push('\'');
    }

    fn write_like_escape(&self, _context: &mut Context, _out: &mut StatementBuffer) {
        // Backslash is the default escape character
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }
    fn sql_writer(&self) -> &dyn SqlWriter {
        &PostgresSqlWriter
    }
    fn is_table_exists_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.sql_state == "42P07")
    }
    fn is_sequence_exists_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.sql_state == "42P07")
    }
}
