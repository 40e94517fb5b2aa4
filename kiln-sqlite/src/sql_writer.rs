use kiln_core::{
    SqlWriter, Value,
    writer::{Context, StatementBuffer},
};
use std::fmt::Write;

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter;

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) | Value::Int16(..) | Value::Int32(..) | Value::Int64(..) => {
                out.push_str("INTEGER")
            }
            Value::Float32(..) | Value::Float64(..) => out.push_str("REAL"),
            // Decimals keep their exact digits as text
            Value::Decimal(..) => out.push_str("TEXT"),
            Value::Varchar(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..)
            | Value::Time(..)
            | Value::Timestamp(..)
            | Value::TimestampWithTimezone(..)
            | Value::Uuid(..) => out.push_str("TEXT"),
            Value::Null => log::error!("Unexpected kiln::Value, an untyped null has no column type"),
        }
    }

    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push(if value { '1' } else { '0' });
    }

    fn write_value_infinity(&self, _context: &mut Context, out: &mut String, negative: bool) {
        if negative {
            out.push('-');
        }
        out.push_str("1.0e+10000");
    }

    fn write_value_nan(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut StatementBuffer,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        match (limit, offset) {
            (Some(limit), _) => {
                let _ = write!(out, "\nLIMIT {}", limit);
            }
            // OFFSET alone is a syntax error
            (None, Some(..)) => out.push_str("\nLIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }

    fn write_for_update(&self, _context: &mut Context, _out: &mut StatementBuffer) {
        // The whole database is locked by the writer
    }

    fn write_identity(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" AUTOINCREMENT");
    }
}
