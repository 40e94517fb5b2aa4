use crate::{
    ColumnRef, Dialect, DriverError, DuplicateKeyAction, Error, Operand, SqlWriter, UpsertClause,
    Value,
    writer::{Context, StatementBuffer},
};

/// Writer of MySQL, it differs mostly in quoting and in the duplicate key clause.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlSqlWriter;

impl SqlWriter for MySqlSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(context, out, value, '`', "``");
        out.push('`');
    }

    fn write_excluded_column(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        out.push_str("VALUES(");
        self.write_identifier_quoted(context, out, &value.name);
        out.push(')');
    }

    fn write_column_type(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Decimal(..) => out.push_str("DECIMAL(38,10)"),
            Value::Varchar(..) => out.push_str("VARCHAR(255)"),
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => out.push_str("DATETIME(6)"),
            Value::Time(..) => out.push_str("TIME(6)"),
            Value::Uuid(..) => out.push_str("CHAR(36)"),
            _ => crate::GenericSqlWriter.write_column_type(context, out, value),
        }
    }

    fn write_value_string(&self, _context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out.push('\'');
    }

    fn write_concat(
        &self,
        context: &mut Context,
        out: &mut StatementBuffer,
        lhs: &Operand,
        rhs: &Operand,
    ) {
        out.push_str("CONCAT(");
        crate::Expression::write_query(lhs, self, context, out);
        out.push_str(", ");
        crate::Expression::write_query(rhs, self, context, out);
        out.push(')');
    }

    fn write_like_escape(&self, _context: &mut Context, out: &mut StatementBuffer) {
        out.push_str(" ESCAPE '\\\\'");
    }

    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut StatementBuffer,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        match (limit, offset) {
            (None, None) => {}
            (Some(limit), None) => out.push_str(&format!("\nLIMIT {limit}")),
            (limit, Some(offset)) => out.push_str(&format!(
                "\nLIMIT {}\nOFFSET {offset}",
                limit.unwrap_or(u64::MAX)
            )),
        }
    }

    fn write_insert_into(&self, _context: &mut Context, out: &mut StatementBuffer, ignore: bool) {
        out.push_str(if ignore {
            "INSERT IGNORE INTO "
        } else {
            "INSERT INTO "
        });
    }

    fn write_upsert(&self, context: &mut Context, out: &mut StatementBuffer, upsert: &UpsertClause) {
        // MySQL has no conflict target, every unique key is checked
        if upsert.action == DuplicateKeyAction::Update {
            out.push_str("\nON DUPLICATE KEY UPDATE\n");
            self.write_assignments(context, out, upsert.assignments, ",\n");
        }
    }

    fn write_identity(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" AUTO_INCREMENT");
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }
    fn sql_writer(&self) -> &dyn SqlWriter {
        &MySqlSqlWriter
    }
    fn is_unique_constraint_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.vendor_code == 1062)
    }
    fn is_table_exists_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.vendor_code == 1050)
    }
}
