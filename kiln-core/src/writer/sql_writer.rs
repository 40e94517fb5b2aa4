use crate::{
    AggregateFunction, BinaryOp, BinaryOpType, ColumnDef, ColumnExpression, ColumnRef, Criteria,
    Criterion, DuplicateKeyAction, Expression, JoinDef, JoinType, OpPrecedence, Operand, Order,
    PrimaryKeyType, SelectClauses, TableMetamodel, TableRef, Value, possibly_parenthesized,
    separated_by, separated_by_statement,
    writer::{Context, Fragment, StatementBuffer},
};
use std::{fmt::Write, sync::Arc};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $context:ident,$out:ident, $value:expr) => {{
        if $value.is_infinite() {
            $this.write_value_infinity($context, $out, $value.is_sign_negative());
        } else if $value.is_nan() {
            $this.write_value_nan($context, $out);
        } else {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        }
    }};
}

/// Conflict clause of an insert, with keys and assignments already resolved to columns.
#[derive(Debug)]
pub struct UpsertClause<'a> {
    pub action: DuplicateKeyAction,
    pub keys: &'a [ColumnRef],
    pub assignments: &'a [(ColumnRef, Operand)],
}

/// Dialect printer converting semantic constructs into concrete SQL strings.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Whether the current fragment context allows alias declaration.
    fn alias_declaration(&self, context: &mut Context) -> bool {
        match context.fragment {
            Fragment::SqlSelectFrom | Fragment::SqlJoin => true,
            _ => false,
        }
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a table reference, declaring the alias in `FROM` and `JOIN`, using it elsewhere.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if self.alias_declaration(context) || value.alias.is_empty() {
            if !value.schema.is_empty() {
                self.write_identifier_quoted(context, out, &value.schema);
                out.push('.');
            }
            self.write_identifier_quoted(context, out, &value.name);
        }
        if !value.alias.is_empty() {
            if self.alias_declaration(context) {
                out.push(' ');
            }
            out.push_str(&value.alias);
        }
    }

    /// Render a column reference, qualified when the context asks for it.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        if value.table.excluded {
            return self.write_excluded_column(context, out, value);
        }
        if context.qualify_columns && !value.table.is_empty() {
            // Columns only reference the table, the alias is declared in FROM and JOIN
            let mut reference = Context {
                fragment: Fragment::None,
                ..*context
            };
            self.write_table_ref(&mut reference, out, &value.table);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Render the proposed value of a column inside an upsert clause.
    fn write_excluded_column(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        out.push_str("EXCLUDED.");
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Render the SQL type for a `Value` prototype.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Decimal(..) => out.push_str("DECIMAL"),
            Value::Varchar(..) => out.push_str("VARCHAR"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMP WITH TIME ZONE"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null => log::error!("Unexpected kiln::Value, an untyped null has no column type"),
        };
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(context, out),
            Value::Boolean(Some(v)) => self.write_value_bool(context, out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(self, context, out, *v),
            Value::Float64(Some(v)) => write_float!(self, context, out, *v),
            Value::Decimal(Some(v)) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(context, out, v),
            Value::Blob(Some(v)) => self.write_value_blob(context, out, v.as_ref()),
            Value::Date(Some(v)) => self.write_value_date(context, out, v, false),
            Value::Time(Some(v)) => self.write_value_time(context, out, v, false),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(context, out, v),
            Value::TimestampWithTimezone(Some(v)) => {
                self.write_value_timestamptz(context, out, v)
            }
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            _ => {
                log::error!("Cannot write {:?}", value);
            }
        };
    }

    /// Render NULL literal.
    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    /// Render boolean literal.
    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    /// Render +/- INF.
    fn write_value_infinity(&self, _context: &mut Context, out: &mut String, negative: bool) {
        out.push_str(if negative {
            "CAST('-inf' AS DOUBLE PRECISION)"
        } else {
            "CAST('inf' AS DOUBLE PRECISION)"
        });
    }

    /// Render NaN.
    fn write_value_nan(&self, _context: &mut Context, out: &mut String) {
        out.push_str("CAST('NaN' AS DOUBLE PRECISION)");
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    /// Render a blob literal using hex escapes.
    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    /// Render a DATE literal (optionally as part of TIMESTAMP composition).
    fn write_value_date(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Date,
        timestamp: bool,
    ) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:04}-{:02}-{:02}{b}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    /// Render a TIME literal (optionally as part of TIMESTAMP composition).
    fn write_value_time(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Time,
        timestamp: bool,
    ) {
        let mut subsecond = value.nanosecond();
        let mut width = 9;
        while width > 1 && subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:02}:{:02}:{:02}.{:0width$}{b}",
            value.hour(),
            value.minute(),
            value.second(),
            subsecond
        );
    }

    /// Render a TIMESTAMP literal.
    fn write_value_timestamp(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &PrimitiveDateTime,
    ) {
        out.push('\'');
        self.write_value_date(context, out, &value.date(), true);
        out.push(' ');
        self.write_value_time(context, out, &value.time(), true);
        out.push('\'');
    }

    /// Render a TIMESTAMPTZ literal, normalized to UTC.
    fn write_value_timestamptz(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &OffsetDateTime,
    ) {
        let date_time = value.to_utc();
        out.push('\'');
        self.write_value_date(context, out, &date_time.date(), true);
        out.push(' ');
        self.write_value_time(context, out, &date_time.time(), true);
        out.push_str("+00:00'");
    }

    /// Render the placeholder of the argument at `index` (zero based).
    fn write_placeholder(&self, _context: &mut Context, out: &mut String, _index: usize) {
        out.push('?');
    }

    /// Bind `value` as the next argument.
    fn write_parameter(&self, context: &mut Context, out: &mut StatementBuffer, value: &Value) {
        out.bind(self.as_dyn(), context, value.clone());
    }

    /// Precedence table for binary operators.
    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Like => 400,
            BinaryOpType::NotLike => 400,
            BinaryOpType::Subtraction => 800,
            BinaryOpType::Addition => 800,
            BinaryOpType::Multiplication => 900,
            BinaryOpType::Division => 900,
            BinaryOpType::Remainder => 900,
        }
    }

    /// Render binary operator expression handling precedence / parenthesis.
    fn write_expression_binary_op(
        &self,
        context: &mut Context,
        out: &mut StatementBuffer,
        value: &BinaryOp<&dyn Expression, &dyn Expression>,
    ) {
        let infix = match value.op {
            BinaryOpType::Multiplication => " * ",
            BinaryOpType::Division => " / ",
            BinaryOpType::Remainder => " % ",
            BinaryOpType::Addition => " + ",
            BinaryOpType::Subtraction => " - ",
            BinaryOpType::Like => " LIKE ",
            BinaryOpType::NotLike => " NOT LIKE ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " <> ",
            BinaryOpType::Less => " < ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        };
        let precedence = self.expression_binary_op_precedence(&value.op);
        possibly_parenthesized!(
            out,
            value.lhs.precedence(self.as_dyn()) < precedence,
            value.lhs.write_query(self.as_dyn(), context, out)
        );
        out.push_str(infix);
        possibly_parenthesized!(
            out,
            value.rhs.precedence(self.as_dyn()) <= precedence,
            value.rhs.write_query(self.as_dyn(), context, out)
        );
    }

    /// Render any column expression.
    fn write_column_expression(
        &self,
        context: &mut Context,
        out: &mut StatementBuffer,
        value: &ColumnExpression,
    ) {
        match value {
            ColumnExpression::Property(v) => self.write_column_ref(context, out, v),
            ColumnExpression::Arithmetic { op, lhs, rhs } => self.write_expression_binary_op(
                context,
                out,
                &BinaryOp {
                    op: *op,
                    lhs: lhs as &dyn Expression,
                    rhs: rhs as &dyn Expression,
                },
            ),
            ColumnExpression::Concat { lhs, rhs } => self.write_concat(context, out, lhs, rhs),
            ColumnExpression::Aggregate(v) => self.write_aggregate(context, out, v),
            ColumnExpression::Sorted { order, expression } => {
                expression.write_query(self.as_dyn(), context, out);
                if context.fragment == Fragment::SqlSelectOrderBy {
                    out.push_str(match order {
                        Order::ASC => " ASC",
                        Order::DESC => " DESC",
                    });
                }
            }
            ColumnExpression::Alias { expression, alias } => {
                expression.write_query(self.as_dyn(), context, out);
                if context.fragment == Fragment::SqlSelect {
                    out.push_str(" AS ");
                    self.write_identifier_quoted(context, out, alias);
                }
            }
        }
    }

    /// Render string concatenation.
    fn write_concat(
        &self,
        context: &mut Context,
        out: &mut StatementBuffer,
        lhs: &Operand,
        rhs: &Operand,
    ) {
        out.push('(');
        lhs.write_query(self.as_dyn(), context, out);
        out.push_str(" || ");
        rhs.write_query(self.as_dyn(), context, out);
        out.push(')');
    }

    /// Render an aggregate function call.
    fn write_aggregate(
        &self,
        context: &mut Context,
        out: &mut StatementBuffer,
        value: &AggregateFunction,
    ) {
        let (name, argument) = match value {
            AggregateFunction::CountAsterisk => {
                out.push_str("COUNT(*)");
                return;
            }
            AggregateFunction::Count(v) => ("COUNT", v),
            AggregateFunction::Sum(v) => ("SUM", v),
            AggregateFunction::Avg(v) => ("AVG", v),
            AggregateFunction::Min(v) => ("MIN", v),
            AggregateFunction::Max(v) => ("MAX", v),
        };
        out.push_str(name);
        out.push('(');
        argument.unsorted().write_query(self.as_dyn(), context, out);
        out.push(')');
    }

    /// Render a conjunction: criteria are joined with `AND`, groups bring their own connector.
    fn write_criteria(&self, context: &mut Context, out: &mut StatementBuffer, value: &[Criterion]) {
        let and = self.expression_binary_op_precedence(&BinaryOpType::And);
        for (i, criterion) in value.iter().enumerate() {
            match criterion {
                Criterion::And(group) | Criterion::Or(group) => {
                    if i > 0 {
                        out.push_str(if matches!(criterion, Criterion::Or(..)) {
                            " OR "
                        } else {
                            " AND "
                        });
                    }
                    out.push('(');
                    self.write_criteria(context, out, group);
                    out.push(')');
                }
                _ => {
                    if i > 0 {
                        out.push_str(" AND ");
                    }
                    possibly_parenthesized!(
                        out,
                        criterion.precedence(self.as_dyn()) <= and,
                        criterion.write_query(self.as_dyn(), context, out)
                    );
                }
            }
        }
    }

    /// Render a single criterion other than a comparison.
    fn write_criterion(&self, context: &mut Context, out: &mut StatementBuffer, value: &Criterion) {
        match value {
            Criterion::Compare { op, lhs, rhs } => self.write_expression_binary_op(
                context,
                out,
                &BinaryOp {
                    op: *op,
                    lhs: lhs as &dyn Expression,
                    rhs: rhs as &dyn Expression,
                },
            ),
            Criterion::Like {
                operand,
                pattern,
                negated,
                escaped,
            } => {
                self.write_expression_binary_op(
                    context,
                    out,
                    &BinaryOp {
                        op: if *negated {
                            BinaryOpType::NotLike
                        } else {
                            BinaryOpType::Like
                        },
                        lhs: operand as &dyn Expression,
                        rhs: pattern as &dyn Expression,
                    },
                );
                if *escaped {
                    self.write_like_escape(context, out);
                }
            }
            Criterion::IsNull(v) | Criterion::IsNotNull(v) => {
                possibly_parenthesized!(
                    out,
                    v.precedence(self.as_dyn()) <= 400,
                    v.write_query(self.as_dyn(), context, out)
                );
                out.push_str(if matches!(value, Criterion::IsNull(..)) {
                    " IS NULL"
                } else {
                    " IS NOT NULL"
                });
            }
            Criterion::Between { operand, low, high } => {
                possibly_parenthesized!(
                    out,
                    operand.precedence(self.as_dyn()) <= 400,
                    operand.write_query(self.as_dyn(), context, out)
                );
                out.push_str(" BETWEEN ");
                low.write_query(self.as_dyn(), context, out);
                out.push_str(" AND ");
                high.write_query(self.as_dyn(), context, out);
            }
            Criterion::InList {
                operand,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // Nothing is in the empty list
                    out.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                possibly_parenthesized!(
                    out,
                    operand.precedence(self.as_dyn()) <= 400,
                    operand.write_query(self.as_dyn(), context, out)
                );
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                separated_by_statement(
                    out,
                    values,
                    |out, v| v.write_query(self.as_dyn(), context, out),
                    ", ",
                );
                out.push(')');
            }
            Criterion::Not(group) => {
                out.push_str("NOT (");
                self.write_criteria(context, out, group);
                out.push(')');
            }
            Criterion::And(group) | Criterion::Or(group) => {
                out.push('(');
                self.write_criteria(context, out, group);
                out.push(')');
            }
        }
    }

    /// Escape clause of the `LIKE` patterns produced by `starts_with`, `ends_with`, `contains`.
    fn write_like_escape(&self, _context: &mut Context, out: &mut StatementBuffer) {
        out.push_str(" ESCAPE '\\'");
    }

    /// Render join keyword(s) for the given join type.
    fn write_join_type(&self, _context: &mut Context, out: &mut String, join_type: &JoinType) {
        out.push_str(match &join_type {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        });
    }

    /// Render a JOIN clause.
    fn write_join(&self, context: &mut Context, out: &mut StatementBuffer, join: &JoinDef) {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        out.push('\n');
        self.write_join_type(&mut context.current, out, &join.join_type);
        out.push(' ');
        self.write_table_ref(&mut context.current, out, join.table());
        if !join.on.is_empty() {
            out.push_str(" ON ");
            self.write_criteria(&mut context.current, out, &join.on);
        }
    }

    /// Emit LIMIT and OFFSET.
    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut StatementBuffer,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        if let Some(limit) = limit {
            let _ = write!(out, "\nLIMIT {}", limit);
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }

    /// Emit the row locking suffix.
    fn write_for_update(&self, _context: &mut Context, out: &mut StatementBuffer) {
        out.push_str("\nFOR UPDATE");
    }

    /// Emit SELECT statement.
    fn write_select(
        &self,
        out: &mut StatementBuffer,
        table: &TableRef,
        columns: &[Arc<ColumnExpression>],
        clauses: &SelectClauses,
    ) {
        out.reserve(128 + columns.len() * 32);
        out.push_str("SELECT ");
        if clauses.distinct {
            out.push_str("DISTINCT ");
        }
        let mut context = Context::new(Fragment::SqlSelect, !clauses.joins.is_empty());
        separated_by_statement(
            out,
            columns,
            |out, col| {
                col.write_query(self.as_dyn(), &mut context, out);
            },
            ", ",
        );
        out.push_str("\nFROM ");
        self.write_table_ref(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            out,
            table,
        );
        for join in &clauses.joins {
            self.write_join(&mut context, out, join);
        }
        if !clauses.filter.is_empty() {
            out.push_str("\nWHERE ");
            self.write_criteria(
                &mut context.switch_fragment(Fragment::SqlSelectWhere).current,
                out,
                &clauses.filter,
            );
        }
        if !clauses.group_by.is_empty() {
            out.push_str("\nGROUP BY ");
            let mut group_context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            separated_by_statement(
                out,
                &clauses.group_by,
                |out, col| {
                    col.unsorted()
                        .write_query(self.as_dyn(), &mut group_context.current, out);
                },
                ", ",
            );
        }
        if !clauses.having.is_empty() {
            out.push_str("\nHAVING ");
            self.write_criteria(
                &mut context.switch_fragment(Fragment::SqlSelectHaving).current,
                out,
                &clauses.having,
            );
        }
        if !clauses.order_by.is_empty() {
            out.push_str("\nORDER BY ");
            let mut order_context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by_statement(
                out,
                &clauses.order_by,
                |out, col| {
                    col.write_query(self.as_dyn(), &mut order_context.current, out);
                },
                ", ",
            );
        }
        self.write_limit_offset(&mut context, out, clauses.limit, clauses.offset);
        if clauses.for_update {
            self.write_for_update(&mut context, out);
        }
        out.push(';');
    }

    /// Emit the keywords opening an insert.
    fn write_insert_into(&self, _context: &mut Context, out: &mut StatementBuffer, _ignore: bool) {
        out.push_str("INSERT INTO ");
    }

    /// Emit INSERT (single or multi row) optionally with a conflict clause.
    fn write_insert(
        &self,
        out: &mut StatementBuffer,
        table: &TableRef,
        columns: &[ColumnRef],
        rows: &[Vec<Operand>],
        upsert: Option<&UpsertClause>,
    ) {
        out.reserve(128 + columns.len() * 32 * rows.len().max(1));
        let mut context = Context::new(Fragment::SqlInsertInto, false);
        let ignore = matches!(upsert, Some(v) if v.action == DuplicateKeyAction::Ignore);
        self.write_insert_into(&mut context, out, ignore);
        self.write_table_ref(&mut context, out, &TableRef { alias: "".into(), ..table.clone() });
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, &v.name);
            },
            ", ",
        );
        out.push_str(") VALUES\n");
        let mut values_context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        separated_by_statement(
            out,
            rows,
            |out, row| {
                out.push('(');
                separated_by_statement(
                    out,
                    row,
                    |out, v| v.write_query(self.as_dyn(), &mut values_context.current, out),
                    ", ",
                );
                out.push(')');
            },
            ",\n",
        );
        if let Some(upsert) = upsert {
            self.write_upsert(
                &mut context.switch_fragment(Fragment::SqlInsertIntoOnConflict).current,
                out,
                upsert,
            );
        }
        out.push(';');
    }

    /// Emit the conflict clause of an insert.
    fn write_upsert(&self, context: &mut Context, out: &mut StatementBuffer, upsert: &UpsertClause) {
        out.push_str("\nON CONFLICT");
        if !upsert.keys.is_empty() {
            out.push_str(" (");
            separated_by(
                out,
                upsert.keys,
                |out, v| self.write_identifier_quoted(context, out, &v.name),
                ", ",
            );
            out.push(')');
        }
        match upsert.action {
            DuplicateKeyAction::Ignore => out.push_str(" DO NOTHING"),
            DuplicateKeyAction::Update => {
                out.push_str(" DO UPDATE SET\n");
                self.write_assignments(context, out, upsert.assignments, ",\n");
            }
        }
    }

    /// Emit `column = value` pairs.
    fn write_assignments(
        &self,
        context: &mut Context,
        out: &mut StatementBuffer,
        assignments: &[(ColumnRef, Operand)],
        separator: &str,
    ) {
        separated_by_statement(
            out,
            assignments,
            |out, (column, value)| {
                self.write_identifier_quoted(context, out, &column.name);
                out.push_str(" = ");
                value.write_query(self.as_dyn(), context, out);
            },
            separator,
        );
    }

    /// Emit UPDATE statement.
    fn write_update(
        &self,
        out: &mut StatementBuffer,
        table: &TableRef,
        assignments: &[(ColumnRef, Operand)],
        filter: &[Criterion],
    ) {
        out.reserve(128 + assignments.len() * 32);
        out.push_str("UPDATE ");
        let mut context = Context::new(Fragment::SqlUpdate, false);
        self.write_table_ref(&mut context, out, &TableRef { alias: "".into(), ..table.clone() });
        out.push_str("\nSET ");
        self.write_assignments(
            &mut context.switch_fragment(Fragment::SqlUpdateSet).current,
            out,
            assignments,
            ", ",
        );
        if !filter.is_empty() {
            out.push_str("\nWHERE ");
            self.write_criteria(
                &mut context.switch_fragment(Fragment::SqlUpdateWhere).current,
                out,
                filter,
            );
        }
        out.push(';');
    }

    /// Emit DELETE statement.
    fn write_delete(&self, out: &mut StatementBuffer, table: &TableRef, filter: &[Criterion]) {
        out.reserve(64 + table.name.len());
        out.push_str("DELETE FROM ");
        let mut context = Context::new(Fragment::SqlDeleteFrom, false);
        self.write_table_ref(&mut context, out, &TableRef { alias: "".into(), ..table.clone() });
        if !filter.is_empty() {
            out.push_str("\nWHERE ");
            Criteria(filter).write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlDeleteFromWhere).current,
                out,
            );
        }
        out.push(';');
    }

    /// Emit CREATE TABLE with columns and the primary key.
    fn write_create_table(&self, out: &mut StatementBuffer, table: &dyn TableMetamodel) {
        let columns = table.column_defs();
        let mut context = Context::new(Fragment::SqlCreateTable, false);
        out.reserve(128 + columns.len() * 64);
        out.push_str("CREATE TABLE ");
        self.write_table_ref(
            &mut context,
            out,
            &TableRef {
                alias: "".into(),
                ..table.table().clone()
            },
        );
        out.push_str(" (\n");
        separated_by(
            out,
            &columns,
            |out, v| {
                self.write_create_table_column_fragment(&mut context, out, v);
            },
            ",\n",
        );
        let primary_key = columns
            .iter()
            .filter(|v| v.primary_key == PrimaryKeyType::PartOfPrimaryKey)
            .collect::<Vec<_>>();
        if !primary_key.is_empty() {
            out.push_str(",\nPRIMARY KEY (");
            let mut pk_context = context.switch_fragment(Fragment::SqlCreateTablePrimaryKey);
            separated_by(
                out,
                primary_key,
                |out, v| {
                    self.write_identifier_quoted(&mut pk_context.current, out, &v.name);
                },
                ", ",
            );
            out.push(')');
        }
        out.push_str("\n);");
    }

    /// Emit single column definition fragment.
    fn write_create_table_column_fragment(
        &self,
        context: &mut Context,
        out: &mut String,
        column: &ColumnDef,
    ) {
        self.write_identifier_quoted(context, out, &column.name);
        out.push(' ');
        self.write_column_type(context, out, &column.value);
        if !column.nullable && column.primary_key == PrimaryKeyType::None {
            out.push_str(" NOT NULL");
        }
        if column.primary_key == PrimaryKeyType::PrimaryKey {
            // Composite primary key will be printed elsewhere
            out.push_str(" PRIMARY KEY");
        }
        if column.unique && column.primary_key != PrimaryKeyType::PrimaryKey {
            out.push_str(" UNIQUE");
        }
        if column.identity {
            self.write_identity(context, out);
        }
    }

    /// Emit the suffix of a column generated by the database.
    fn write_identity(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    /// Emit DROP TABLE statement.
    fn write_drop_table(&self, out: &mut StatementBuffer, table: &TableRef) {
        out.push_str("DROP TABLE IF EXISTS ");
        let mut context = Context::new(Fragment::SqlDropTable, false);
        self.write_table_ref(&mut context, out, &TableRef { alias: "".into(), ..table.clone() });
        out.push(';');
    }
}

/// Fallback generic SQL writer (closest to standard SQL and PostgreSQL conventions).
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;
impl GenericSqlWriter {
    /// Construct a new generic writer.
    pub fn new() -> Self {
        Self {}
    }
}
impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
