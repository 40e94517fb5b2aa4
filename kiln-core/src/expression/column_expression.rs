use crate::{
    BinaryOpType, ColumnRef, Expression, OpPrecedence, Value,
    writer::{Context, SqlWriter, StatementBuffer},
};
use std::{borrow::Cow, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateFunction {
    /// `count(*)`
    CountAsterisk,
    Count(Arc<ColumnExpression>),
    Sum(Arc<ColumnExpression>),
    Avg(Arc<ColumnExpression>),
    Min(Arc<ColumnExpression>),
    Max(Arc<ColumnExpression>),
}

/// Expression producing a column value: a property, a computation over properties, an
/// aggregate, or one of those wrapped with a sort order or an alias.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpression {
    Property(ColumnRef),
    Arithmetic {
        op: BinaryOpType,
        lhs: Operand,
        rhs: Operand,
    },
    Concat {
        lhs: Operand,
        rhs: Operand,
    },
    Aggregate(AggregateFunction),
    Sorted {
        order: Order,
        expression: Arc<ColumnExpression>,
    },
    Alias {
        expression: Arc<ColumnExpression>,
        alias: Cow<'static, str>,
    },
}

impl ColumnExpression {
    /// The expression without any sort order.
    pub fn unsorted(&self) -> &ColumnExpression {
        match self {
            ColumnExpression::Sorted { expression, .. } => expression.unsorted(),
            v => v,
        }
    }

    /// The referenced column, when this is a (possibly sorted or aliased) property.
    pub fn column_ref(&self) -> Option<&ColumnRef> {
        match self {
            ColumnExpression::Property(v) => Some(v),
            ColumnExpression::Sorted { expression, .. }
            | ColumnExpression::Alias { expression, .. } => expression.column_ref(),
            _ => None,
        }
    }

    /// Name a transport is expected to report for this column in a result set.
    pub fn label(&self) -> Option<&str> {
        match self {
            ColumnExpression::Property(v) => Some(&v.name),
            ColumnExpression::Alias { alias, .. } => Some(alias),
            ColumnExpression::Sorted { expression, .. } => expression.label(),
            _ => None,
        }
    }
}

impl OpPrecedence for ColumnExpression {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        match self {
            ColumnExpression::Arithmetic { op, .. } => writer.expression_binary_op_precedence(op),
            ColumnExpression::Sorted { expression, .. }
            | ColumnExpression::Alias { expression, .. } => expression.precedence(writer),
            _ => 1_000_000,
        }
    }
}

impl Expression for ColumnExpression {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut StatementBuffer) {
        writer.write_column_expression(context, out, self);
    }
}

/// Either side of a binary expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(Arc<ColumnExpression>),
    /// Bound as a statement argument.
    Parameter(Value),
}

impl OpPrecedence for Operand {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        match self {
            Operand::Column(v) => v.precedence(writer),
            Operand::Parameter(..) => 1_000_000,
        }
    }
}

impl Expression for Operand {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut StatementBuffer) {
        match self {
            Operand::Column(v) => v.write_query(writer, context, out),
            Operand::Parameter(v) => writer.write_parameter(context, out, v),
        }
    }
}
