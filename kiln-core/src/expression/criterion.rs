use crate::{
    BinaryOp, BinaryOpType, Expression, OpPrecedence, Operand,
    writer::{Context, SqlWriter, StatementBuffer},
};

/// Boolean condition tree used by where, having and join clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Compare {
        op: BinaryOpType,
        lhs: Operand,
        rhs: Operand,
    },
    /// `LIKE`, with `escaped` the pattern escapes its wildcards with a backslash.
    Like {
        operand: Operand,
        pattern: Operand,
        negated: bool,
        escaped: bool,
    },
    IsNull(Operand),
    IsNotNull(Operand),
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
    },
    InList {
        operand: Operand,
        values: Vec<Operand>,
        negated: bool,
    },
    /// Group joined to the preceding criteria with `AND`.
    And(Vec<Criterion>),
    /// Group joined to the preceding criteria with `OR`.
    Or(Vec<Criterion>),
    Not(Vec<Criterion>),
}

impl OpPrecedence for Criterion {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        match self {
            Criterion::Compare { op, .. } => writer.expression_binary_op_precedence(op),
            Criterion::Like { .. } => 400,
            Criterion::IsNull(..) | Criterion::IsNotNull(..) => 400,
            Criterion::Between { .. } | Criterion::InList { .. } => 400,
            Criterion::Not(..) => 250,
            Criterion::And(..) | Criterion::Or(..) => 1_000_000,
        }
    }
}

impl Expression for Criterion {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut StatementBuffer) {
        match self {
            Criterion::Compare { op, lhs, rhs } => writer.write_expression_binary_op(
                context,
                out,
                &BinaryOp {
                    op: *op,
                    lhs: lhs as &dyn Expression,
                    rhs: rhs as &dyn Expression,
                },
            ),
            _ => writer.write_criterion(context, out, self),
        }
    }
}

/// Conjunction of criteria, rendered through `SqlWriter::write_criteria`.
#[derive(Debug)]
pub struct Criteria<'a>(pub &'a [Criterion]);

impl<'a> OpPrecedence for Criteria<'a> {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        match self.0 {
            [single] => single.precedence(writer),
            _ => writer.expression_binary_op_precedence(&BinaryOpType::And),
        }
    }
}

impl<'a> Expression for Criteria<'a> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut StatementBuffer) {
        writer.write_criteria(context, out, self.0);
    }
}
