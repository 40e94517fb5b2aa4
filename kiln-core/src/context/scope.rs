use crate::{AsValue, BinaryOpType, ColumnExpression, Criterion, IntoOperand, Operand, PropertyExpression};
use std::sync::Arc;

/// Collects the criteria of a where, having or join clause.
///
/// Every method appends one criterion, consecutive criteria are joined with `AND`. The `and`,
/// `or` and `not` methods open a nested group.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct WhereScope {
    criteria: Vec<Criterion>,
}

impl WhereScope {
    pub fn new() -> Self {
        Default::default()
    }

    /// Runs `f` on a fresh scope and returns the collected criteria.
    pub fn build(f: impl FnOnce(&mut WhereScope)) -> Vec<Criterion> {
        let mut scope = WhereScope::new();
        f(&mut scope);
        scope.criteria
    }

    pub fn push(&mut self, criterion: Criterion) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    fn compare<T>(
        &mut self,
        op: BinaryOpType,
        lhs: &PropertyExpression<T>,
        rhs: impl IntoOperand<T>,
    ) -> &mut Self {
        self.push(Criterion::Compare {
            op,
            lhs: Operand::Column(lhs.erase()),
            rhs: rhs.into_operand(),
        })
    }

    pub fn eq<T>(&mut self, lhs: &PropertyExpression<T>, rhs: impl IntoOperand<T>) -> &mut Self {
        self.compare(BinaryOpType::Equal, lhs, rhs)
    }
    pub fn ne<T>(&mut self, lhs: &PropertyExpression<T>, rhs: impl IntoOperand<T>) -> &mut Self {
        self.compare(BinaryOpType::NotEqual, lhs, rhs)
    }
    pub fn lt<T>(&mut self, lhs: &PropertyExpression<T>, rhs: impl IntoOperand<T>) -> &mut Self {
        self.compare(BinaryOpType::Less, lhs, rhs)
    }
    pub fn le<T>(&mut self, lhs: &PropertyExpression<T>, rhs: impl IntoOperand<T>) -> &mut Self {
        self.compare(BinaryOpType::LessEqual, lhs, rhs)
    }
    pub fn gt<T>(&mut self, lhs: &PropertyExpression<T>, rhs: impl IntoOperand<T>) -> &mut Self {
        self.compare(BinaryOpType::Greater, lhs, rhs)
    }
    pub fn ge<T>(&mut self, lhs: &PropertyExpression<T>, rhs: impl IntoOperand<T>) -> &mut Self {
        self.compare(BinaryOpType::GreaterEqual, lhs, rhs)
    }

    pub fn is_null<T>(&mut self, operand: &PropertyExpression<T>) -> &mut Self {
        self.push(Criterion::IsNull(Operand::Column(operand.erase())))
    }
    pub fn is_not_null<T>(&mut self, operand: &PropertyExpression<T>) -> &mut Self {
        self.push(Criterion::IsNotNull(Operand::Column(operand.erase())))
    }

    /// `LIKE` with a pattern written by the caller, wildcards included.
    pub fn like(
        &mut self,
        operand: &PropertyExpression<String>,
        pattern: impl IntoOperand<String>,
    ) -> &mut Self {
        self.like_pattern(operand, pattern.into_operand(), false, false)
    }
    pub fn not_like(
        &mut self,
        operand: &PropertyExpression<String>,
        pattern: impl IntoOperand<String>,
    ) -> &mut Self {
        self.like_pattern(operand, pattern.into_operand(), true, false)
    }
    pub fn starts_with(&mut self, operand: &PropertyExpression<String>, prefix: &str) -> &mut Self {
        let pattern = format!("{}%", escape_like(prefix));
        self.like_pattern(operand, IntoOperand::<String>::into_operand(pattern), false, true)
    }
    pub fn ends_with(&mut self, operand: &PropertyExpression<String>, suffix: &str) -> &mut Self {
        let pattern = format!("%{}", escape_like(suffix));
        self.like_pattern(operand, IntoOperand::<String>::into_operand(pattern), false, true)
    }
    pub fn contains(&mut self, operand: &PropertyExpression<String>, infix: &str) -> &mut Self {
        let pattern = format!("%{}%", escape_like(infix));
        self.like_pattern(operand, IntoOperand::<String>::into_operand(pattern), false, true)
    }
    fn like_pattern(
        &mut self,
        operand: &PropertyExpression<String>,
        pattern: Operand,
        negated: bool,
        escaped: bool,
    ) -> &mut Self {
        self.push(Criterion::Like {
            operand: Operand::Column(operand.erase()),
            pattern,
            negated,
            escaped,
        })
    }

    pub fn between<T>(
        &mut self,
        operand: &PropertyExpression<T>,
        low: impl IntoOperand<T>,
        high: impl IntoOperand<T>,
    ) -> &mut Self {
        self.push(Criterion::Between {
            operand: Operand::Column(operand.erase()),
            low: low.into_operand(),
            high: high.into_operand(),
        })
    }

    pub fn in_list<T, V: IntoOperand<T>>(
        &mut self,
        operand: &PropertyExpression<T>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push(Criterion::InList {
            operand: Operand::Column(operand.erase()),
            values: values.into_iter().map(IntoOperand::<T>::into_operand).collect(),
            negated: false,
        })
    }
    pub fn not_in_list<T, V: IntoOperand<T>>(
        &mut self,
        operand: &PropertyExpression<T>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push(Criterion::InList {
            operand: Operand::Column(operand.erase()),
            values: values.into_iter().map(IntoOperand::<T>::into_operand).collect(),
            negated: true,
        })
    }

    /// Parenthesized group joined with `AND`.
    pub fn and(&mut self, f: impl FnOnce(&mut WhereScope)) -> &mut Self {
        let group = WhereScope::build(f);
        if group.is_empty() {
            return self;
        }
        self.push(Criterion::And(group))
    }
    /// Parenthesized group joined with `OR` to everything collected before it.
    pub fn or(&mut self, f: impl FnOnce(&mut WhereScope)) -> &mut Self {
        let group = WhereScope::build(f);
        if group.is_empty() {
            return self;
        }
        self.push(Criterion::Or(group))
    }
    pub fn not(&mut self, f: impl FnOnce(&mut WhereScope)) -> &mut Self {
        let group = WhereScope::build(f);
        if group.is_empty() {
            return self;
        }
        self.push(Criterion::Not(group))
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Escapes the `LIKE` wildcards with a backslash.
pub fn escape_like(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// `column = value` inside a set clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Must be a property, anything else is rejected when the statement is built.
    pub column: Arc<ColumnExpression>,
    pub value: Operand,
}

/// Collects the assignments of a set clause.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SetScope {
    assignments: Vec<Assignment>,
}

impl SetScope {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(f: impl FnOnce(&mut SetScope)) -> Vec<Assignment> {
        let mut scope = SetScope::new();
        f(&mut scope);
        scope.assignments
    }

    pub fn set<T>(&mut self, property: &PropertyExpression<T>, value: impl IntoOperand<T>) -> &mut Self {
        self.assignments.push(Assignment {
            column: property.erase(),
            value: value.into_operand(),
        });
        self
    }

    pub fn set_null<T: AsValue>(&mut self, property: &PropertyExpression<T>) -> &mut Self {
        self.assignments.push(Assignment {
            column: property.erase(),
            value: Operand::Parameter(T::as_empty_value()),
        });
        self
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnRef, TableRef, Value};

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        let name = PropertyExpression::<String>::column(ColumnRef::new(TableRef::new("EMPLOYEE"), "NAME"));
        let criteria = WhereScope::build(|w| {
            w.starts_with(&name, "A_");
        });
        assert_eq!(
            criteria,
            vec![Criterion::Like {
                operand: Operand::Column(name.erase()),
                pattern: Operand::Parameter(Value::Varchar(Some("A\\_%".into()))),
                negated: false,
                escaped: true,
            }]
        );
    }

    #[test]
    fn empty_groups_are_dropped() {
        let criteria = WhereScope::build(|w| {
            w.or(|_| {});
        });
        assert!(criteria.is_empty());
    }
}
