use crate::{AggregateFunction, AsValue, BinaryOpType, ColumnExpression, ColumnRef, Operand, Order, Value};
use rust_decimal::Decimal;
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    marker::PhantomData,
    ops::{Add, Div, Mul, Rem, Sub},
    sync::Arc,
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Typed handle to a column expression, `T` is the Rust type of the produced values.
///
/// Handles are immutable: `asc`, `desc` and `alias` return new handles and the arithmetic
/// operators build new expressions out of their operands.
pub struct PropertyExpression<T> {
    expression: Arc<ColumnExpression>,
    _type: PhantomData<fn() -> T>,
}

impl<T> PropertyExpression<T> {
    pub fn new(expression: ColumnExpression) -> Self {
        Self::from_arc(Arc::new(expression))
    }
    pub fn from_arc(expression: Arc<ColumnExpression>) -> Self {
        Self {
            expression,
            _type: PhantomData,
        }
    }
    pub fn column(column: ColumnRef) -> Self {
        Self::new(ColumnExpression::Property(column))
    }
    pub fn expression(&self) -> &Arc<ColumnExpression> {
        &self.expression
    }
    /// The untyped expression, used for heterogeneous projections and orderings.
    pub fn erase(&self) -> Arc<ColumnExpression> {
        self.expression.clone()
    }
    /// Same expression instance, not just an equal one.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.expression, &other.expression)
    }
    pub fn asc(&self) -> Self {
        self.sorted(Order::ASC)
    }
    pub fn desc(&self) -> Self {
        self.sorted(Order::DESC)
    }
    fn sorted(&self, order: Order) -> Self {
        let expression = match self.expression.as_ref() {
            ColumnExpression::Sorted { order: current, .. } if *current == order => {
                return self.clone();
            }
            ColumnExpression::Sorted { expression, .. } => expression.clone(),
            _ => self.expression.clone(),
        };
        Self::new(ColumnExpression::Sorted { order, expression })
    }
    pub fn alias(&self, alias: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ColumnExpression::Alias {
            expression: self.expression.clone(),
            alias: alias.into(),
        })
    }
}

impl<T> Clone for PropertyExpression<T> {
    fn clone(&self) -> Self {
        Self::from_arc(self.expression.clone())
    }
}

impl<T> PartialEq for PropertyExpression<T> {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl<T> Debug for PropertyExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyExpression")
            .field(&self.expression)
            .finish()
    }
}

impl<T> From<&PropertyExpression<T>> for Arc<ColumnExpression> {
    fn from(value: &PropertyExpression<T>) -> Self {
        value.erase()
    }
}

/// Anything usable where an expression of type `T` is expected: another expression of the same
/// type or a value that will be bound as a parameter.
pub trait IntoOperand<T> {
    fn into_operand(self) -> Operand;
}

impl<T> IntoOperand<T> for PropertyExpression<T> {
    fn into_operand(self) -> Operand {
        Operand::Column(self.expression)
    }
}

impl<T> IntoOperand<T> for &PropertyExpression<T> {
    fn into_operand(self) -> Operand {
        Operand::Column(self.expression.clone())
    }
}

impl<T: AsValue> IntoOperand<T> for Option<T> {
    fn into_operand(self) -> Operand {
        Operand::Parameter(self.as_value())
    }
}

impl<T> IntoOperand<T> for Value {
    fn into_operand(self) -> Operand {
        Operand::Parameter(self)
    }
}

impl IntoOperand<String> for &str {
    fn into_operand(self) -> Operand {
        Operand::Parameter(Value::Varchar(Some(self.into())))
    }
}

impl IntoOperand<String> for &String {
    fn into_operand(self) -> Operand {
        Operand::Parameter(Value::Varchar(Some(self.clone())))
    }
}

macro_rules! impl_into_operand {
    ($($source:ty),+ $(,)?) => {
        $(
            impl IntoOperand<$source> for $source {
                fn into_operand(self) -> Operand {
                    Operand::Parameter(self.as_value())
                }
            }
        )+
    };
}
impl_into_operand!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    Decimal,
    String,
    Vec<u8>,
    Date,
    Time,
    PrimitiveDateTime,
    OffsetDateTime,
    Uuid,
);

/// Types supporting arithmetic and `sum` / `avg`.
pub trait Numeric: AsValue {}
impl Numeric for i16 {}
impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for f32 {}
impl Numeric for f64 {}
impl Numeric for Decimal {}

macro_rules! impl_arithmetic {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Numeric, R: IntoOperand<T>> $trait<R> for PropertyExpression<T> {
            type Output = PropertyExpression<T>;
            fn $method(self, rhs: R) -> Self::Output {
                PropertyExpression::new(ColumnExpression::Arithmetic {
                    op: $op,
                    lhs: Operand::Column(self.expression),
                    rhs: rhs.into_operand(),
                })
            }
        }
        impl<T: Numeric, R: IntoOperand<T>> $trait<R> for &PropertyExpression<T> {
            type Output = PropertyExpression<T>;
            fn $method(self, rhs: R) -> Self::Output {
                PropertyExpression::new(ColumnExpression::Arithmetic {
                    op: $op,
                    lhs: Operand::Column(self.expression.clone()),
                    rhs: rhs.into_operand(),
                })
            }
        }
    };
}
impl_arithmetic!(Add, add, BinaryOpType::Addition);
impl_arithmetic!(Sub, sub, BinaryOpType::Subtraction);
impl_arithmetic!(Mul, mul, BinaryOpType::Multiplication);
impl_arithmetic!(Div, div, BinaryOpType::Division);
impl_arithmetic!(Rem, rem, BinaryOpType::Remainder);

/// String concatenation, each side is either a string expression or a string value.
pub fn concat(
    lhs: impl IntoOperand<String>,
    rhs: impl IntoOperand<String>,
) -> PropertyExpression<String> {
    PropertyExpression::new(ColumnExpression::Concat {
        lhs: lhs.into_operand(),
        rhs: rhs.into_operand(),
    })
}

/// `count(*)`
pub fn count() -> PropertyExpression<i64> {
    PropertyExpression::new(ColumnExpression::Aggregate(AggregateFunction::CountAsterisk))
}

/// `count(expression)`, counts the non null values.
pub fn count_of<T>(expression: &PropertyExpression<T>) -> PropertyExpression<i64> {
    PropertyExpression::new(ColumnExpression::Aggregate(AggregateFunction::Count(
        expression.erase(),
    )))
}

pub fn sum<T: Numeric>(expression: &PropertyExpression<T>) -> PropertyExpression<T> {
    PropertyExpression::new(ColumnExpression::Aggregate(AggregateFunction::Sum(
        expression.erase(),
    )))
}

pub fn avg<T: Numeric>(expression: &PropertyExpression<T>) -> PropertyExpression<f64> {
    PropertyExpression::new(ColumnExpression::Aggregate(AggregateFunction::Avg(
        expression.erase(),
    )))
}

pub fn min<T>(expression: &PropertyExpression<T>) -> PropertyExpression<T> {
    PropertyExpression::new(ColumnExpression::Aggregate(AggregateFunction::Min(
        expression.erase(),
    )))
}

pub fn max<T>(expression: &PropertyExpression<T>) -> PropertyExpression<T> {
    PropertyExpression::new(ColumnExpression::Aggregate(AggregateFunction::Max(
        expression.erase(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableRef;

    fn street() -> PropertyExpression<String> {
        PropertyExpression::column(ColumnRef::new(TableRef::new("ADDRESS"), "STREET"))
    }

    #[test]
    fn sorting_is_idempotent() {
        let asc = street().asc();
        assert!(asc.asc().ptr_eq(&asc));
        let desc = asc.desc();
        assert!(matches!(
            desc.expression().as_ref(),
            ColumnExpression::Sorted { order: Order::DESC, expression } if **expression == *street().expression().as_ref()
        ));
        assert!(desc.desc().ptr_eq(&desc));
    }

    #[test]
    fn arithmetic_builds_new_expressions() {
        let id = PropertyExpression::<i32>::column(ColumnRef::new(TableRef::new("ADDRESS"), "ADDRESS_ID"));
        let sum = &id + 1;
        let ColumnExpression::Arithmetic { op, lhs, rhs } = sum.expression().as_ref() else {
            panic!("Expected an arithmetic expression");
        };
        assert_eq!(*op, BinaryOpType::Addition);
        assert_eq!(*lhs, Operand::Column(id.erase()));
        assert_eq!(*rhs, Operand::Parameter(Value::Int32(Some(1))));
        let product = id.clone() * &id;
        assert!(matches!(
            product.expression().as_ref(),
            ColumnExpression::Arithmetic { op: BinaryOpType::Multiplication, .. }
        ));
    }
}
