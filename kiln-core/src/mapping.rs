//! Conversion of result rows into entities, projections and records.

use crate::{
    AsValue, ColumnExpression, ProjectionType, PropertyExpression, QueryError, Result, RowLabeled,
    Value,
};
use std::{any, sync::Arc};

/// The values of `row` in the order of `columns`.
///
/// With [`ProjectionType::Name`] every column is looked up by its label, a column without label
/// or whose label is not reported falls back to its position.
pub fn extract(
    row: RowLabeled,
    columns: &[Arc<ColumnExpression>],
    projection_type: ProjectionType,
) -> Vec<Value> {
    match projection_type {
        ProjectionType::Index => {
            let mut values = Vec::from(row.values);
            values.truncate(columns.len());
            values
        }
        ProjectionType::Name => columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                column
                    .label()
                    .and_then(|label| row.get_column(label))
                    .or_else(|| row.values.get(i))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect(),
    }
}

fn column_name(columns: &[Arc<ColumnExpression>], position: usize) -> String {
    columns
        .get(position)
        .and_then(|v| v.label())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("#{position}"))
}

/// Fails on the first null value found scanning the columns left to right, every column across
/// the whole batch before moving to the next one.
pub fn check_not_null(columns: &[Arc<ColumnExpression>], rows: &[Vec<Value>]) -> Result<()> {
    for position in 0..columns.len() {
        for (row, values) in rows.iter().enumerate() {
            if values.get(position).is_none_or(Value::is_null) {
                return Err(QueryError::Mapping {
                    target: "projection".into(),
                    property: column_name(columns, position),
                    row,
                    message: format!("The column at position {position} is null"),
                }
                .into());
            }
        }
    }
    Ok(())
}

fn decode_at<T: AsValue>(
    columns: &[Arc<ColumnExpression>],
    value: Option<Value>,
    position: usize,
    row: usize,
) -> Result<T> {
    let value = value.unwrap_or(Value::Null);
    T::try_from_value(value).map_err(|e| {
        QueryError::Mapping {
            target: "projection".into(),
            property: column_name(columns, position),
            row,
            message: format!("{e:#} (expected {})", any::type_name::<T>()),
        }
        .into()
    })
}

/// Column expressions selected in place of the entity, and how each row becomes a value.
pub trait Projection: Send + Sync + 'static {
    /// Every column nullable.
    type Output: Send + 'static;
    /// Every column required.
    type NotNullOutput: Send + 'static;

    fn expressions(&self) -> Vec<Arc<ColumnExpression>>;
    fn decode(&self, values: Vec<Value>, row: usize) -> Result<Self::Output>;
    /// Decodes a row already checked by [`check_not_null`].
    fn decode_not_null(&self, values: Vec<Value>, row: usize) -> Result<Self::NotNullOutput>;
}

impl<T: AsValue + Send + 'static> Projection for PropertyExpression<T> {
    type Output = Option<T>;
    type NotNullOutput = T;

    fn expressions(&self) -> Vec<Arc<ColumnExpression>> {
        vec![self.erase()]
    }
    fn decode(&self, values: Vec<Value>, row: usize) -> Result<Self::Output> {
        decode_at(&self.expressions(), values.into_iter().next(), 0, row)
    }
    fn decode_not_null(&self, values: Vec<Value>, row: usize) -> Result<Self::NotNullOutput> {
        decode_at(&self.expressions(), values.into_iter().next(), 0, row)
    }
}

macro_rules! impl_projection_tuple {
    ($($T:ident $i:tt),+) => {
        impl<$($T: AsValue + Send + 'static),+> Projection for ($(PropertyExpression<$T>,)+) {
            type Output = ($(Option<$T>,)+);
            type NotNullOutput = ($($T,)+);

            fn expressions(&self) -> Vec<Arc<ColumnExpression>> {
                vec![$(self.$i.erase()),+]
            }
            fn decode(&self, values: Vec<Value>, row: usize) -> Result<Self::Output> {
                let columns = self.expressions();
                let mut it = values.into_iter();
                Ok(($(decode_at::<Option<$T>>(&columns, it.next(), $i, row)?,)+))
            }
            fn decode_not_null(&self, values: Vec<Value>, row: usize) -> Result<Self::NotNullOutput> {
                let columns = self.expressions();
                let mut it = values.into_iter();
                Ok(($(decode_at::<$T>(&columns, it.next(), $i, row)?,)+))
            }
        }
    };
}
impl_projection_tuple!(A 0);
impl_projection_tuple!(A 0, B 1);
impl_projection_tuple!(A 0, B 1, C 2);
impl_projection_tuple!(A 0, B 1, C 2, D 3);
impl_projection_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_projection_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);

/// A result row keyed by the expressions that were selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[Arc<ColumnExpression>]>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(columns: Arc<[Arc<ColumnExpression>]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[Arc<ColumnExpression>] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn position(&self, expression: &Arc<ColumnExpression>) -> Option<usize> {
        self.columns
            .iter()
            .position(|v| Arc::ptr_eq(v, expression))
            .or_else(|| self.columns.iter().position(|v| v == expression))
    }

    /// The value of `expression`, which must be one of the selected expressions.
    pub fn get<T: AsValue>(&self, expression: &PropertyExpression<T>) -> Result<Option<T>> {
        let Some(position) = self.position(expression.expression()) else {
            return Err(QueryError::Mapping {
                target: "record".into(),
                property: format!("{expression:?}"),
                row: 0,
                message: "The expression was not selected".into(),
            }
            .into());
        };
        decode_at(&self.columns, self.values.get(position).cloned(), position, 0)
    }

    /// The value of `expression`, failing when it is null.
    pub fn get_not_null<T: AsValue>(&self, expression: &PropertyExpression<T>) -> Result<T> {
        self.get(expression)?.ok_or_else(|| {
            QueryError::Mapping {
                target: "record".into(),
                property: format!("{expression:?}"),
                row: 0,
                message: "The value is null".into(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnRef, TableRef};

    fn column<T>(name: &'static str) -> PropertyExpression<T> {
        PropertyExpression::column(ColumnRef::new(TableRef::new("EMPLOYEE"), name))
    }

    #[test]
    fn name_strategy_follows_labels() {
        let id = column::<i32>("ID");
        let name = column::<String>("NAME");
        let row = RowLabeled::new(
            vec!["NAME".to_string(), "ID".to_string()].into(),
            vec![Value::Varchar(Some("Ann".into())), Value::Int32(Some(7))].into(),
        );
        let values = extract(row, &[id.erase(), name.erase()], ProjectionType::Name);
        assert_eq!(
            values,
            vec![Value::Int32(Some(7)), Value::Varchar(Some("Ann".into()))]
        );
    }

    #[test]
    fn first_null_position_is_reported() {
        let projection = (column::<i32>("ID"), column::<String>("NAME"), column::<i32>("AGE"));
        let rows = vec![
            vec![Value::Int32(Some(1)), Value::Varchar(Some("a".into())), Value::Int32(Some(3))],
            vec![Value::Int32(Some(2)), Value::Varchar(Some("b".into())), Value::Int32(None)],
            vec![Value::Int32(Some(3)), Value::Varchar(None), Value::Int32(Some(3))],
        ];
        let error = check_not_null(&projection.expressions(), &rows).unwrap_err();
        assert_eq!(
            QueryError::find(&error),
            Some(&QueryError::Mapping {
                target: "projection".into(),
                property: "NAME".into(),
                row: 2,
                message: "The column at position 1 is null".into(),
            })
        );
    }

    #[test]
    fn records_are_keyed_by_expression() {
        let id = column::<i32>("ID");
        let name = column::<String>("NAME");
        let record = Record::new(
            vec![id.erase(), name.erase()].into(),
            vec![Value::Int32(Some(5)), Value::Varchar(None)],
        );
        assert_eq!(record.get(&id).unwrap(), Some(5));
        assert_eq!(record.get(&name).unwrap(), None);
        assert!(QueryError::is_mapping(&record.get_not_null(&name).unwrap_err()));
        assert!(record.get(&column::<i32>("AGE")).is_err());
    }
}
