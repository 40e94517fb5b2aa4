use crate::{
    Expression, OpPrecedence, TableRef, Value,
    writer::{Context, SqlWriter, StatementBuffer},
};
use std::borrow::Cow;

/// Reference to a column of a (possibly aliased) table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Column name.
    pub name: Cow<'static, str>,
    /// Table owning the column.
    pub table: TableRef,
}

impl ColumnRef {
    pub fn new(table: TableRef, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// Indicates how (or if) a column participates in the primary key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Single-column primary key.
    PrimaryKey,
    /// Member of a composite primary key.
    PartOfPrimaryKey,
    /// Not part of the primary key.
    #[default]
    None,
}

/// Declarative description of a table column, used by schema statements.
#[derive(Default, Debug, Clone)]
pub struct ColumnDef {
    pub name: Cow<'static, str>,
    /// Typed null describing the column type.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: PrimaryKeyType,
    /// Single column unique constraint.
    pub unique: bool,
    /// Value generated by the database on insert.
    pub identity: bool,
}

impl OpPrecedence for ColumnRef {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for ColumnRef {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut StatementBuffer) {
        writer.write_column_ref(context, out, self);
    }
}
