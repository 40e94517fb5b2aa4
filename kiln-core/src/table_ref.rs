use crate::{
    Expression, OpPrecedence,
    writer::{Context, SqlWriter, StatementBuffer},
};
use std::borrow::Cow;

/// Reference to a table as it appears in a statement.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    /// Schema name (may be empty).
    pub schema: Cow<'static, str>,
    /// Alias declared in `FROM` and `JOIN` (may be empty).
    pub alias: Cow<'static, str>,
    /// Stands for the row that was proposed for insertion inside an upsert clause.
    pub excluded: bool,
}

impl TableRef {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn with_alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.alias = alias.into();
        self
    }
    pub fn as_excluded(&self) -> Self {
        Self {
            excluded: true,
            alias: Cow::Borrowed(""),
            ..self.clone()
        }
    }
    pub fn full_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl OpPrecedence for TableRef {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for TableRef {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut StatementBuffer) {
        writer.write_table_ref(context, out, self);
    }
}
