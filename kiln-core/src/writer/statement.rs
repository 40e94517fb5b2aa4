use crate::{
    Value,
    writer::{Context, SqlWriter},
};
use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut, Range},
};

/// SQL text together with the ordered values bound to its placeholders.
///
/// Two statements are equal when both the text and the arguments are equal.
#[derive(Default, Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
    placeholders: Vec<Range<usize>>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
            placeholders: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Appends `other` on a new line, its placeholders are shifted accordingly.
    pub fn append(&mut self, other: Statement) {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql.push('\n');
        }
        let offset = self.sql.len();
        self.sql.push_str(&other.sql);
        self.placeholders.extend(
            other
                .placeholders
                .into_iter()
                .map(|v| (v.start + offset)..(v.end + offset)),
        );
        self.args.extend(other.args);
    }

    /// The text with every placeholder replaced by the literal rendering of its argument.
    ///
    /// Meant for logging and dry runs, never for execution.
    pub fn to_sql_with_args(&self, writer: &dyn SqlWriter) -> String {
        if self.placeholders.len() != self.args.len() {
            return self.sql.clone();
        }
        let mut context = Context::default();
        let mut out = String::with_capacity(self.sql.len() + self.args.len() * 8);
        let mut position = 0;
        for (range, value) in self.placeholders.iter().zip(&self.args) {
            out.push_str(&self.sql[position..range.start]);
            writer.write_value(&mut context, &mut out, value);
            position = range.end;
        }
        out.push_str(&self.sql[position..]);
        out
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.sql == other.sql && self.args == other.args
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Output buffer of the sql writer, it derefs to the text being written.
#[derive(Default, Debug)]
pub struct StatementBuffer {
    sql: String,
    args: Vec<Value>,
    placeholders: Vec<Range<usize>>,
}

impl StatementBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Writes the next placeholder and records `value` as its argument.
    pub fn bind(&mut self, writer: &dyn SqlWriter, context: &mut Context, value: Value) {
        let start = self.sql.len();
        writer.write_placeholder(context, &mut self.sql, self.args.len());
        self.placeholders.push(start..self.sql.len());
        self.args.push(value);
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            args: self.args,
            placeholders: self.placeholders,
        }
    }
}

impl Deref for StatementBuffer {
    type Target = String;
    fn deref(&self) -> &Self::Target {
        &self.sql
    }
}

impl DerefMut for StatementBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sql
    }
}
