//! Composable description of database work.
//!
//! A [`Query`] performs no I/O until a visitor interprets it: [`Query::run`] over a blocking
//! transport, [`Query::run_stream`] over a streaming one and [`Query::dry_run`] over none. All
//! the primitives of a query run on the transport given to the visitor, one after the other.

mod dsl;
mod visitor;

pub use dsl::*;
pub use visitor::*;

use crate::{
    DatabaseConfig, Error, Result, Runner, Statement, StreamTransport, Transport, Value,
};
use futures::future::BoxFuture;
use std::{
    fmt::{self, Debug},
    ops::Add,
    sync::Arc,
};

/// Database work producing `T`.
///
/// Every variant but `Primitive` combines other queries, its node knows the types of the
/// queries it contains.
pub enum Query<T> {
    Primitive(Arc<dyn Runner<T>>),
    Map(Arc<dyn Combinator<T>>),
    FlatMap(Arc<dyn Combinator<T>>),
    Zip(Arc<dyn Combinator<T>>),
    FlatZip(Arc<dyn Combinator<T>>),
    AndThen(Arc<dyn Combinator<T>>),
    Concat(Arc<dyn Combinator<T>>),
}

/// A combining node, it dispatches itself to the typed method of each visitor.
pub trait Combinator<T>: Send + Sync {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<T>;
    fn accept_stream<'a>(&'a self, visitor: &'a mut StreamVisitor<'_>) -> BoxFuture<'a, Result<T>>;
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()>;
    fn describe(&self) -> String;
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        match self {
            Query::Primitive(v) => Query::Primitive(v.clone()),
            Query::Map(v) => Query::Map(v.clone()),
            Query::FlatMap(v) => Query::FlatMap(v.clone()),
            Query::Zip(v) => Query::Zip(v.clone()),
            Query::FlatZip(v) => Query::FlatZip(v.clone()),
            Query::AndThen(v) => Query::AndThen(v.clone()),
            Query::Concat(v) => Query::Concat(v.clone()),
        }
    }
}

impl<T> Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({})", self.describe())
    }
}

impl<T: Send + 'static> Query<T> {
    pub fn primitive(runner: impl Runner<T> + 'static) -> Self {
        Query::Primitive(Arc::new(runner))
    }

    /// Runs the query on a blocking transport.
    pub fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<T> {
        BlockingVisitor::new(transport, config).visit(self)
    }

    /// Runs the query on a streaming transport.
    pub fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<T>> {
        Box::pin(async move { StreamVisitor::new(transport, config).visit(self).await })
    }

    /// The statements the query would execute. It never fails, an error while compiling is
    /// reported inside the result.
    pub fn dry_run(&self, config: &DatabaseConfig) -> DryRunResult {
        DryRunResult::new(self, config, self.describe())
    }

    /// Dry run using the generic dialect.
    pub fn dry_run_default(&self) -> DryRunResult {
        let config = DatabaseConfig::dry_run();
        let description = format!(
            "{} (default dry run configuration, {} dialect)",
            self.describe(),
            config.dialect.name()
        );
        DryRunResult::new(self, &config, description)
    }
}

impl<T> Query<T> {
    pub fn describe(&self) -> String {
        match self {
            Query::Primitive(v) => v.describe(),
            Query::Map(v)
            | Query::FlatMap(v)
            | Query::Zip(v)
            | Query::FlatZip(v)
            | Query::AndThen(v)
            | Query::Concat(v) => v.describe(),
        }
    }
}

/// Outcome of a dry run: the compiled statements joined by new lines, or the error that
/// prevented compiling them.
#[derive(Debug)]
pub struct DryRunResult {
    /// The statements, or the error message when compiling failed.
    pub sql: String,
    /// Same as `sql` with the literals in place of the placeholders.
    pub sql_with_args: String,
    pub args: Vec<Value>,
    pub error: Option<Error>,
    pub description: String,
}

impl DryRunResult {
    fn new<T>(query: &Query<T>, config: &DatabaseConfig, description: String) -> Self {
        let mut visitor = DryRunVisitor::new(config);
        match visitor.visit(query) {
            Ok(()) => {
                let mut statement = Statement::default();
                for v in visitor.finish() {
                    statement.append(v);
                }
                Self {
                    sql_with_args: statement.to_sql_with_args(config.dialect.sql_writer()),
                    sql: statement.sql,
                    args: statement.args,
                    error: None,
                    description,
                }
            }
            Err(error) => {
                let message = format!("{error:#}");
                Self {
                    sql: message.clone(),
                    sql_with_args: message,
                    args: Vec::new(),
                    error: Some(error),
                    description,
                }
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

struct MapNode<S, T> {
    source: Query<S>,
    transform: Arc<dyn Fn(S) -> Result<T> + Send + Sync>,
}

impl<S: Send + 'static, T: Send + 'static> Combinator<T> for MapNode<S, T> {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<T> {
        visitor.visit_map(&self.source, self.transform.as_ref())
    }
    fn accept_stream<'a>(&'a self, visitor: &'a mut StreamVisitor<'_>) -> BoxFuture<'a, Result<T>> {
        Box::pin(visitor.visit_map(&self.source, self.transform.as_ref()))
    }
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()> {
        visitor.visit(&self.source)
    }
    fn describe(&self) -> String {
        format!("map({})", self.source.describe())
    }
}

struct FlatMapNode<S, T> {
    source: Query<S>,
    transform: Arc<dyn Fn(S) -> Query<T> + Send + Sync>,
}

impl<S: Send + 'static, T: Send + 'static> Combinator<T> for FlatMapNode<S, T> {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<T> {
        visitor.visit_flat_map(&self.source, self.transform.as_ref())
    }
    fn accept_stream<'a>(&'a self, visitor: &'a mut StreamVisitor<'_>) -> BoxFuture<'a, Result<T>> {
        Box::pin(visitor.visit_flat_map(&self.source, self.transform.as_ref()))
    }
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()> {
        visitor.visit(&self.source)
    }
    fn describe(&self) -> String {
        format!("flat_map({})", self.source.describe())
    }
}

struct ZipNode<A, B> {
    left: Query<A>,
    right: Query<B>,
}

impl<A: Send + 'static, B: Send + 'static> Combinator<(A, B)> for ZipNode<A, B> {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<(A, B)> {
        visitor.visit_zip(&self.left, &self.right)
    }
    fn accept_stream<'a>(
        &'a self,
        visitor: &'a mut StreamVisitor<'_>,
    ) -> BoxFuture<'a, Result<(A, B)>> {
        Box::pin(visitor.visit_zip(&self.left, &self.right))
    }
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()> {
        visitor.visit(&self.left)?;
        visitor.visit(&self.right)
    }
    fn describe(&self) -> String {
        format!("zip({}, {})", self.left.describe(), self.right.describe())
    }
}

struct FlatZipNode<S, T> {
    source: Query<S>,
    transform: Arc<dyn Fn(&S) -> Query<T> + Send + Sync>,
}

impl<S: Send + 'static, T: Send + 'static> Combinator<(S, T)> for FlatZipNode<S, T> {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<(S, T)> {
        visitor.visit_flat_zip(&self.source, self.transform.as_ref())
    }
    fn accept_stream<'a>(
        &'a self,
        visitor: &'a mut StreamVisitor<'_>,
    ) -> BoxFuture<'a, Result<(S, T)>> {
        Box::pin(visitor.visit_flat_zip(&self.source, self.transform.as_ref()))
    }
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()> {
        visitor.visit(&self.source)
    }
    fn describe(&self) -> String {
        format!("flat_zip({})", self.source.describe())
    }
}

struct AndThenNode<A, B> {
    first: Query<A>,
    second: Query<B>,
}

impl<A: Send + 'static, B: Send + 'static> Combinator<B> for AndThenNode<A, B> {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<B> {
        visitor.visit_and_then(&self.first, &self.second)
    }
    fn accept_stream<'a>(&'a self, visitor: &'a mut StreamVisitor<'_>) -> BoxFuture<'a, Result<B>> {
        Box::pin(visitor.visit_and_then(&self.first, &self.second))
    }
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()> {
        visitor.visit(&self.first)?;
        visitor.visit(&self.second)
    }
    fn describe(&self) -> String {
        format!(
            "and_then({}, {})",
            self.first.describe(),
            self.second.describe()
        )
    }
}

struct ConcatNode<T> {
    left: Query<Vec<T>>,
    right: Query<Vec<T>>,
}

impl<T: Send + 'static> Combinator<Vec<T>> for ConcatNode<T> {
    fn accept(&self, visitor: &mut BlockingVisitor<'_>) -> Result<Vec<T>> {
        visitor.visit_concat(&self.left, &self.right)
    }
    fn accept_stream<'a>(
        &'a self,
        visitor: &'a mut StreamVisitor<'_>,
    ) -> BoxFuture<'a, Result<Vec<T>>> {
        Box::pin(visitor.visit_concat(&self.left, &self.right))
    }
    fn accept_dry_run(&self, visitor: &mut DryRunVisitor<'_>) -> Result<()> {
        visitor.visit(&self.left)?;
        visitor.visit(&self.right)
    }
    fn describe(&self) -> String {
        format!("{} + {}", self.left.describe(), self.right.describe())
    }
}

/// Anything that can become a [`Query`], the combinators are available on all of them.
pub trait IntoQuery<T: Send + 'static>: Sized {
    fn into_query(self) -> Query<T>;

    /// See [`Query::run`].
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<T>
    where
        Self: Clone,
    {
        Query::run(&self.clone().into_query(), transport, config)
    }

    /// See [`Query::run_stream`].
    fn run_stream<'a>(
        &self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<T>>
    where
        Self: Clone,
    {
        let query = self.clone().into_query();
        Box::pin(async move { Query::run_stream(&query, transport, config).await })
    }

    /// See [`Query::dry_run`].
    fn dry_run(&self, config: &DatabaseConfig) -> DryRunResult
    where
        Self: Clone,
    {
        Query::dry_run(&self.clone().into_query(), config)
    }

    /// See [`Query::dry_run_default`].
    fn dry_run_default(&self) -> DryRunResult
    where
        Self: Clone,
    {
        Query::dry_run_default(&self.clone().into_query())
    }

    fn map<U: Send + 'static>(self, transform: impl Fn(T) -> U + Send + Sync + 'static) -> Query<U> {
        self.try_map(move |v| Ok(transform(v)))
    }

    fn try_map<U: Send + 'static>(
        self,
        transform: impl Fn(T) -> Result<U> + Send + Sync + 'static,
    ) -> Query<U> {
        Query::Map(Arc::new(MapNode {
            source: self.into_query(),
            transform: Arc::new(transform),
        }))
    }

    /// The query produced by `transform` runs after this one, on its result.
    fn flat_map<U: Send + 'static>(
        self,
        transform: impl Fn(T) -> Query<U> + Send + Sync + 'static,
    ) -> Query<U> {
        Query::FlatMap(Arc::new(FlatMapNode {
            source: self.into_query(),
            transform: Arc::new(transform),
        }))
    }

    /// Both results, this query runs first.
    fn zip<U: Send + 'static>(self, other: impl IntoQuery<U>) -> Query<(T, U)> {
        Query::Zip(Arc::new(ZipNode {
            left: self.into_query(),
            right: other.into_query(),
        }))
    }

    /// Like `flat_map`, the result of this query is kept next to the one of the derived query.
    fn flat_zip<U: Send + 'static>(
        self,
        transform: impl Fn(&T) -> Query<U> + Send + Sync + 'static,
    ) -> Query<(T, U)> {
        Query::FlatZip(Arc::new(FlatZipNode {
            source: self.into_query(),
            transform: Arc::new(transform),
        }))
    }

    /// Runs `other` after this query, the result of this query is discarded.
    fn and_then<U: Send + 'static>(self, other: impl IntoQuery<U>) -> Query<U> {
        Query::AndThen(Arc::new(AndThenNode {
            first: self.into_query(),
            second: other.into_query(),
        }))
    }

    /// The first element of a list result, failing when the list is empty.
    fn first<U: Send + 'static>(self) -> Query<U>
    where
        T: IntoIterator<Item = U>,
    {
        self.try_map(|v: T| {
            v.into_iter()
                .next()
                .ok_or_else(|| Error::msg("The query returned no rows"))
        })
    }

    /// The first element of a list result, if any.
    fn first_or_none<U: Send + 'static>(self) -> Query<Option<U>>
    where
        T: IntoIterator<Item = U>,
    {
        self.map(|v: T| v.into_iter().next())
    }
}

impl<T: Send + 'static> IntoQuery<T> for Query<T> {
    fn into_query(self) -> Query<T> {
        self
    }
}

impl<T: Send + 'static> Add for Query<Vec<T>> {
    type Output = Query<Vec<T>>;

    /// Runs both queries in order and concatenates their results.
    fn add(self, rhs: Self) -> Self::Output {
        Query::Concat(Arc::new(ConcatNode {
            left: self,
            right: rhs,
        }))
    }
}
