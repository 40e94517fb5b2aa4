use crate::{DatabaseConfig, Query, Result, Statement, StreamTransport, Transport};
use futures::future::BoxFuture;

/// Interprets a query on a blocking transport.
pub struct BlockingVisitor<'t> {
    transport: &'t mut dyn Transport,
    config: &'t DatabaseConfig,
}

impl<'t> BlockingVisitor<'t> {
    pub fn new(transport: &'t mut dyn Transport, config: &'t DatabaseConfig) -> Self {
        Self { transport, config }
    }

    pub fn visit<T>(&mut self, query: &Query<T>) -> Result<T> {
        match query {
            Query::Primitive(runner) => runner.run(&mut *self.transport, self.config),
            Query::Map(v)
            | Query::FlatMap(v)
            | Query::Zip(v)
            | Query::FlatZip(v)
            | Query::AndThen(v)
            | Query::Concat(v) => v.accept(self),
        }
    }

    pub fn visit_map<S, T>(
        &mut self,
        source: &Query<S>,
        transform: &(dyn Fn(S) -> Result<T> + Send + Sync),
    ) -> Result<T> {
        transform(self.visit(source)?)
    }

    pub fn visit_flat_map<S, T>(
        &mut self,
        source: &Query<S>,
        transform: &(dyn Fn(S) -> Query<T> + Send + Sync),
    ) -> Result<T> {
        let next = transform(self.visit(source)?);
        self.visit(&next)
    }

    pub fn visit_zip<A, B>(&mut self, left: &Query<A>, right: &Query<B>) -> Result<(A, B)> {
        let left = self.visit(left)?;
        let right = self.visit(right)?;
        Ok((left, right))
    }

    pub fn visit_flat_zip<S, T>(
        &mut self,
        source: &Query<S>,
        transform: &(dyn Fn(&S) -> Query<T> + Send + Sync),
    ) -> Result<(S, T)> {
        let value = self.visit(source)?;
        let next = transform(&value);
        let other = self.visit(&next)?;
        Ok((value, other))
    }

    pub fn visit_and_then<A, B>(&mut self, first: &Query<A>, second: &Query<B>) -> Result<B> {
        self.visit(first)?;
        self.visit(second)
    }

    pub fn visit_concat<T>(&mut self, left: &Query<Vec<T>>, right: &Query<Vec<T>>) -> Result<Vec<T>> {
        let mut result = self.visit(left)?;
        result.extend(self.visit(right)?);
        Ok(result)
    }
}

/// Interprets a query on a streaming transport.
pub struct StreamVisitor<'t> {
    transport: &'t mut dyn StreamTransport,
    config: &'t DatabaseConfig,
}

impl<'t> StreamVisitor<'t> {
    pub fn new(transport: &'t mut dyn StreamTransport, config: &'t DatabaseConfig) -> Self {
        Self { transport, config }
    }

    pub fn visit<'a, T>(&'a mut self, query: &'a Query<T>) -> BoxFuture<'a, Result<T>> {
        match query {
            Query::Primitive(runner) => runner.run_stream(&mut *self.transport, self.config),
            Query::Map(v)
            | Query::FlatMap(v)
            | Query::Zip(v)
            | Query::FlatZip(v)
            | Query::AndThen(v)
            | Query::Concat(v) => v.accept_stream(self),
        }
    }

    pub async fn visit_map<S, T>(
        &mut self,
        source: &Query<S>,
        transform: &(dyn Fn(S) -> Result<T> + Send + Sync),
    ) -> Result<T> {
        let value = self.visit(source).await?;
        transform(value)
    }

    pub async fn visit_flat_map<S, T>(
        &mut self,
        source: &Query<S>,
        transform: &(dyn Fn(S) -> Query<T> + Send + Sync),
    ) -> Result<T> {
        let next = transform(self.visit(source).await?);
        self.visit(&next).await
    }

    pub async fn visit_zip<A: Send, B>(&mut self, left: &Query<A>, right: &Query<B>) -> Result<(A, B)> {
        let left = self.visit(left).await?;
        let right = self.visit(right).await?;
        Ok((left, right))
    }

    pub async fn visit_flat_zip<S: Send, T>(
        &mut self,
        source: &Query<S>,
        transform: &(dyn Fn(&S) -> Query<T> + Send + Sync),
    ) -> Result<(S, T)> {
        let value = self.visit(source).await?;
        let next = transform(&value);
        let other = self.visit(&next).await?;
        Ok((value, other))
    }

    pub async fn visit_and_then<A, B>(&mut self, first: &Query<A>, second: &Query<B>) -> Result<B> {
        self.visit(first).await?;
        self.visit(second).await
    }

    pub async fn visit_concat<T: Send>(
        &mut self,
        left: &Query<Vec<T>>,
        right: &Query<Vec<T>>,
    ) -> Result<Vec<T>> {
        let mut result = self.visit(left).await?;
        result.extend(self.visit(right).await?);
        Ok(result)
    }
}

/// Collects the statements of a query without executing anything.
///
/// Queries derived from a result (`flat_map`, `flat_zip`) cannot be known without running, only
/// their source contributes.
pub struct DryRunVisitor<'c> {
    config: &'c DatabaseConfig,
    statements: Vec<Statement>,
}

impl<'c> DryRunVisitor<'c> {
    pub fn new(config: &'c DatabaseConfig) -> Self {
        Self {
            config,
            statements: Vec::new(),
        }
    }

    pub fn visit<T>(&mut self, query: &Query<T>) -> Result<()> {
        match query {
            Query::Primitive(runner) => {
                self.statements.extend(runner.dry_run(self.config)?);
                Ok(())
            }
            Query::Map(v)
            | Query::FlatMap(v)
            | Query::Zip(v)
            | Query::FlatZip(v)
            | Query::AndThen(v)
            | Query::Concat(v) => v.accept_dry_run(self),
        }
    }

    pub fn finish(self) -> Vec<Statement> {
        self.statements
    }
}
