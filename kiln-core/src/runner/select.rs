use super::{Runner, log_statement, translate_error};
use crate::{
    DatabaseConfig, Entity, EntityStore, Projection, Record, Result, SelectContext, Statement,
    StreamTransport, Transport, Value, build_select, check_not_null, extract,
};
use async_stream::try_stream;
use futures::{
    StreamExt,
    future::BoxFuture,
    stream::BoxStream,
};
use std::sync::Arc;

/// Turns the rows of a select, already ordered like the selected columns, into the result.
pub trait RowCollector<E>: Send + Sync + 'static {
    type Output: Send + 'static;
    fn collect(&self, context: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Result<Self::Output>;
}

/// Decodes a single row, the collectors that support streaming implement it.
pub trait RowDecoder<E>: Send + Sync + 'static {
    type Item: Send + 'static;
    fn decode(&self, context: &SelectContext<E>, values: Vec<Value>, row: usize) -> Result<Self::Item>;
}

fn decode_all<E, D: RowDecoder<E>>(
    decoder: &D,
    context: &SelectContext<E>,
    rows: Vec<Vec<Value>>,
) -> Result<Vec<D::Item>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, v)| decoder.decode(context, v, i))
        .collect()
}

/// Rows decoded as entities of the select target.
#[derive(Default, Debug, Clone, Copy)]
pub struct EntityCollector;

impl<E: Entity> RowDecoder<E> for EntityCollector {
    type Item = E;
    fn decode(&self, context: &SelectContext<E>, values: Vec<Value>, row: usize) -> Result<E> {
        context.target.decode(values, row)
    }
}

impl<E: Entity> RowCollector<E> for EntityCollector {
    type Output = Vec<E>;
    fn collect(&self, context: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Result<Vec<E>> {
        decode_all(self, context, rows)
    }
}

/// Rows decoded by a projection, every column nullable.
#[derive(Debug, Clone)]
pub struct ProjectionCollector<P>(pub P);

impl<E: 'static, P: Projection> RowDecoder<E> for ProjectionCollector<P> {
    type Item = P::Output;
    fn decode(&self, _: &SelectContext<E>, values: Vec<Value>, row: usize) -> Result<P::Output> {
        self.0.decode(values, row)
    }
}

impl<E: 'static, P: Projection> RowCollector<E> for ProjectionCollector<P> {
    type Output = Vec<P::Output>;
    fn collect(&self, context: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Result<Self::Output> {
        decode_all(self, context, rows)
    }
}

/// Rows decoded by a projection whose columns must not be null, checked once for all the rows
/// before decoding.
#[derive(Debug, Clone)]
pub struct NotNullProjectionCollector<P>(pub P);

impl<E: 'static, P: Projection> RowCollector<E> for NotNullProjectionCollector<P> {
    type Output = Vec<P::NotNullOutput>;
    fn collect(&self, _: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Result<Self::Output> {
        check_not_null(&self.0.expressions(), &rows)?;
        rows.into_iter()
            .enumerate()
            .map(|(i, v)| self.0.decode_not_null(v, i))
            .collect()
    }
}

/// Rows as records keyed by the selected expressions.
#[derive(Default, Debug, Clone, Copy)]
pub struct RecordCollector;

impl<E: 'static> RowDecoder<E> for RecordCollector {
    type Item = Record;
    fn decode(&self, context: &SelectContext<E>, values: Vec<Value>, _: usize) -> Result<Record> {
        Ok(Record::new(context.columns().into(), values))
    }
}

impl<E: 'static> RowCollector<E> for RecordCollector {
    type Output = Vec<Record>;
    fn collect(&self, context: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Result<Vec<Record>> {
        let columns: Arc<[_]> = context.columns().into();
        Ok(rows
            .into_iter()
            .map(|v| Record::new(columns.clone(), v))
            .collect())
    }
}

/// Rows kept whole in an [`EntityStore`].
#[derive(Default, Debug, Clone, Copy)]
pub struct StoreCollector;

impl<E: 'static> RowCollector<E> for StoreCollector {
    type Output = EntityStore;
    fn collect(&self, context: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Result<EntityStore> {
        Ok(EntityStore::from_context(context, rows))
    }
}

/// Runs a select and collects its rows with `C`.
#[derive(Debug, Clone)]
pub struct SelectRunner<E, C> {
    pub context: SelectContext<E>,
    pub collector: C,
}

/// A select with includes, producing the whole result set.
pub type EntityStoreRunner<E> = SelectRunner<E, StoreCollector>;

impl<E, C> SelectRunner<E, C> {
    pub fn new(context: SelectContext<E>, collector: C) -> Self {
        Self { context, collector }
    }
}

impl<E: Entity, C: RowCollector<E>> Runner<C::Output> for SelectRunner<E, C> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<C::Output> {
        let statement = build_select(config.dialect.as_ref(), &self.context)?;
        log_statement(config, &statement);
        let options = config.execution.merge(&self.context.options.execution);
        let projection_type = self.context.options.projection_type;
        let columns = self.context.columns();
        let mut rows = Vec::new();
        transport
            .execute_query(&statement, &options, &mut |row| {
                rows.push(extract(row, &columns, projection_type));
                Ok(())
            })
            .map_err(|e| translate_error(config, e))?;
        self.collector.collect(&self.context, rows)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<C::Output>> {
        Box::pin(async move {
            let statement = build_select(config.dialect.as_ref(), &self.context)?;
            log_statement(config, &statement);
            let options = config.execution.merge(&self.context.options.execution);
            let projection_type = self.context.options.projection_type;
            let columns = self.context.columns();
            let mut rows = Vec::new();
            let mut stream = transport.execute_query(statement, options);
            while let Some(row) = stream.next().await {
                let row = row.map_err(|e| translate_error(config, e))?;
                rows.push(extract(row, &columns, projection_type));
            }
            drop(stream);
            self.collector.collect(&self.context, rows)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        Ok(vec![build_select(config.dialect.as_ref(), &self.context)?])
    }

    fn describe(&self) -> String {
        format!("select from {}", self.context.target.table().full_name())
    }
}

impl<E: Entity, C: RowDecoder<E>> SelectRunner<E, C> {
    /// Lazy sequence of the decoded rows.
    ///
    /// The statement is submitted on the first poll. The sequence can be consumed once, run the
    /// query again for a fresh one. Dropping it early releases the transport cursor.
    pub fn stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxStream<'a, Result<C::Item>> {
        Box::pin(try_stream! {
            let statement = build_select(config.dialect.as_ref(), &self.context)?;
            log_statement(config, &statement);
            let options = config.execution.merge(&self.context.options.execution);
            let projection_type = self.context.options.projection_type;
            let columns = self.context.columns();
            let mut rows = transport.execute_query(statement, options);
            let mut index = 0;
            while let Some(row) = rows.next().await {
                let row = row.map_err(|e| translate_error(config, e))?;
                let values = extract(row, &columns, projection_type);
                yield self.collector.decode(&self.context, values, index)?;
                index += 1;
            }
        })
    }
}
