//! Execution of contexts: every runner compiles its context through the dialect, hands the
//! statements to a transport and applies the entity lifecycle to the outcome.
//!
//! A runner serves both transports, only the call to the transport differs between
//! [`Runner::run`] and [`Runner::run_stream`].

mod entity;
mod relation;
mod schema;
mod select;

pub use entity::*;
pub use relation::*;
pub use schema::*;
pub use select::*;

use crate::{
    BatchResult, DatabaseConfig, Error, ExecutionOptions, QueryError, Result, Statement,
    StreamTransport, Transport, truncate_long,
};
use futures::future::BoxFuture;

/// A compiled unit of work producing `T`.
pub trait Runner<T>: Send + Sync {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<T>;

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<T>>;

    /// The statements `run` would execute, nothing is executed.
    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>>;

    /// Short human readable description, used by dry runs.
    fn describe(&self) -> String;
}

/// How the entities of a write are turned into statements.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// One entity, one statement.
    #[default]
    Single,
    /// Every entity in a single statement.
    Multiple,
    /// One statement per entity, executed as a batch.
    Batch,
}

pub(crate) fn log_statement(config: &DatabaseConfig, statement: &Statement) {
    if log::log_enabled!(log::Level::Debug) {
        let sql = statement.to_sql_with_args(config.dialect.sql_writer());
        log::debug!("[{}] {}", config.id, truncate_long!(sql));
    }
}

/// Marks the unique constraint violations reported by the transport.
pub(crate) fn translate_error(config: &DatabaseConfig, error: Error) -> Error {
    if config.dialect.is_unique_constraint_error(&error) {
        let message = format!("{error:#}");
        error.context(QueryError::UniqueConstraint { message })
    } else {
        error
    }
}

pub(crate) fn empty_where_error(target: &str, operation: &str) -> Error {
    QueryError::Build(format!(
        "The {operation} of `{target}` has an empty where clause, enable `allow_empty_where` to permit it"
    ))
    .into()
}

fn chunks(statements: &[Statement], options: &ExecutionOptions) -> Vec<std::ops::Range<usize>> {
    let size = options
        .batch_size
        .map(|v| v.max(1) as usize)
        .unwrap_or(statements.len().max(1));
    (0..statements.len())
        .step_by(size)
        .map(|start| start..(start + size).min(statements.len()))
        .collect()
}

fn single(result: crate::UpdateResult) -> BatchResult {
    BatchResult {
        counts: vec![result.count],
        generated_keys: result.generated_keys,
    }
}

/// Executes the statements of a write, the result holds one count per statement.
pub(crate) fn execute_write(
    transport: &mut dyn Transport,
    config: &DatabaseConfig,
    statements: &[Statement],
    mode: WriteMode,
    options: &ExecutionOptions,
    return_generated_keys: bool,
) -> Result<BatchResult> {
    for statement in statements {
        log_statement(config, statement);
    }
    if mode != WriteMode::Batch {
        let mut result = BatchResult::default();
        for statement in statements {
            let outcome = transport
                .execute_update(statement, options, return_generated_keys)
                .map_err(|e| translate_error(config, e))?;
            let outcome = single(outcome);
            result.counts.extend(outcome.counts);
            result.generated_keys.extend(outcome.generated_keys);
        }
        return Ok(result);
    }
    let mut result = BatchResult::default();
    for range in chunks(statements, options) {
        let outcome = transport
            .execute_batch(&statements[range], options, return_generated_keys)
            .map_err(|e| translate_error(config, e))?;
        result.counts.extend(outcome.counts);
        result.generated_keys.extend(outcome.generated_keys);
    }
    Ok(result)
}

/// Streaming counterpart of [`execute_write`].
pub(crate) async fn execute_write_stream(
    transport: &mut dyn StreamTransport,
    config: &DatabaseConfig,
    statements: Vec<Statement>,
    mode: WriteMode,
    options: ExecutionOptions,
    return_generated_keys: bool,
) -> Result<BatchResult> {
    for statement in &statements {
        log_statement(config, statement);
    }
    let mut result = BatchResult::default();
    if mode != WriteMode::Batch {
        for statement in statements {
            let outcome = transport
                .execute_update(statement, options, return_generated_keys)
                .await
                .map_err(|e| translate_error(config, e))?;
            let outcome = single(outcome);
            result.counts.extend(outcome.counts);
            result.generated_keys.extend(outcome.generated_keys);
        }
        return Ok(result);
    }
    for range in chunks(&statements, &options) {
        let outcome = transport
            .execute_batch(statements[range].to_vec(), options, return_generated_keys)
            .await
            .map_err(|e| translate_error(config, e))?;
        result.counts.extend(outcome.counts);
        result.generated_keys.extend(outcome.generated_keys);
    }
    Ok(result)
}

/// Adapts a runner producing a list of one element to a runner producing that element.
pub struct Single<R>(pub R);

impl<T: Send + 'static, R: Runner<Vec<T>>> Runner<T> for Single<R> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<T> {
        first(self.0.run(transport, config)?)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<T>> {
        Box::pin(async move { first(self.0.run_stream(transport, config).await?) })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.0.dry_run(config)
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

fn first<T>(values: Vec<T>) -> Result<T> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| Error::msg("The statement produced no result"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_are_split_by_size() {
        let statements = vec![Statement::default(); 5];
        let options = ExecutionOptions {
            batch_size: Some(2),
            ..Default::default()
        };
        assert_eq!(chunks(&statements, &options), vec![0..2, 2..4, 4..5]);
        assert_eq!(chunks(&statements, &Default::default()), vec![0..5]);
        assert!(chunks(&[], &Default::default()).is_empty());
    }
}
