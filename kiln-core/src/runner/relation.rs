use super::{Runner, empty_where_error, log_statement, translate_error};
use crate::{
    DatabaseConfig, EntityLifecycle, ExecutionOptions, RelationDeleteContext,
    RelationInsertContext, RelationUpdateContext, Result, Statement, StreamTransport, Transport,
    UpdateResult, build_relation_delete, build_relation_insert, build_relation_update,
};
use futures::future::BoxFuture;

fn execute(
    transport: &mut dyn Transport,
    config: &DatabaseConfig,
    statement: &Statement,
    options: &ExecutionOptions,
    return_generated_keys: bool,
) -> Result<UpdateResult> {
    log_statement(config, statement);
    transport
        .execute_update(statement, options, return_generated_keys)
        .map_err(|e| translate_error(config, e))
}

async fn execute_stream(
    transport: &mut dyn StreamTransport,
    config: &DatabaseConfig,
    statement: Statement,
    options: ExecutionOptions,
    return_generated_keys: bool,
) -> Result<UpdateResult> {
    log_statement(config, &statement);
    transport
        .execute_update(statement, options, return_generated_keys)
        .await
        .map_err(|e| translate_error(config, e))
}

/// Set based update, the result is the number of affected rows.
#[derive(Debug, Clone)]
pub struct RelationUpdateRunner<E> {
    pub context: RelationUpdateContext<E>,
}

impl<E: Clone + Send + Sync> RelationUpdateRunner<E> {
    pub fn new(context: RelationUpdateContext<E>) -> Self {
        Self { context }
    }

    fn statement(&self, config: &DatabaseConfig) -> Result<Statement> {
        let updated_at =
            EntityLifecycle::new(&self.context.target).updated_at_value(config.clock.now());
        build_relation_update(config.dialect.as_ref(), &self.context, updated_at)
    }

    /// The statement to run, refusing an unbounded update unless allowed.
    fn checked_statement(&self, config: &DatabaseConfig) -> Result<Statement> {
        if self.context.filter.is_empty() && !self.context.options.allow_empty_where {
            return Err(empty_where_error(self.context.target.name(), "update"));
        }
        self.statement(config)
    }
}

impl<E: Clone + Send + Sync> Runner<u64> for RelationUpdateRunner<E> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<u64> {
        let statement = self.checked_statement(config)?;
        let options = config.execution.merge(&self.context.options.execution);
        Ok(execute(transport, config, &statement, &options, false)?.count)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            let statement = self.checked_statement(config)?;
            let options = config.execution.merge(&self.context.options.execution);
            Ok(execute_stream(transport, config, statement, options, false)
                .await?
                .count)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        Ok(vec![self.statement(config)?])
    }

    fn describe(&self) -> String {
        format!("update {}", self.context.target.table().full_name())
    }
}

/// Set based delete, the result is the number of affected rows.
#[derive(Debug, Clone)]
pub struct RelationDeleteRunner<E> {
    pub context: RelationDeleteContext<E>,
}

impl<E: Send + Sync> RelationDeleteRunner<E> {
    pub fn new(context: RelationDeleteContext<E>) -> Self {
        Self { context }
    }

    fn checked_statement(&self, config: &DatabaseConfig) -> Result<Statement> {
        if self.context.filter.is_empty() && !self.context.options.allow_empty_where {
            return Err(empty_where_error(self.context.target.name(), "delete"));
        }
        build_relation_delete(config.dialect.as_ref(), &self.context)
    }
}

impl<E: Send + Sync> Runner<u64> for RelationDeleteRunner<E> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<u64> {
        let statement = self.checked_statement(config)?;
        let options = config.execution.merge(&self.context.options.execution);
        Ok(execute(transport, config, &statement, &options, false)?.count)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            let statement = self.checked_statement(config)?;
            let options = config.execution.merge(&self.context.options.execution);
            Ok(execute_stream(transport, config, statement, options, false)
                .await?
                .count)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        Ok(vec![build_relation_delete(config.dialect.as_ref(), &self.context)?])
    }

    fn describe(&self) -> String {
        format!("delete from {}", self.context.target.table().full_name())
    }
}

/// Insert of assigned columns, the result is the affected count and the generated key.
#[derive(Debug, Clone)]
pub struct RelationInsertRunner<E> {
    pub context: RelationInsertContext<E>,
}

impl<E: Send + Sync> RelationInsertRunner<E> {
    pub fn new(context: RelationInsertContext<E>) -> Self {
        Self { context }
    }

    fn return_generated_keys(&self) -> bool {
        self.context.target.identity_property().is_some()
    }
}

impl<E: Send + Sync> Runner<(u64, Option<i64>)> for RelationInsertRunner<E> {
    fn run(
        &self,
        transport: &mut dyn Transport,
        config: &DatabaseConfig,
    ) -> Result<(u64, Option<i64>)> {
        let statement = build_relation_insert(config.dialect.as_ref(), &self.context)?;
        let options = config.execution.merge(&self.context.options.execution);
        let result = execute(
            transport,
            config,
            &statement,
            &options,
            self.return_generated_keys(),
        )?;
        Ok((result.count, result.generated_keys.first().copied()))
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<(u64, Option<i64>)>> {
        Box::pin(async move {
            let statement = build_relation_insert(config.dialect.as_ref(), &self.context)?;
            let options = config.execution.merge(&self.context.options.execution);
            let result = execute_stream(
                transport,
                config,
                statement,
                options,
                self.return_generated_keys(),
            )
            .await?;
            Ok((result.count, result.generated_keys.first().copied()))
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        Ok(vec![build_relation_insert(config.dialect.as_ref(), &self.context)?])
    }

    fn describe(&self) -> String {
        format!("insert into {}", self.context.target.table().full_name())
    }
}
