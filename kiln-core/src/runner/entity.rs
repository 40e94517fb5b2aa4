use super::{Runner, WriteMode, execute_write, execute_write_stream};
use crate::{
    BatchResult, DatabaseConfig, Entity, EntityDeleteContext, EntityInsertContext,
    EntityLifecycle, EntityUpdateContext, ExecutionOptions, Result, Statement, StreamTransport,
    Transport, VersionCheck, build_entity_delete, build_entity_insert,
    build_entity_insert_multiple, build_entity_update, reconcile,
};
use futures::future::BoxFuture;

fn describe_mode(mode: WriteMode, operation: &str, target: &str, len: usize) -> String {
    match mode {
        WriteMode::Single => format!("{operation} {target}"),
        WriteMode::Multiple => format!("{operation} {len} rows into {target}"),
        WriteMode::Batch => format!("batch {operation} of {len} {target}"),
    }
}

/// Insert of entities, the result holds the inserted values with timestamps and generated keys.
#[derive(Debug, Clone)]
pub struct EntityInsertRunner<E> {
    pub context: EntityInsertContext<E>,
    pub entities: Vec<E>,
    pub mode: WriteMode,
}

impl<E: Entity> EntityInsertRunner<E> {
    pub fn new(context: EntityInsertContext<E>, entities: Vec<E>, mode: WriteMode) -> Self {
        Self {
            context,
            entities,
            mode,
        }
    }

    fn options(&self, config: &DatabaseConfig) -> ExecutionOptions {
        config.execution.merge(&self.context.options.execution)
    }

    fn return_generated_keys(&self) -> bool {
        self.context.target.identity_property().is_some()
    }

    fn prepare(&self, config: &DatabaseConfig) -> Result<(Vec<E>, Vec<Statement>)> {
        let now = config.clock.now();
        let lifecycle = EntityLifecycle::new(&self.context.target);
        let entities = self
            .entities
            .iter()
            .map(|v| lifecycle.pre_insert(v, now))
            .collect::<Result<Vec<_>>>()?;
        let dialect = config.dialect.as_ref();
        let statements = match self.mode {
            WriteMode::Multiple => {
                vec![build_entity_insert_multiple(dialect, &self.context, &entities)?]
            }
            _ => entities
                .iter()
                .map(|v| build_entity_insert(dialect, &self.context, v))
                .collect::<Result<_>>()?,
        };
        Ok((entities, statements))
    }

    fn complete(&self, entities: Vec<E>, result: &BatchResult) -> Result<Vec<E>> {
        let lifecycle = EntityLifecycle::new(&self.context.target);
        let entities = if self.mode == WriteMode::Multiple {
            entities
        } else {
            reconcile(entities, &result.counts, |v, _, _| Ok(v))?
        };
        lifecycle.post_insert_all(entities, &result.generated_keys)
    }
}

impl<E: Entity> Runner<Vec<E>> for EntityInsertRunner<E> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<Vec<E>> {
        let (entities, statements) = self.prepare(config)?;
        let result = execute_write(
            transport,
            config,
            &statements,
            self.mode,
            &self.options(config),
            self.return_generated_keys(),
        )?;
        self.complete(entities, &result)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<Vec<E>>> {
        Box::pin(async move {
            let (entities, statements) = self.prepare(config)?;
            let result = execute_write_stream(
                transport,
                config,
                statements,
                self.mode,
                self.options(config),
                self.return_generated_keys(),
            )
            .await?;
            self.complete(entities, &result)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.prepare(config).map(|(_, v)| v)
    }

    fn describe(&self) -> String {
        describe_mode(
            self.mode,
            "insert",
            &self.context.target.table().full_name(),
            self.entities.len(),
        )
    }
}

/// Insert with a conflict clause, the result holds the count of every statement.
#[derive(Debug, Clone)]
pub struct EntityUpsertRunner<E> {
    pub context: EntityInsertContext<E>,
    pub entities: Vec<E>,
    pub mode: WriteMode,
}

impl<E: Entity> EntityUpsertRunner<E> {
    pub fn new(context: EntityInsertContext<E>, entities: Vec<E>, mode: WriteMode) -> Self {
        Self {
            context,
            entities,
            mode,
        }
    }

    fn prepare(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        let inserts = EntityInsertRunner {
            context: self.context.clone(),
            entities: self.entities.clone(),
            mode: self.mode,
        };
        inserts.prepare(config).map(|(_, v)| v)
    }
}

impl<E: Entity> Runner<Vec<u64>> for EntityUpsertRunner<E> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<Vec<u64>> {
        let statements = self.prepare(config)?;
        let options = config.execution.merge(&self.context.options.execution);
        let result = execute_write(transport, config, &statements, self.mode, &options, false)?;
        Ok(result.counts)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<Vec<u64>>> {
        Box::pin(async move {
            let statements = self.prepare(config)?;
            let options = config.execution.merge(&self.context.options.execution);
            let result =
                execute_write_stream(transport, config, statements, self.mode, options, false)
                    .await?;
            Ok(result.counts)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.prepare(config)
    }

    fn describe(&self) -> String {
        describe_mode(
            self.mode,
            "upsert",
            &self.context.target.table().full_name(),
            self.entities.len(),
        )
    }
}

/// Update of entities by identifier, versioned entities are checked and incremented.
#[derive(Debug, Clone)]
pub struct EntityUpdateRunner<E> {
    pub context: EntityUpdateContext<E>,
    pub entities: Vec<E>,
    pub mode: WriteMode,
}

impl<E: Entity> EntityUpdateRunner<E> {
    pub fn new(context: EntityUpdateContext<E>, entities: Vec<E>, mode: WriteMode) -> Self {
        Self {
            context,
            entities,
            mode,
        }
    }

    fn prepare(&self, config: &DatabaseConfig) -> Result<(Vec<E>, Vec<Statement>)> {
        let now = config.clock.now();
        let lifecycle = EntityLifecycle::new(&self.context.target);
        let entities = self
            .entities
            .iter()
            .map(|v| lifecycle.pre_update(v, now))
            .collect::<Result<Vec<_>>>()?;
        let statements = entities
            .iter()
            .map(|v| build_entity_update(config.dialect.as_ref(), &self.context, v))
            .collect::<Result<_>>()?;
        Ok((entities, statements))
    }

    fn complete(&self, entities: Vec<E>, result: &BatchResult) -> Result<Vec<E>> {
        let lifecycle = EntityLifecycle::new(&self.context.target);
        let check = VersionCheck::from(&self.context.options);
        reconcile(entities, &result.counts, |entity, count, index| {
            lifecycle.post_update(entity, count, index, check)
        })
    }
}

impl<E: Entity> Runner<Vec<E>> for EntityUpdateRunner<E> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<Vec<E>> {
        let (entities, statements) = self.prepare(config)?;
        let options = config.execution.merge(&self.context.options.execution);
        let result = execute_write(transport, config, &statements, self.mode, &options, false)?;
        self.complete(entities, &result)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<Vec<E>>> {
        Box::pin(async move {
            let (entities, statements) = self.prepare(config)?;
            let options = config.execution.merge(&self.context.options.execution);
            let result =
                execute_write_stream(transport, config, statements, self.mode, options, false)
                    .await?;
            self.complete(entities, &result)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.prepare(config).map(|(_, v)| v)
    }

    fn describe(&self) -> String {
        describe_mode(
            self.mode,
            "update",
            &self.context.target.table().full_name(),
            self.entities.len(),
        )
    }
}

/// Delete of entities by identifier, versioned entities are checked.
#[derive(Debug, Clone)]
pub struct EntityDeleteRunner<E> {
    pub context: EntityDeleteContext<E>,
    pub entities: Vec<E>,
    pub mode: WriteMode,
}

impl<E: Entity> EntityDeleteRunner<E> {
    pub fn new(context: EntityDeleteContext<E>, entities: Vec<E>, mode: WriteMode) -> Self {
        Self {
            context,
            entities,
            mode,
        }
    }

    fn prepare(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.entities
            .iter()
            .map(|v| build_entity_delete(config.dialect.as_ref(), &self.context, v))
            .collect()
    }

    fn complete(&self, result: &BatchResult) -> Result<()> {
        let lifecycle = EntityLifecycle::new(&self.context.target);
        let check = VersionCheck::from(&self.context.options);
        let indexes: Vec<usize> = (0..self.entities.len()).collect();
        reconcile(indexes, &result.counts, |_, count, index| {
            lifecycle.post_delete(count, index, check)
        })?;
        Ok(())
    }
}

impl<E: Entity> Runner<()> for EntityDeleteRunner<E> {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<()> {
        let statements = self.prepare(config)?;
        let options = config.execution.merge(&self.context.options.execution);
        let result = execute_write(transport, config, &statements, self.mode, &options, false)?;
        self.complete(&result)
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let statements = self.prepare(config)?;
            let options = config.execution.merge(&self.context.options.execution);
            let result =
                execute_write_stream(transport, config, statements, self.mode, options, false)
                    .await?;
            self.complete(&result)
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.prepare(config)
    }

    fn describe(&self) -> String {
        describe_mode(
            self.mode,
            "delete",
            &self.context.target.table().full_name(),
            self.entities.len(),
        )
    }
}
