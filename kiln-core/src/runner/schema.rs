use super::{Runner, log_statement};
use crate::{
    DatabaseConfig, Error, Result, SchemaContext, Statement, StreamTransport, Transport,
    build_schema_create, build_schema_drop,
};
use futures::future::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOperation {
    /// Creates the tables, the ones existing already are left untouched.
    Create,
    Drop,
}

/// Creates or drops the tables of some metamodels, one statement per table.
#[derive(Debug, Clone)]
pub struct SchemaRunner {
    pub context: SchemaContext,
    pub operation: SchemaOperation,
}

impl SchemaRunner {
    pub fn new(context: SchemaContext, operation: SchemaOperation) -> Self {
        Self { context, operation }
    }

    fn statements(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        match self.operation {
            SchemaOperation::Create => build_schema_create(config.dialect.as_ref(), &self.context),
            SchemaOperation::Drop => build_schema_drop(config.dialect.as_ref(), &self.context),
        }
    }

    /// Swallows the "already exists" errors of a create.
    fn handle(&self, config: &DatabaseConfig, result: Result<()>) -> Result<()> {
        let Err(error) = result else {
            return Ok(());
        };
        let exists = self.operation == SchemaOperation::Create
            && (config.dialect.is_table_exists_error(&error)
                || config.dialect.is_sequence_exists_error(&error));
        if exists {
            log::info!("Skipping an object that exists already: {error:#}");
            return Ok(());
        }
        Err(error)
    }
}

impl Runner<()> for SchemaRunner {
    fn run(&self, transport: &mut dyn Transport, config: &DatabaseConfig) -> Result<()> {
        let options = config.execution.merge(&self.context.options.execution);
        for statement in self.statements(config)? {
            log_statement(config, &statement);
            let result = transport.execute(&statement, &options);
            self.handle(config, result)?;
        }
        Ok(())
    }

    fn run_stream<'a>(
        &'a self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let options = config.execution.merge(&self.context.options.execution);
            for statement in self.statements(config)? {
                log_statement(config, &statement);
                let result = transport.execute(statement, options).await;
                self.handle(config, result)?;
            }
            Ok::<(), Error>(())
        })
    }

    fn dry_run(&self, config: &DatabaseConfig) -> Result<Vec<Statement>> {
        self.statements(config)
    }

    fn describe(&self) -> String {
        let tables = self
            .context
            .metamodels
            .iter()
            .map(|v| v.table().full_name())
            .collect::<Vec<_>>()
            .join(", ");
        match self.operation {
            SchemaOperation::Create => format!("create {tables}"),
            SchemaOperation::Drop => format!("drop {tables}"),
        }
    }
}
