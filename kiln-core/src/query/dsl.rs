//! Entry points building contexts and turning them into queries.
//!
//! Every method takes `&self` and returns a new value, a partially built query can be shared
//! and extended in different directions.

use super::{IntoQuery, Query};
use crate::{
    ColumnExpression, DatabaseConfig, DeleteOptions, DuplicateKeyAction, Entity,
    EntityCollector, EntityDeleteContext, EntityDeleteRunner, EntityInsertContext,
    EntityInsertRunner, EntityMetamodel, EntityUpdateContext, EntityUpdateRunner,
    EntityUpsertRunner, InsertOptions, JoinDef, JoinType, NotNullProjectionCollector,
    OnDuplicateKey, Projection, ProjectionCollector, PropertyExpression, RecordCollector,
    RelationDeleteContext, RelationDeleteRunner, RelationInsertContext, RelationInsertRunner,
    RelationUpdateContext, RelationUpdateRunner, Result, RowCollector, RowDecoder, SchemaContext,
    SchemaOperation, SchemaOptions, SchemaRunner, SelectContext, SelectOptions, SelectRunner,
    SetScope, Single, StoreCollector, StreamTransport, TableMetamodel, UpdateOptions, WhereScope,
    WriteMode, table_metamodel,
};
use futures::stream::BoxStream;
use std::sync::Arc;

/// Queries over entities.
pub struct EntityDsl;

impl EntityDsl {
    pub fn from<E: Entity>(metamodel: &EntityMetamodel<E>) -> SelectQuery<E> {
        SelectQuery {
            context: SelectContext::new(metamodel.clone()),
            collector: EntityCollector,
        }
    }
    pub fn insert<E: Entity>(metamodel: &EntityMetamodel<E>) -> InsertQuery<E> {
        InsertQuery {
            context: EntityInsertContext::new(metamodel.clone()),
        }
    }
    pub fn update<E: Entity>(metamodel: &EntityMetamodel<E>) -> UpdateQuery<E> {
        UpdateQuery {
            context: EntityUpdateContext::new(metamodel.clone()),
        }
    }
    pub fn delete<E: Entity>(metamodel: &EntityMetamodel<E>) -> DeleteQuery<E> {
        DeleteQuery {
            context: EntityDeleteContext::new(metamodel.clone()),
        }
    }
}

/// Set based statements, not tied to entity instances.
pub struct SqlDsl;

impl SqlDsl {
    pub fn insert<E: Entity>(metamodel: &EntityMetamodel<E>) -> RelationInsertQuery<E> {
        RelationInsertQuery {
            context: RelationInsertContext::new(metamodel.clone()),
        }
    }
    pub fn update<E: Entity>(metamodel: &EntityMetamodel<E>) -> RelationUpdateQuery<E> {
        RelationUpdateQuery {
            context: RelationUpdateContext::new(metamodel.clone()),
        }
    }
    pub fn delete<E: Entity>(metamodel: &EntityMetamodel<E>) -> RelationDeleteQuery<E> {
        RelationDeleteQuery {
            context: RelationDeleteContext::new(metamodel.clone()),
        }
    }
}

/// Table creation and removal.
pub struct SchemaDsl;

impl SchemaDsl {
    /// Creates the tables in order, tables that exist already are skipped.
    pub fn create(metamodels: impl IntoIterator<Item = Arc<dyn TableMetamodel>>) -> SchemaQuery {
        SchemaQuery {
            context: SchemaContext::new(metamodels.into_iter().collect()),
            operation: SchemaOperation::Create,
        }
    }
    pub fn drop(metamodels: impl IntoIterator<Item = Arc<dyn TableMetamodel>>) -> SchemaQuery {
        SchemaQuery {
            context: SchemaContext::new(metamodels.into_iter().collect()),
            operation: SchemaOperation::Drop,
        }
    }
}

/// Select over `E`, its rows are collected by `C`.
#[derive(Debug, Clone)]
pub struct SelectQuery<E, C = EntityCollector> {
    context: SelectContext<E>,
    collector: C,
}

impl<E: Entity, C: Clone> SelectQuery<E, C> {
    pub fn context(&self) -> &SelectContext<E> {
        &self.context
    }

    fn with(&self, f: impl FnOnce(&mut crate::SelectClauses)) -> Self {
        Self {
            context: self.context.with_clauses(f),
            collector: self.collector.clone(),
        }
    }

    /// Criteria joined with `AND` to the ones declared before.
    pub fn filter(&self, f: impl FnOnce(&mut WhereScope)) -> Self {
        let criteria = WhereScope::build(f);
        self.with(|v| v.filter.extend(criteria))
    }
    pub fn distinct(&self) -> Self {
        self.with(|v| v.distinct = true)
    }
    pub fn inner_join<S: 'static>(
        &self,
        metamodel: &EntityMetamodel<S>,
        on: impl FnOnce(&mut WhereScope),
    ) -> Self {
        self.join(JoinType::Inner, metamodel, on)
    }
    pub fn left_join<S: 'static>(
        &self,
        metamodel: &EntityMetamodel<S>,
        on: impl FnOnce(&mut WhereScope),
    ) -> Self {
        self.join(JoinType::Left, metamodel, on)
    }
    fn join<S: 'static>(
        &self,
        join_type: JoinType,
        metamodel: &EntityMetamodel<S>,
        on: impl FnOnce(&mut WhereScope),
    ) -> Self {
        let join = JoinDef {
            join_type,
            target: table_metamodel(metamodel),
            on: WhereScope::build(on),
        };
        self.with(|v| v.joins.push(join))
    }
    pub fn group_by<T>(&self, expression: &PropertyExpression<T>) -> Self {
        let expression = expression.erase();
        self.with(|v| v.group_by.push(expression))
    }
    pub fn having(&self, f: impl FnOnce(&mut WhereScope)) -> Self {
        let criteria = WhereScope::build(f);
        self.with(|v| v.having.extend(criteria))
    }
    /// Appends an ordering, use [`PropertyExpression::desc`] for a descending one.
    pub fn order_by<T>(&self, expression: &PropertyExpression<T>) -> Self {
        let expression = expression.erase();
        self.with(|v| v.order_by.push(expression))
    }
    pub fn limit(&self, limit: u64) -> Self {
        self.with(|v| v.limit = Some(limit))
    }
    pub fn offset(&self, offset: u64) -> Self {
        self.with(|v| v.offset = Some(offset))
    }
    /// Locks the selected rows, on the databases supporting it.
    pub fn for_update(&self) -> Self {
        self.with(|v| v.for_update = true)
    }
    pub fn options(&self, f: impl FnOnce(SelectOptions) -> SelectOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
            collector: self.collector.clone(),
        }
    }
}

impl<E: Entity> SelectQuery<E, EntityCollector> {
    /// The rows as an [`crate::EntityStore`] holding the target and `metamodel`.
    pub fn include<S: 'static>(&self, metamodel: &EntityMetamodel<S>) -> SelectQuery<E, StoreCollector> {
        let mut includes = self.context.includes.clone();
        includes.push(table_metamodel(metamodel));
        SelectQuery {
            context: self.context.with_includes(includes),
            collector: StoreCollector,
        }
    }

    /// The rows as an [`crate::EntityStore`] holding the target and every joined metamodel.
    pub fn include_all(&self) -> SelectQuery<E, StoreCollector> {
        let includes = self
            .context
            .clauses
            .joins
            .iter()
            .map(|v| v.target.clone())
            .collect();
        SelectQuery {
            context: self.context.with_includes(includes),
            collector: StoreCollector,
        }
    }

    /// Selects the columns of `projection` in place of the entity, every column nullable.
    pub fn select<P: Projection + Clone>(&self, projection: P) -> SelectQuery<E, ProjectionCollector<P>> {
        SelectQuery {
            context: self.context.with_projection(projection.expressions()),
            collector: ProjectionCollector(projection),
        }
    }

    /// Like `select`, a null value in any column is a mapping error.
    pub fn select_not_null<P: Projection + Clone>(
        &self,
        projection: P,
    ) -> SelectQuery<E, NotNullProjectionCollector<P>> {
        SelectQuery {
            context: self.context.with_projection(projection.expressions()),
            collector: NotNullProjectionCollector(projection),
        }
    }

    /// Selects arbitrary expressions, every row is a [`crate::Record`] keyed by them.
    pub fn select_columns(
        &self,
        columns: impl IntoIterator<Item = Arc<ColumnExpression>>,
    ) -> SelectQuery<E, RecordCollector> {
        SelectQuery {
            context: self.context.with_projection(columns.into_iter().collect()),
            collector: RecordCollector,
        }
    }
}

impl<E: Entity, C: RowDecoder<E> + Clone> SelectQuery<E, C> {
    /// Lazy sequence of the rows, for the streaming transport.
    ///
    /// The sequence can be consumed once, build it again for a fresh one.
    pub fn stream<'a>(
        &self,
        transport: &'a mut dyn StreamTransport,
        config: &'a DatabaseConfig,
    ) -> BoxStream<'a, Result<C::Item>> {
        let runner = SelectRunner::new(self.context.clone(), self.collector.clone());
        Box::pin(async_stream::try_stream! {
            let mut rows = runner.stream(transport, config);
            while let Some(row) = futures::StreamExt::next(&mut rows).await {
                yield row?;
            }
        })
    }
}

impl<E: Entity, C: RowCollector<E> + Clone> IntoQuery<C::Output> for SelectQuery<E, C> {
    fn into_query(self) -> Query<C::Output> {
        Query::primitive(SelectRunner::new(self.context, self.collector))
    }
}

impl<E: Entity, C: RowCollector<E> + Clone> IntoQuery<C::Output> for &SelectQuery<E, C> {
    fn into_query(self) -> Query<C::Output> {
        self.clone().into_query()
    }
}

/// Insert of entities.
#[derive(Debug, Clone)]
pub struct InsertQuery<E> {
    context: EntityInsertContext<E>,
}

impl<E: Entity> InsertQuery<E> {
    pub fn options(&self, f: impl FnOnce(InsertOptions) -> InsertOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
    /// Inserts `entity`, the result is the inserted value.
    pub fn single(&self, entity: &E) -> Query<E> {
        Query::primitive(Single(EntityInsertRunner::new(
            self.context.clone(),
            vec![entity.clone()],
            WriteMode::Single,
        )))
    }
    /// Inserts all the entities with a single statement.
    pub fn multiple(&self, entities: &[E]) -> Query<Vec<E>> {
        Query::primitive(EntityInsertRunner::new(
            self.context.clone(),
            entities.to_vec(),
            WriteMode::Multiple,
        ))
    }
    /// Inserts all the entities with a batch of statements.
    pub fn batch(&self, entities: &[E]) -> Query<Vec<E>> {
        Query::primitive(EntityInsertRunner::new(
            self.context.clone(),
            entities.to_vec(),
            WriteMode::Batch,
        ))
    }
    /// On a conflict over `keys` (the identifier when empty) the existing row is updated.
    pub fn on_duplicate_key_update(
        &self,
        keys: impl IntoIterator<Item = Arc<ColumnExpression>>,
    ) -> UpsertQuery<E> {
        self.on_duplicate_key(DuplicateKeyAction::Update, keys)
    }
    /// On a conflict over `keys` (the identifier when empty) the row is skipped.
    pub fn on_duplicate_key_ignore(
        &self,
        keys: impl IntoIterator<Item = Arc<ColumnExpression>>,
    ) -> UpsertQuery<E> {
        self.on_duplicate_key(DuplicateKeyAction::Ignore, keys)
    }
    fn on_duplicate_key(
        &self,
        action: DuplicateKeyAction,
        keys: impl IntoIterator<Item = Arc<ColumnExpression>>,
    ) -> UpsertQuery<E> {
        UpsertQuery {
            context: self.context.with_on_duplicate_key(OnDuplicateKey {
                action,
                keys: keys.into_iter().collect(),
                assignments: Vec::new(),
            }),
        }
    }
}

/// Insert with a conflict clause, the results are affected counts.
#[derive(Debug, Clone)]
pub struct UpsertQuery<E> {
    context: EntityInsertContext<E>,
}

impl<E: Entity> UpsertQuery<E> {
    /// Assignments applied on conflict in place of the default ones. The row proposed for
    /// insertion is reachable through [`EntityMetamodel::excluded`].
    pub fn set(&self, f: impl FnOnce(&mut SetScope)) -> Self {
        let mut context = self.context.clone();
        if let Some(v) = context.on_duplicate_key.as_mut() {
            v.assignments.extend(SetScope::build(f));
        }
        Self { context }
    }
    pub fn options(&self, f: impl FnOnce(InsertOptions) -> InsertOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
    pub fn single(&self, entity: &E) -> Query<u64> {
        Query::primitive(Single(EntityUpsertRunner::new(
            self.context.clone(),
            vec![entity.clone()],
            WriteMode::Single,
        )))
    }
    pub fn multiple(&self, entities: &[E]) -> Query<u64> {
        Query::primitive(Single(EntityUpsertRunner::new(
            self.context.clone(),
            entities.to_vec(),
            WriteMode::Multiple,
        )))
    }
    /// One count per entity.
    pub fn batch(&self, entities: &[E]) -> Query<Vec<u64>> {
        Query::primitive(EntityUpsertRunner::new(
            self.context.clone(),
            entities.to_vec(),
            WriteMode::Batch,
        ))
    }
}

/// Update of entities by identifier.
#[derive(Debug, Clone)]
pub struct UpdateQuery<E> {
    context: EntityUpdateContext<E>,
}

impl<E: Entity> UpdateQuery<E> {
    /// Criteria added to the identifier and version ones.
    pub fn filter(&self, f: impl FnOnce(&mut WhereScope)) -> Self {
        Self {
            context: self.context.with_filter(WhereScope::build(f)),
        }
    }
    pub fn options(&self, f: impl FnOnce(UpdateOptions) -> UpdateOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
    /// Updates `entity`, the result is the updated value with its version incremented.
    pub fn single(&self, entity: &E) -> Query<E> {
        Query::primitive(Single(EntityUpdateRunner::new(
            self.context.clone(),
            vec![entity.clone()],
            WriteMode::Single,
        )))
    }
    pub fn batch(&self, entities: &[E]) -> Query<Vec<E>> {
        Query::primitive(EntityUpdateRunner::new(
            self.context.clone(),
            entities.to_vec(),
            WriteMode::Batch,
        ))
    }
}

/// Delete of entities by identifier.
#[derive(Debug, Clone)]
pub struct DeleteQuery<E> {
    context: EntityDeleteContext<E>,
}

impl<E: Entity> DeleteQuery<E> {
    pub fn options(&self, f: impl FnOnce(DeleteOptions) -> DeleteOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
    pub fn single(&self, entity: &E) -> Query<()> {
        Query::primitive(EntityDeleteRunner::new(
            self.context.clone(),
            vec![entity.clone()],
            WriteMode::Single,
        ))
    }
    pub fn batch(&self, entities: &[E]) -> Query<()> {
        Query::primitive(EntityDeleteRunner::new(
            self.context.clone(),
            entities.to_vec(),
            WriteMode::Batch,
        ))
    }
}

/// Insert of explicitly assigned columns.
#[derive(Debug, Clone)]
pub struct RelationInsertQuery<E> {
    context: RelationInsertContext<E>,
}

impl<E: Entity> RelationInsertQuery<E> {
    pub fn values(&self, f: impl FnOnce(&mut SetScope)) -> Self {
        Self {
            context: self.context.with_assignments(SetScope::build(f)),
        }
    }
    pub fn options(&self, f: impl FnOnce(InsertOptions) -> InsertOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
}

impl<E: Entity> IntoQuery<(u64, Option<i64>)> for RelationInsertQuery<E> {
    fn into_query(self) -> Query<(u64, Option<i64>)> {
        Query::primitive(RelationInsertRunner::new(self.context))
    }
}

/// Set based update.
#[derive(Debug, Clone)]
pub struct RelationUpdateQuery<E> {
    context: RelationUpdateContext<E>,
}

impl<E: Entity> RelationUpdateQuery<E> {
    pub fn set(&self, f: impl FnOnce(&mut SetScope)) -> Self {
        Self {
            context: self.context.with_assignments(SetScope::build(f)),
        }
    }
    pub fn filter(&self, f: impl FnOnce(&mut WhereScope)) -> Self {
        Self {
            context: self.context.with_filter(WhereScope::build(f)),
        }
    }
    pub fn options(&self, f: impl FnOnce(UpdateOptions) -> UpdateOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
}

impl<E: Entity> IntoQuery<u64> for RelationUpdateQuery<E> {
    fn into_query(self) -> Query<u64> {
        Query::primitive(RelationUpdateRunner::new(self.context))
    }
}

/// Set based delete.
#[derive(Debug, Clone)]
pub struct RelationDeleteQuery<E> {
    context: RelationDeleteContext<E>,
}

impl<E: Entity> RelationDeleteQuery<E> {
    pub fn filter(&self, f: impl FnOnce(&mut WhereScope)) -> Self {
        Self {
            context: self.context.with_filter(WhereScope::build(f)),
        }
    }
    pub fn options(&self, f: impl FnOnce(DeleteOptions) -> DeleteOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
        }
    }
}

impl<E: Entity> IntoQuery<u64> for RelationDeleteQuery<E> {
    fn into_query(self) -> Query<u64> {
        Query::primitive(RelationDeleteRunner::new(self.context))
    }
}

/// Creation or removal of tables.
#[derive(Debug, Clone)]
pub struct SchemaQuery {
    context: SchemaContext,
    operation: SchemaOperation,
}

impl SchemaQuery {
    pub fn options(&self, f: impl FnOnce(SchemaOptions) -> SchemaOptions) -> Self {
        Self {
            context: self.context.with_options(f(self.context.options)),
            operation: self.operation,
        }
    }
}

impl IntoQuery<()> for SchemaQuery {
    fn into_query(self) -> Query<()> {
        Query::primitive(SchemaRunner::new(self.context, self.operation))
    }
}
