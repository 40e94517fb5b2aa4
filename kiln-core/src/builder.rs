//! Statement builders: pure functions turning a context (and the entities it applies to) into
//! a [`Statement`] for a dialect.

use crate::{
    Assignment, ColumnExpression, ColumnRef, Criterion, Dialect, DuplicateKeyAction,
    EntityDeleteContext, EntityInsertContext, EntityMetamodel, EntityUpdateContext,
    OnDuplicateKey, Operand, QueryError, RelationDeleteContext, RelationInsertContext,
    RelationUpdateContext, Result, SchemaContext, SelectContext, Statement, TableMetamodel,
    UpsertClause, Value,
    writer::StatementBuffer,
};
use std::{slice, sync::Arc};

fn property_column(expression: &ColumnExpression, clause: &str) -> Result<ColumnRef> {
    match expression.unsorted() {
        ColumnExpression::Property(column) => Ok(column.clone()),
        v => Err(QueryError::Build(format!(
            "Only properties can be used in the {clause} clause, found {v:?}"
        ))
        .into()),
    }
}

fn resolve_assignments(assignments: &[Assignment], clause: &str) -> Result<Vec<(ColumnRef, Operand)>> {
    assignments
        .iter()
        .map(|v| Ok((property_column(&v.column, clause)?, v.value.clone())))
        .collect()
}

/// `id = ?` for every identifier property, fails when an identifier is null.
fn id_criteria<E>(target: &EntityMetamodel<E>, entity: &E) -> Result<Vec<Criterion>> {
    let mut criteria = Vec::new();
    for property in target.id_properties() {
        let value = property.get(entity);
        if value.is_null() {
            return Err(QueryError::Build(format!(
                "The identifier `{}` of `{}` is null",
                property.name(),
                target.name()
            ))
            .into());
        }
        criteria.push(Criterion::Compare {
            op: crate::BinaryOpType::Equal,
            lhs: Operand::Column(Arc::new(ColumnExpression::Property(
                target.column_ref(property.column.name.clone()),
            ))),
            rhs: Operand::Parameter(value),
        });
    }
    if criteria.is_empty() {
        return Err(QueryError::Build(format!("`{}` has no identifier", target.name())).into());
    }
    Ok(criteria)
}

fn version_criterion<E>(target: &EntityMetamodel<E>, entity: &E) -> Option<Criterion> {
    target.version_property().map(|property| Criterion::Compare {
        op: crate::BinaryOpType::Equal,
        lhs: Operand::Column(Arc::new(ColumnExpression::Property(
            target.column_ref(property.column.name.clone()),
        ))),
        rhs: Operand::Parameter(property.get(entity)),
    })
}

pub fn build_select<E>(dialect: &dyn Dialect, context: &SelectContext<E>) -> Result<Statement> {
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_select(
        &mut out,
        context.target.table(),
        &context.columns(),
        &context.clauses,
    );
    Ok(out.finish())
}

/// Columns written by an insert: all of them but the generated identity.
fn insert_columns<E>(target: &EntityMetamodel<E>) -> Vec<usize> {
    let identity = target.identity_property().map(|v| v.name().to_string());
    target
        .properties()
        .iter()
        .enumerate()
        .filter(|(_, v)| Some(v.name()) != identity.as_deref())
        .map(|(i, _)| i)
        .collect()
}

fn resolve_upsert<E>(
    target: &EntityMetamodel<E>,
    columns: &[ColumnRef],
    on_duplicate_key: &OnDuplicateKey,
) -> Result<(Vec<ColumnRef>, Vec<(ColumnRef, Operand)>)> {
    let keys = if on_duplicate_key.keys.is_empty() {
        target
            .id_properties()
            .map(|v| target.column_ref(v.column.name.clone()))
            .collect::<Vec<_>>()
    } else {
        on_duplicate_key
            .keys
            .iter()
            .map(|v| property_column(v, "on duplicate key"))
            .collect::<Result<Vec<_>>>()?
    };
    let assignments = if on_duplicate_key.action == DuplicateKeyAction::Ignore {
        Vec::new()
    } else if on_duplicate_key.assignments.is_empty() {
        let excluded = target.excluded();
        let created_at = target.created_at_property().map(|v| v.name());
        columns
            .iter()
            .filter(|c| {
                !keys.iter().any(|k| k.name == c.name)
                    && !target.id_properties().any(|v| v.name() == c.name)
                    && Some(&*c.name) != created_at
            })
            .map(|c| {
                (
                    c.clone(),
                    Operand::Column(Arc::new(ColumnExpression::Property(
                        excluded.column_ref(c.name.clone()),
                    ))),
                )
            })
            .collect()
    } else {
        resolve_assignments(&on_duplicate_key.assignments, "on duplicate key update")?
    };
    if on_duplicate_key.action == DuplicateKeyAction::Update && assignments.is_empty() {
        return Err(QueryError::Build(format!(
            "The upsert of `{}` has nothing to update",
            target.name()
        ))
        .into());
    }
    Ok((keys, assignments))
}

/// Insert of a single entity.
pub fn build_entity_insert<E>(
    dialect: &dyn Dialect,
    context: &EntityInsertContext<E>,
    entity: &E,
) -> Result<Statement> {
    build_entity_insert_multiple(dialect, context, slice::from_ref(entity))
}

/// Insert of one row per entity in a single statement, the conflict clause of the context is
/// honored.
pub fn build_entity_insert_multiple<E>(
    dialect: &dyn Dialect,
    context: &EntityInsertContext<E>,
    entities: &[E],
) -> Result<Statement> {
    let target = &context.target;
    if entities.is_empty() {
        return Err(QueryError::Build(format!("No `{}` to insert", target.name())).into());
    }
    let indexes = insert_columns(target);
    let properties = target.properties();
    let columns = indexes
        .iter()
        .map(|i| target.column_ref(properties[*i].column.name.clone()))
        .collect::<Vec<_>>();
    let rows = entities
        .iter()
        .map(|entity| {
            indexes
                .iter()
                .map(|i| Operand::Parameter(properties[*i].get(entity)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let upsert = context
        .on_duplicate_key
        .as_ref()
        .map(|v| resolve_upsert(target, &columns, v))
        .transpose()?;
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_insert(
        &mut out,
        target.table(),
        &columns,
        &rows,
        upsert
            .as_ref()
            .zip(context.on_duplicate_key.as_ref())
            .map(|((keys, assignments), on_duplicate_key)| UpsertClause {
                action: on_duplicate_key.action,
                keys,
                assignments,
            })
            .as_ref(),
    );
    Ok(out.finish())
}

/// Update of every non identifier column of `entity`, versioned unless the options say so.
pub fn build_entity_update<E>(
    dialect: &dyn Dialect,
    context: &EntityUpdateContext<E>,
    entity: &E,
) -> Result<Statement> {
    let target = &context.target;
    let mut criteria = id_criteria(target, entity)?;
    let version = target.version_index().filter(|_| !context.options.ignore_version);
    let mut assignments = Vec::new();
    for (i, property) in target.properties().iter().enumerate() {
        if target.is_id(i) || Some(i) == target.created_at_index() {
            continue;
        }
        let column = target.column_ref(property.column.name.clone());
        if Some(i) == version {
            let current = Arc::new(ColumnExpression::Property(column.clone()));
            assignments.push((
                column,
                Operand::Column(Arc::new(ColumnExpression::Arithmetic {
                    op: crate::BinaryOpType::Addition,
                    lhs: Operand::Column(current),
                    rhs: Operand::Parameter(version_one(&property.column.value)),
                })),
            ));
            continue;
        }
        assignments.push((column, Operand::Parameter(property.get(entity))));
    }
    if version.is_some() {
        criteria.extend(version_criterion(target, entity));
    }
    if !context.filter.is_empty() {
        criteria.push(Criterion::And(context.filter.clone()));
    }
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_update(&mut out, target.table(), &assignments, &criteria);
    Ok(out.finish())
}

/// The value one having the same type as the version prototype.
fn version_one(prototype: &Value) -> Value {
    match prototype {
        Value::Int16(..) => Value::Int16(Some(1)),
        Value::Int64(..) => Value::Int64(Some(1)),
        _ => Value::Int32(Some(1)),
    }
}

pub fn build_entity_delete<E>(
    dialect: &dyn Dialect,
    context: &EntityDeleteContext<E>,
    entity: &E,
) -> Result<Statement> {
    let target = &context.target;
    let mut criteria = id_criteria(target, entity)?;
    if !context.options.ignore_version {
        criteria.extend(version_criterion(target, entity));
    }
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_delete(&mut out, target.table(), &criteria);
    Ok(out.finish())
}

pub fn build_relation_update<E>(
    dialect: &dyn Dialect,
    context: &RelationUpdateContext<E>,
    updated_at: Option<Value>,
) -> Result<Statement> {
    let target = &context.target;
    let mut assignments = resolve_assignments(&context.assignments, "set")?;
    if let (Some(property), Some(now)) = (target.updated_at_property(), updated_at) {
        if !assignments.iter().any(|(c, _)| c.name == property.column.name) {
            assignments.push((
                target.column_ref(property.column.name.clone()),
                Operand::Parameter(now),
            ));
        }
    }
    if assignments.is_empty() {
        return Err(QueryError::Build(format!(
            "The update of `{}` has no assignment",
            target.name()
        ))
        .into());
    }
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_update(&mut out, target.table(), &assignments, &context.filter);
    Ok(out.finish())
}

pub fn build_relation_delete<E>(
    dialect: &dyn Dialect,
    context: &RelationDeleteContext<E>,
) -> Result<Statement> {
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_delete(&mut out, context.target.table(), &context.filter);
    Ok(out.finish())
}

pub fn build_relation_insert<E>(
    dialect: &dyn Dialect,
    context: &RelationInsertContext<E>,
) -> Result<Statement> {
    let assignments = resolve_assignments(&context.assignments, "values")?;
    if assignments.is_empty() {
        return Err(QueryError::Build(format!(
            "The insert into `{}` has no value",
            context.target.name()
        ))
        .into());
    }
    let (columns, row): (Vec<_>, Vec<_>) = assignments.into_iter().unzip();
    let writer = dialect.sql_writer();
    let mut out = StatementBuffer::new();
    writer.write_insert(&mut out, context.target.table(), &columns, &[row], None);
    Ok(out.finish())
}

/// One `CREATE TABLE` per metamodel, in order.
pub fn build_schema_create(dialect: &dyn Dialect, context: &SchemaContext) -> Result<Vec<Statement>> {
    let writer = dialect.sql_writer();
    Ok(context
        .metamodels
        .iter()
        .map(|metamodel| {
            let mut out = StatementBuffer::new();
            writer.write_create_table(&mut out, metamodel.as_ref());
            out.finish()
        })
        .collect())
}

/// One `DROP TABLE` per metamodel, in order.
pub fn build_schema_drop(dialect: &dyn Dialect, context: &SchemaContext) -> Result<Vec<Statement>> {
    let writer = dialect.sql_writer();
    Ok(context
        .metamodels
        .iter()
        .map(|metamodel| {
            let mut out = StatementBuffer::new();
            writer.write_drop_table(&mut out, metamodel.table());
            out.finish()
        })
        .collect())
}

/// Erases the entity type of a metamodel.
pub fn table_metamodel<E: 'static>(metamodel: &EntityMetamodel<E>) -> Arc<dyn TableMetamodel> {
    Arc::new(metamodel.clone())
}
