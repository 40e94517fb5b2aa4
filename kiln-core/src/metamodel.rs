use crate::{
    AsValue, ColumnDef, ColumnExpression, ColumnRef, PrimaryKeyType, PropertyExpression,
    QueryError, Result, TableRef, Value,
};
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    hash::Hash,
    sync::Arc,
};

/// A persistent type. Identity is what the entity store and the relation helpers group by.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    fn id(&self) -> Self::Id;
}

/// How the identifier of a new entity is produced.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenerator {
    /// The caller sets the identifier before inserting.
    #[default]
    Assigned,
    /// The database generates it on insert, the generated key is written back to the entity.
    Identity,
}

/// Accessor pair binding a column to a field of `E`.
pub struct Property<E> {
    pub column: ColumnDef,
    getter: Arc<dyn Fn(&E) -> Value + Send + Sync>,
    setter: Arc<dyn Fn(&mut E, Value) -> Result<()> + Send + Sync>,
}

impl<E: 'static> Property<E> {
    /// Property named `name` reading and writing the field returned by the two accessors.
    pub fn new<T: AsValue + Clone + 'static>(
        name: impl Into<Cow<'static, str>>,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self {
        Self {
            column: ColumnDef {
                name: name.into(),
                value: T::as_empty_value(),
                nullable: T::nullable(),
                ..Default::default()
            },
            getter: Arc::new(move |entity| get(entity).clone().as_value()),
            setter: Arc::new(move |entity, value| {
                *get_mut(entity) = T::try_from_value(value)?;
                Ok(())
            }),
        }
    }
}

impl<E> Property<E> {
    /// Marks the column as unique.
    pub fn unique(mut self) -> Self {
        self.column.unique = true;
        self
    }
    pub fn name(&self) -> &str {
        &self.column.name
    }
    pub fn get(&self, entity: &E) -> Value {
        (self.getter)(entity)
    }
    pub fn set(&self, entity: &mut E, value: Value) -> Result<()> {
        (self.setter)(entity, value)
    }
}

impl<E> Clone for Property<E> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<E> Debug for Property<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("column", &self.column)
            .finish()
    }
}

/// Table level description of a metamodel, independent of the entity type.
pub trait TableMetamodel: Send + Sync + Debug {
    fn table(&self) -> &TableRef;
    fn column_defs(&self) -> Vec<ColumnDef>;
    /// Every column, as expressions of this (possibly aliased) table.
    fn columns(&self) -> Vec<Arc<ColumnExpression>>;
    fn id_generator(&self) -> IdGenerator;
}

/// Metadata of an entity type: table, ordered properties and their roles.
///
/// It is cheap to clone. An aliased copy (see [`EntityMetamodel::with_alias`]) describes the
/// same entity and produces property expressions qualified by the alias.
pub struct EntityMetamodel<E> {
    table: TableRef,
    properties: Arc<[Property<E>]>,
    id: Arc<[usize]>,
    version: Option<usize>,
    created_at: Option<usize>,
    updated_at: Option<usize>,
    id_generator: IdGenerator,
    factory: fn() -> E,
}

impl<E: 'static> EntityMetamodel<E> {
    pub fn builder(name: impl Into<Cow<'static, str>>, factory: fn() -> E) -> EntityMetamodelBuilder<E> {
        EntityMetamodelBuilder {
            table: TableRef::new(name),
            properties: Vec::new(),
            id: Vec::new(),
            version: None,
            created_at: None,
            updated_at: None,
            id_generator: IdGenerator::Assigned,
            factory,
        }
    }
}

impl<E> EntityMetamodel<E> {
    pub fn table(&self) -> &TableRef {
        &self.table
    }
    pub fn name(&self) -> &str {
        &self.table.name
    }
    pub fn properties(&self) -> &[Property<E>] {
        &self.properties
    }
    pub fn id_properties(&self) -> impl Iterator<Item = &Property<E>> + Clone {
        self.id.iter().map(|i| &self.properties[*i])
    }
    pub fn is_id(&self, index: usize) -> bool {
        self.id.contains(&index)
    }
    pub fn version_property(&self) -> Option<&Property<E>> {
        self.version.map(|i| &self.properties[i])
    }
    pub fn created_at_property(&self) -> Option<&Property<E>> {
        self.created_at.map(|i| &self.properties[i])
    }
    pub fn updated_at_property(&self) -> Option<&Property<E>> {
        self.updated_at.map(|i| &self.properties[i])
    }
    pub fn version_index(&self) -> Option<usize> {
        self.version
    }
    pub fn created_at_index(&self) -> Option<usize> {
        self.created_at
    }
    pub fn id_generator(&self) -> IdGenerator {
        self.id_generator
    }

    /// The identity property, present only when the database generates the identifier.
    pub fn identity_property(&self) -> Option<&Property<E>> {
        match (self.id_generator, self.id.as_ref()) {
            (IdGenerator::Identity, [single]) => Some(&self.properties[*single]),
            _ => None,
        }
    }

    /// A fresh entity, all properties unset.
    pub fn new_entity(&self) -> E {
        (self.factory)()
    }

    /// Same entity, its expressions are qualified by `alias`.
    pub fn with_alias(&self, alias: impl Into<Cow<'static, str>>) -> Self {
        Self {
            table: self.table.clone().with_alias(alias),
            ..self.clone()
        }
    }

    /// The row proposed for insertion, only meaningful inside the set clause of an upsert.
    pub fn excluded(&self) -> Self {
        Self {
            table: self.table.as_excluded(),
            ..self.clone()
        }
    }

    pub fn column_ref(&self, name: impl Into<Cow<'static, str>>) -> ColumnRef {
        ColumnRef::new(self.table.clone(), name)
    }

    /// Typed expression of the property named `name`.
    pub fn property<T>(&self, name: &'static str) -> PropertyExpression<T> {
        debug_assert!(
            self.properties.iter().any(|v| v.name() == name),
            "`{}` has no property named `{}`",
            self.table.name,
            name
        );
        PropertyExpression::column(self.column_ref(name))
    }

    /// Builds an entity out of one value per property, in declaration order.
    pub fn decode(&self, values: impl IntoIterator<Item = Value>, row: usize) -> Result<E> {
        let mut entity = self.new_entity();
        for (property, value) in self.properties.iter().zip(values) {
            property.set(&mut entity, value).map_err(|e| QueryError::Mapping {
                target: self.table.full_name(),
                property: property.name().to_string(),
                row,
                message: format!("{e:#}"),
            })?;
        }
        Ok(entity)
    }
}

impl<E> TableMetamodel for EntityMetamodel<E> {
    fn table(&self) -> &TableRef {
        &self.table
    }
    fn column_defs(&self) -> Vec<ColumnDef> {
        let composite = self.id.len() > 1;
        self.properties
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut column = v.column.clone();
                if self.is_id(i) {
                    column.primary_key = if composite {
                        PrimaryKeyType::PartOfPrimaryKey
                    } else {
                        PrimaryKeyType::PrimaryKey
                    };
                    column.identity = self.id_generator == IdGenerator::Identity && !composite;
                }
                column
            })
            .collect()
    }
    fn columns(&self) -> Vec<Arc<ColumnExpression>> {
        self.properties
            .iter()
            .map(|v| Arc::new(ColumnExpression::Property(self.column_ref(v.column.name.clone()))))
            .collect()
    }
    fn id_generator(&self) -> IdGenerator {
        self.id_generator
    }
}

impl<E> Clone for EntityMetamodel<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            properties: self.properties.clone(),
            id: self.id.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            id_generator: self.id_generator,
            factory: self.factory,
        }
    }
}

impl<E> PartialEq for EntityMetamodel<E> {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<E> Debug for EntityMetamodel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetamodel")
            .field("table", &self.table)
            .field("properties", &self.properties)
            .field("id_generator", &self.id_generator)
            .finish()
    }
}

pub struct EntityMetamodelBuilder<E> {
    table: TableRef,
    properties: Vec<Property<E>>,
    id: Vec<usize>,
    version: Option<usize>,
    created_at: Option<usize>,
    updated_at: Option<usize>,
    id_generator: IdGenerator,
    factory: fn() -> E,
}

impl<E> EntityMetamodelBuilder<E> {
    pub fn schema(mut self, schema: impl Into<Cow<'static, str>>) -> Self {
        self.table.schema = schema.into();
        self
    }
    /// Identifier property, call it more than once for a composite key.
    pub fn id(mut self, property: Property<E>) -> Self {
        self.id.push(self.properties.len());
        self.properties.push(property);
        self
    }
    pub fn property(mut self, property: Property<E>) -> Self {
        self.properties.push(property);
        self
    }
    /// Version property, incremented by every update and checked by the optimistic lock.
    pub fn version(mut self, property: Property<E>) -> Self {
        self.version = Some(self.properties.len());
        self.properties.push(property);
        self
    }
    /// Timestamp set when the entity is inserted.
    pub fn created_at(mut self, property: Property<E>) -> Self {
        self.created_at = Some(self.properties.len());
        self.properties.push(property);
        self
    }
    /// Timestamp set when the entity is inserted or updated.
    pub fn updated_at(mut self, property: Property<E>) -> Self {
        self.updated_at = Some(self.properties.len());
        self.properties.push(property);
        self
    }
    pub fn id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }
    pub fn build(self) -> EntityMetamodel<E> {
        EntityMetamodel {
            table: self.table,
            properties: self.properties.into(),
            id: self.id.into(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            id_generator: self.id_generator,
            factory: self.factory,
        }
    }
}
