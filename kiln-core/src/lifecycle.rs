use crate::{
    DeleteOptions, EntityMetamodel, Error, QueryError, Result, UpdateOptions, Value,
};
use time::OffsetDateTime;

/// How the affected count of a versioned update or delete is checked.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCheck {
    pub ignore_version: bool,
    pub suppress_optimistic_lock_exception: bool,
}

impl From<&UpdateOptions> for VersionCheck {
    fn from(value: &UpdateOptions) -> Self {
        Self {
            ignore_version: value.ignore_version,
            suppress_optimistic_lock_exception: value.suppress_optimistic_lock_exception,
        }
    }
}

impl From<&DeleteOptions> for VersionCheck {
    fn from(value: &DeleteOptions) -> Self {
        Self {
            ignore_version: value.ignore_version,
            suppress_optimistic_lock_exception: value.suppress_optimistic_lock_exception,
        }
    }
}

/// Hooks around the execution of entity statements: timestamps, identifiers and versions.
///
/// Every hook works on values, the entity given by the caller is never modified. The same
/// hooks serve the single, multiple and batch paths of both transports. Callers read the clock
/// once per query and pass that instant to every `pre_*` call of the query.
pub struct EntityLifecycle<'a, E> {
    metamodel: &'a EntityMetamodel<E>,
}

impl<'a, E: Clone> EntityLifecycle<'a, E> {
    pub fn new(metamodel: &'a EntityMetamodel<E>) -> Self {
        Self { metamodel }
    }

    /// Copy having created-at and updated-at set to `now`.
    pub fn pre_insert(&self, entity: &E, now: OffsetDateTime) -> Result<E> {
        let mut result = entity.clone();
        let now = Value::TimestampWithTimezone(Some(now));
        if let Some(property) = self.metamodel.created_at_property() {
            property.set(&mut result, now.clone())?;
        }
        if let Some(property) = self.metamodel.updated_at_property() {
            property.set(&mut result, now)?;
        }
        Ok(result)
    }

    /// Writes the generated key, if any, into the identity property.
    pub fn post_insert(&self, entity: E, generated_key: Option<i64>) -> Result<E> {
        let (Some(property), Some(key)) = (self.metamodel.identity_property(), generated_key)
        else {
            return Ok(entity);
        };
        let mut result = entity;
        property.set(&mut result, Value::Int64(Some(key)))?;
        Ok(result)
    }

    /// Assigns the generated keys to the entities in order, the entities past the last key keep
    /// their identifier.
    pub fn post_insert_all(&self, entities: Vec<E>, generated_keys: &[i64]) -> Result<Vec<E>> {
        if self.metamodel.identity_property().is_none() {
            return Ok(entities);
        }
        entities
            .into_iter()
            .enumerate()
            .map(|(i, entity)| self.post_insert(entity, generated_keys.get(i).copied()))
            .collect()
    }

    /// Copy having updated-at set to `now`.
    pub fn pre_update(&self, entity: &E, now: OffsetDateTime) -> Result<E> {
        let mut result = entity.clone();
        if let Some(property) = self.metamodel.updated_at_property() {
            property.set(&mut result, Value::TimestampWithTimezone(Some(now)))?;
        }
        Ok(result)
    }

    /// The value updated-at takes in a set based update, if the entity has one.
    pub fn updated_at_value(&self, now: OffsetDateTime) -> Option<Value> {
        self.metamodel
            .updated_at_property()
            .map(|_| Value::TimestampWithTimezone(Some(now)))
    }

    fn check_count(&self, count: u64, index: usize, check: VersionCheck) -> Result<()> {
        if self.metamodel.version_property().is_some()
            && !check.ignore_version
            && !check.suppress_optimistic_lock_exception
            && count != 1
        {
            log::warn!(
                "Optimistic lock conflict on `{}` at index {index}, {count} rows affected",
                self.metamodel.name()
            );
            return Err(QueryError::OptimisticLock {
                entity: self.metamodel.table().full_name(),
                index,
                count,
            }
            .into());
        }
        Ok(())
    }

    /// Checks the optimistic lock and increments the version of the updated entity.
    pub fn post_update(&self, entity: E, count: u64, index: usize, check: VersionCheck) -> Result<E> {
        self.check_count(count, index, check)?;
        let Some(property) = self
            .metamodel
            .version_property()
            .filter(|_| !check.ignore_version)
        else {
            return Ok(entity);
        };
        let mut result = entity;
        let next = match property.get(&result) {
            Value::Int16(Some(v)) => Value::Int16(Some(v + 1)),
            Value::Int32(Some(v)) => Value::Int32(Some(v + 1)),
            Value::Int64(Some(v)) => Value::Int64(Some(v + 1)),
            v if v.is_null() => return Ok(result),
            v => {
                return Err(Error::msg(format!(
                    "The version `{}` of `{}` is not an integer: {v:?}",
                    property.name(),
                    self.metamodel.name()
                )));
            }
        };
        property.set(&mut result, next)?;
        Ok(result)
    }

    /// Checks the optimistic lock of a deleted entity.
    pub fn post_delete(&self, count: u64, index: usize, check: VersionCheck) -> Result<()> {
        self.check_count(count, index, check)
    }
}

/// Pairs every item of a batch with the count its statement reported and applies `f`.
///
/// A missing count is a build error naming the index, extra counts are ignored.
pub fn reconcile<T, R>(
    items: Vec<T>,
    counts: &[u64],
    mut f: impl FnMut(T, u64, usize) -> Result<R>,
) -> Result<Vec<R>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let count = counts
                .get(i)
                .copied()
                .ok_or_else(|| QueryError::Build(format!("count not found, index={i}")))?;
            f(item, count, i)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityMetamodel, Property};
    use time::macros::datetime;

    #[derive(Default, Debug, Clone, PartialEq)]
    struct Item {
        id: i32,
        name: String,
        version: i32,
        updated_at: Option<OffsetDateTime>,
    }

    fn item() -> EntityMetamodel<Item> {
        EntityMetamodel::builder("ITEM", Item::default)
            .id(Property::new("ID", |v: &Item| &v.id, |v| &mut v.id))
            .property(Property::new("NAME", |v: &Item| &v.name, |v| &mut v.name))
            .version(Property::new("VERSION", |v: &Item| &v.version, |v| &mut v.version))
            .updated_at(Property::new(
                "UPDATED_AT",
                |v: &Item| &v.updated_at,
                |v| &mut v.updated_at,
            ))
            .id_generator(crate::IdGenerator::Identity)
            .build()
    }

    #[test]
    fn pre_update_leaves_the_original_untouched() {
        let meta = item();
        let lifecycle = EntityLifecycle::new(&meta);
        let original = Item::default();
        let now = datetime!(2024-01-02 03:04:05 UTC);
        let updated = lifecycle.pre_update(&original, now).unwrap();
        assert_eq!(original.updated_at, None);
        assert_eq!(updated.updated_at, Some(now));
    }

    #[test]
    fn version_increments_only_on_success() {
        let meta = item();
        let lifecycle = EntityLifecycle::new(&meta);
        let entity = Item {
            id: 1,
            version: 3,
            ..Default::default()
        };
        let updated = lifecycle
            .post_update(entity.clone(), 1, 0, VersionCheck::default())
            .unwrap();
        assert_eq!(updated.version, 4);

        let error = lifecycle
            .post_update(entity.clone(), 0, 2, VersionCheck::default())
            .unwrap_err();
        assert_eq!(
            QueryError::find(&error),
            Some(&QueryError::OptimisticLock {
                entity: "ITEM".into(),
                index: 2,
                count: 0,
            })
        );

        let suppressed = lifecycle
            .post_update(
                entity,
                0,
                0,
                VersionCheck {
                    suppress_optimistic_lock_exception: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(suppressed.version, 4);
    }

    #[test]
    fn generated_keys_follow_the_input_order() {
        let meta = item();
        let lifecycle = EntityLifecycle::new(&meta);
        let entities = vec![Item::default(), Item::default(), Item::default()];
        let result = lifecycle.post_insert_all(entities, &[7, 8, 9]).unwrap();
        assert_eq!(result.iter().map(|v| v.id).collect::<Vec<_>>(), [7, 8, 9]);

        let entities = vec![Item::default(), Item { id: 3, ..Default::default() }];
        let result = lifecycle.post_insert_all(entities, &[7]).unwrap();
        assert_eq!(result.iter().map(|v| v.id).collect::<Vec<_>>(), [7, 3]);
    }

    #[test]
    fn missing_count_names_the_index() {
        let error = reconcile(vec!['a', 'b', 'c'], &[1, 1], |v, _, _| Ok(v)).unwrap_err();
        assert!(QueryError::is_build(&error));
        assert_eq!(error.to_string(), "count not found, index=2");
    }
}
