use crate::{Entity, EntityMetamodel, Result, SelectContext, TableRef, Value};
use indexmap::{IndexMap, IndexSet};
use std::{hash::Hash, ops::Range};

/// The flat result of a select with includes, entities are decoded on demand.
///
/// Every row holds the columns of the target followed by the columns of every included
/// metamodel, each metamodel owning a contiguous span. Results preserve row order.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct EntityStore {
    spans: IndexMap<TableRef, Range<usize>>,
    rows: Vec<Vec<Value>>,
}

impl EntityStore {
    pub fn new(spans: IndexMap<TableRef, Range<usize>>, rows: Vec<Vec<Value>>) -> Self {
        Self { spans, rows }
    }

    /// Store of the rows produced by `context`.
    pub fn from_context<E>(context: &SelectContext<E>, rows: Vec<Vec<Value>>) -> Self {
        let mut spans = IndexMap::new();
        let mut start = context.target.properties().len();
        spans.insert(context.target.table().clone(), 0..start);
        for include in &context.includes {
            let end = start + include.columns().len();
            spans
                .entry(include.table().clone())
                .or_insert(start..end);
            start = end;
        }
        Self { spans, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The metamodel took part in the select.
    pub fn contains<E>(&self, metamodel: &EntityMetamodel<E>) -> bool {
        self.spans.contains_key(metamodel.table())
    }

    /// The entity of `metamodel` in row `index`, `None` for the null side of an outer join.
    fn decode<E: Entity>(&self, metamodel: &EntityMetamodel<E>, index: usize) -> Result<Option<E>> {
        let Some(span) = self.spans.get(metamodel.table()) else {
            return Ok(None);
        };
        let Some(values) = self.rows[index].get(span.clone()) else {
            return Ok(None);
        };
        let absent = values
            .iter()
            .enumerate()
            .filter(|(i, _)| metamodel.is_id(*i))
            .all(|(_, v)| v.is_null());
        if absent {
            return Ok(None);
        }
        metamodel.decode(values.iter().cloned(), index).map(Some)
    }

    fn pairs<T: Entity, S: Entity>(
        &self,
        target: &EntityMetamodel<T>,
        source: &EntityMetamodel<S>,
    ) -> Result<IndexMap<T::Id, (T, IndexMap<S::Id, S>)>> {
        let mut result: IndexMap<T::Id, (T, IndexMap<S::Id, S>)> = IndexMap::new();
        if !self.contains(target) || !self.contains(source) {
            return Ok(result);
        }
        for index in 0..self.rows.len() {
            let Some(t) = self.decode(target, index)? else {
                continue;
            };
            let s = self.decode(source, index)?;
            let (_, related) = result
                .entry(t.id())
                .or_insert_with(|| (t, IndexMap::new()));
            if let Some(s) = s {
                related.entry(s.id()).or_insert(s);
            }
        }
        Ok(result)
    }

    /// Distinct entities of `metamodel`, in the order of their first row.
    pub fn list<E: Entity>(&self, metamodel: &EntityMetamodel<E>) -> Result<Vec<E>> {
        let mut result = IndexMap::new();
        for index in 0..self.rows.len() {
            if let Some(entity) = self.decode(metamodel, index)? {
                result.entry(entity.id()).or_insert(entity);
            }
        }
        Ok(result.into_values().collect())
    }

    /// Every `T` with the `S` entities found on its rows, possibly none.
    ///
    /// Empty when either metamodel did not take part in the select.
    pub fn one_to_many<T, S>(
        &self,
        target: &EntityMetamodel<T>,
        source: &EntityMetamodel<S>,
    ) -> Result<IndexMap<T, IndexSet<S>>>
    where
        T: Entity + Eq + Hash,
        S: Entity + Eq + Hash,
    {
        Ok(self
            .pairs(target, source)?
            .into_values()
            .map(|(t, related)| (t, related.into_values().collect()))
            .collect())
    }

    /// Every `T` with the first `S` found on its rows.
    pub fn one_to_one<T, S>(
        &self,
        target: &EntityMetamodel<T>,
        source: &EntityMetamodel<S>,
    ) -> Result<IndexMap<T, Option<S>>>
    where
        T: Entity + Eq + Hash,
        S: Entity,
    {
        Ok(self
            .pairs(target, source)?
            .into_values()
            .map(|(t, related)| (t, related.into_values().next()))
            .collect())
    }

    /// Like [`EntityStore::one_to_many`], keyed by the id of `T`.
    pub fn one_to_many_by_id<T, S>(
        &self,
        target: &EntityMetamodel<T>,
        source: &EntityMetamodel<S>,
    ) -> Result<IndexMap<T::Id, IndexSet<S>>>
    where
        T: Entity,
        S: Entity + Eq + Hash,
    {
        Ok(self
            .pairs(target, source)?
            .into_iter()
            .map(|(id, (_, related))| (id, related.into_values().collect()))
            .collect())
    }

    /// Like [`EntityStore::one_to_one`], keyed by the id of `T`.
    pub fn one_to_one_by_id<T, S>(
        &self,
        target: &EntityMetamodel<T>,
        source: &EntityMetamodel<S>,
    ) -> Result<IndexMap<T::Id, Option<S>>>
    where
        T: Entity,
        S: Entity,
    {
        Ok(self
            .pairs(target, source)?
            .into_iter()
            .map(|(id, (_, related))| (id, related.into_values().next()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;

    #[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
    struct Department {
        id: i32,
        name: String,
    }
    impl Entity for Department {
        type Id = i32;
        fn id(&self) -> i32 {
            self.id
        }
    }

    #[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
    struct Employee {
        id: i32,
        department_id: i32,
    }
    impl Entity for Employee {
        type Id = i32;
        fn id(&self) -> i32 {
            self.id
        }
    }

    fn department() -> EntityMetamodel<Department> {
        EntityMetamodel::builder("DEPARTMENT", Department::default)
            .id(Property::new("ID", |v: &Department| &v.id, |v| &mut v.id))
            .property(Property::new("NAME", |v: &Department| &v.name, |v| &mut v.name))
            .build()
    }

    fn employee() -> EntityMetamodel<Employee> {
        EntityMetamodel::builder("EMPLOYEE", Employee::default)
            .id(Property::new("ID", |v: &Employee| &v.id, |v| &mut v.id))
            .property(Property::new(
                "DEPARTMENT_ID",
                |v: &Employee| &v.department_id,
                |v| &mut v.department_id,
            ))
            .build()
    }

    fn row(d: i32, name: &str, e: Option<(i32, i32)>) -> Vec<Value> {
        vec![
            Value::Int32(Some(d)),
            Value::Varchar(Some(name.into())),
            Value::Int32(e.map(|v| v.0)),
            Value::Int32(e.map(|v| v.1)),
        ]
    }

    #[test]
    fn departments_without_employees_map_to_empty_sets() {
        let (d, e) = (department(), employee());
        let mut spans = IndexMap::new();
        spans.insert(d.table().clone(), 0..2);
        spans.insert(e.table().clone(), 2..4);
        let store = EntityStore::new(
            spans,
            vec![
                row(1, "ACCOUNTING", Some((10, 1))),
                row(1, "ACCOUNTING", Some((11, 1))),
                row(2, "RESEARCH", None),
                row(1, "ACCOUNTING", Some((10, 1))),
            ],
        );
        let map = store.one_to_many(&d, &e).unwrap();
        assert_eq!(map.len(), 2);
        let (first, employees) = map.get_index(0).unwrap();
        assert_eq!(first.name, "ACCOUNTING");
        assert_eq!(
            employees.iter().map(|v| v.id).collect::<Vec<_>>(),
            [10, 11]
        );
        let (second, employees) = map.get_index(1).unwrap();
        assert_eq!(second.id, 2);
        assert!(employees.is_empty());

        let by_id = store.one_to_one_by_id(&d, &e).unwrap();
        assert_eq!(by_id[&1].as_ref().map(|v| v.id), Some(10));
        assert_eq!(by_id[&2], None);

        assert_eq!(store.list(&e).unwrap().len(), 2);
        assert_eq!(store.list(&d).unwrap().len(), 2);
    }

    #[test]
    fn relations_need_both_metamodels() {
        let (d, e) = (department(), employee());
        let mut spans = IndexMap::new();
        spans.insert(d.table().clone(), 0..2);
        let store = EntityStore::new(
            spans,
            vec![vec![
                Value::Int32(Some(1)),
                Value::Varchar(Some("ACCOUNTING".into())),
            ]],
        );
        assert!(store.contains(&d));
        assert!(!store.contains(&e));
        assert!(store.one_to_many(&d, &e).unwrap().is_empty());
        assert!(store.one_to_one_by_id(&d, &e).unwrap().is_empty());
        assert!(store.one_to_many(&e, &d).unwrap().is_empty());
        assert_eq!(store.list(&d).unwrap().len(), 1);
        assert!(store.list(&e).unwrap().is_empty());
    }
}
