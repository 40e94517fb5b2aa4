use crate::{
    ColumnExpression, Criterion, EntityMetamodel, SelectOptions, TableMetamodel, TableRef,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

/// A table joined to the select target.
#[derive(Debug, Clone)]
pub struct JoinDef {
    pub join_type: JoinType,
    pub target: Arc<dyn TableMetamodel>,
    pub on: Vec<Criterion>,
}

impl JoinDef {
    pub fn table(&self) -> &TableRef {
        self.target.table()
    }
}

/// The parts of a select that do not depend on the entity type.
#[derive(Default, Debug, Clone)]
pub struct SelectClauses {
    pub distinct: bool,
    pub joins: Vec<JoinDef>,
    pub filter: Vec<Criterion>,
    pub group_by: Vec<Arc<ColumnExpression>>,
    pub having: Vec<Criterion>,
    pub order_by: Vec<Arc<ColumnExpression>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub for_update: bool,
}

/// Immutable description of a select over `E`.
///
/// Without an explicit projection the columns are the ones of the target followed by the ones
/// of every included join.
#[derive(Debug)]
pub struct SelectContext<E> {
    pub target: EntityMetamodel<E>,
    pub clauses: SelectClauses,
    pub projection: Vec<Arc<ColumnExpression>>,
    pub includes: Vec<Arc<dyn TableMetamodel>>,
    pub options: SelectOptions,
}

impl<E> SelectContext<E> {
    pub fn new(target: EntityMetamodel<E>) -> Self {
        Self {
            target,
            clauses: Default::default(),
            projection: Vec::new(),
            includes: Vec::new(),
            options: Default::default(),
        }
    }

    /// Copy with the changes applied by `f` to its clauses.
    pub fn with_clauses(&self, f: impl FnOnce(&mut SelectClauses)) -> Self {
        let mut result = self.clone();
        f(&mut result.clauses);
        result
    }

    pub fn with_projection(&self, projection: Vec<Arc<ColumnExpression>>) -> Self {
        Self {
            projection,
            ..self.clone()
        }
    }

    pub fn with_includes(&self, includes: Vec<Arc<dyn TableMetamodel>>) -> Self {
        Self {
            includes,
            ..self.clone()
        }
    }

    pub fn with_options(&self, options: SelectOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// The columns the statement selects, in order.
    pub fn columns(&self) -> Vec<Arc<ColumnExpression>> {
        if !self.projection.is_empty() {
            return self.projection.clone();
        }
        let mut columns = self.target.columns();
        for include in &self.includes {
            columns.extend(include.columns());
        }
        columns
    }
}

impl<E> Clone for SelectContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            clauses: self.clauses.clone(),
            projection: self.projection.clone(),
            includes: self.includes.clone(),
            options: self.options,
        }
    }
}
