use crate::{
    Assignment, Criterion, DeleteOptions, EntityMetamodel, InsertOptions, TableMetamodel,
    UpdateOptions,
};
use std::sync::Arc;

/// Set based update, not tied to any entity instance.
#[derive(Debug)]
pub struct RelationUpdateContext<E> {
    pub target: EntityMetamodel<E>,
    pub assignments: Vec<Assignment>,
    pub filter: Vec<Criterion>,
    pub options: UpdateOptions,
}

impl<E> RelationUpdateContext<E> {
    pub fn new(target: EntityMetamodel<E>) -> Self {
        Self {
            target,
            assignments: Vec::new(),
            filter: Vec::new(),
            options: Default::default(),
        }
    }
    pub fn with_assignments(&self, assignments: Vec<Assignment>) -> Self {
        let mut result = self.clone();
        result.assignments.extend(assignments);
        result
    }
    pub fn with_filter(&self, criteria: Vec<Criterion>) -> Self {
        let mut result = self.clone();
        result.filter.extend(criteria);
        result
    }
    pub fn with_options(&self, options: UpdateOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl<E> Clone for RelationUpdateContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            assignments: self.assignments.clone(),
            filter: self.filter.clone(),
            options: self.options,
        }
    }
}

/// Set based delete.
#[derive(Debug)]
pub struct RelationDeleteContext<E> {
    pub target: EntityMetamodel<E>,
    pub filter: Vec<Criterion>,
    pub options: DeleteOptions,
}

impl<E> RelationDeleteContext<E> {
    pub fn new(target: EntityMetamodel<E>) -> Self {
        Self {
            target,
            filter: Vec::new(),
            options: Default::default(),
        }
    }
    pub fn with_filter(&self, criteria: Vec<Criterion>) -> Self {
        let mut result = self.clone();
        result.filter.extend(criteria);
        result
    }
    pub fn with_options(&self, options: DeleteOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl<E> Clone for RelationDeleteContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            filter: self.filter.clone(),
            options: self.options,
        }
    }
}

/// Insert of explicitly assigned columns.
#[derive(Debug)]
pub struct RelationInsertContext<E> {
    pub target: EntityMetamodel<E>,
    pub assignments: Vec<Assignment>,
    pub options: InsertOptions,
}

impl<E> RelationInsertContext<E> {
    pub fn new(target: EntityMetamodel<E>) -> Self {
        Self {
            target,
            assignments: Vec::new(),
            options: Default::default(),
        }
    }
    pub fn with_assignments(&self, assignments: Vec<Assignment>) -> Self {
        let mut result = self.clone();
        result.assignments.extend(assignments);
        result
    }
    pub fn with_options(&self, options: InsertOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl<E> Clone for RelationInsertContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            assignments: self.assignments.clone(),
            options: self.options,
        }
    }
}

/// Tables to create or drop, in order.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    pub metamodels: Vec<Arc<dyn TableMetamodel>>,
    pub options: crate::SchemaOptions,
}

impl SchemaContext {
    pub fn new(metamodels: Vec<Arc<dyn TableMetamodel>>) -> Self {
        Self {
            metamodels,
            options: Default::default(),
        }
    }
    pub fn with_options(&self, options: crate::SchemaOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}
