use crate::{
    Assignment, ColumnExpression, Criterion, DeleteOptions, EntityMetamodel, InsertOptions,
    UpdateOptions,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKeyAction {
    Update,
    Ignore,
}

/// Conflict handling of an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct OnDuplicateKey {
    pub action: DuplicateKeyAction,
    /// Conflict target, the identifier when empty.
    pub keys: Vec<Arc<ColumnExpression>>,
    /// Assignments on conflict, every non key column takes the proposed value when empty.
    pub assignments: Vec<Assignment>,
}

#[derive(Debug)]
pub struct EntityInsertContext<E> {
    pub target: EntityMetamodel<E>,
    pub on_duplicate_key: Option<OnDuplicateKey>,
    pub options: InsertOptions,
}

impl<E> EntityInsertContext<E> {
    pub fn new(target: EntityMetamodel<E>) -> Self {
        Self {
            target,
            on_duplicate_key: None,
            options: Default::default(),
        }
    }
    pub fn with_on_duplicate_key(&self, on_duplicate_key: OnDuplicateKey) -> Self {
        Self {
            on_duplicate_key: Some(on_duplicate_key),
            ..self.clone()
        }
    }
    pub fn with_options(&self, options: InsertOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl<E> Clone for EntityInsertContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            on_duplicate_key: self.on_duplicate_key.clone(),
            options: self.options,
        }
    }
}

#[derive(Debug)]
pub struct EntityUpdateContext<E> {
    pub target: EntityMetamodel<E>,
    /// Criteria added to the identifier and version ones.
    pub filter: Vec<Criterion>,
    pub options: UpdateOptions,
}

impl<E> EntityUpdateContext<E> {
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
    pub fn with_options(&self, options: UpdateOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl<E> Clone for EntityUpdateContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            filter: self.filter.clone(),
            options: self.options,
        }
    }
}

#[derive(Debug)]
pub struct EntityDeleteContext<E> {
    pub target: EntityMetamodel<E>,
    pub options: DeleteOptions,
}

impl<E> EntityDeleteContext<E> {
    pub fn new(target: EntityMetamodel<E>) -> Self {
        Self {
            target,
            options: Default::default(),
        }
    }
    pub fn with_options(&self, options: DeleteOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl<E> Clone for EntityDeleteContext<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            options: self.options,
        }
    }
}
