use crate::ExecutionOptions;

/// How result columns are matched to the projection.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    /// By position.
    #[default]
    Index,
    /// By label, falling back to the position when the label is unknown.
    Name,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct SelectOptions {
    pub execution: ExecutionOptions,
    pub projection_type: ProjectionType,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct InsertOptions {
    pub execution: ExecutionOptions,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct UpdateOptions {
    pub execution: ExecutionOptions,
    /// Permits relation updates without criteria.
    pub allow_empty_where: bool,
    /// Neither checks nor increments the version.
    pub ignore_version: bool,
    /// A versioned update touching no row is not an error.
    pub suppress_optimistic_lock_exception: bool,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct DeleteOptions {
    pub execution: ExecutionOptions,
    /// Permits relation deletes without criteria.
    pub allow_empty_where: bool,
    pub ignore_version: bool,
    pub suppress_optimistic_lock_exception: bool,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct SchemaOptions {
    pub execution: ExecutionOptions,
}
