//! Composable, type-checked relational queries.
//!
//! Queries are plain values built from [`EntityDsl`], [`SqlDsl`] and [`SchemaDsl`], they are
//! compiled for a [`Dialect`] and run on a [`Transport`] or a [`StreamTransport`] only when
//! asked to.
pub use kiln_core::*;
