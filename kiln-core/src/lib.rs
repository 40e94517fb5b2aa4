mod as_value;
mod builder;
mod column;
mod config;
mod context;
mod dialect;
mod error;
mod expression;
mod lifecycle;
mod mapping;
mod metamodel;
mod query;
mod runner;
mod store;
mod table_ref;
mod transport;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use builder::*;
pub use column::*;
pub use config::*;
pub use context::*;
pub use dialect::*;
pub use error::*;
pub use expression::*;
pub use lifecycle::*;
pub use mapping::*;
pub use metamodel::*;
pub use query::*;
pub use runner::*;
pub use store::*;
pub use table_ref::*;
pub use transport::*;
pub use util::*;
pub use value::*;
pub use writer::{GenericSqlWriter, SqlWriter, Statement, UpsertClause};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
pub use ::indexmap;
