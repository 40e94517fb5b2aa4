mod context;
mod sql_writer;
mod statement;

pub use context::*;
pub use sql_writer::*;
pub use statement::*;
