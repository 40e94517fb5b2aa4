mod connection;
mod dialect;
mod extract;
mod sql_writer;

pub use connection::*;
pub use dialect::*;
pub use sql_writer::*;
