mod entity;
mod options;
mod relation;
mod scope;
mod select;

pub use entity::*;
pub use options::*;
pub use relation::*;
pub use scope::*;
pub use select::*;
