mod binary_op;
mod column_expression;
mod criterion;
mod expression;
mod op_precedence;
mod property;

pub use binary_op::*;
pub use column_expression::*;
pub use criterion::*;
pub use expression::*;
pub use op_precedence::*;
pub use property::*;
