//! Filter and expression evaluation.

/// Expression AST model and interpreter
pub mod expr;
/// Filter dispatch and comparison semantics
pub mod filter;

pub use expr::{AttributeField, ExprNode, eval_expr};
pub use filter::{FilterContext, evaluate_filter};
