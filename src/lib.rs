
mod ast;
mod config;
mod context;
mod error;
mod interpreter;
mod parser;
mod program;
mod span;
mod value;

#[cfg(test)]
mod test_utils;

pub use ast::{AdditiveExpr, AdditiveOp, ComparisonExpr, ComparisonOp, Condition, ConditionExpr, Expr, Function, FunctionCall, IfExpr, LambdaExpr, LetExpr, Var};
pub use config::Config;
pub use context::Context;
pub use error::{BoiError, ErrorKind, EvalResult};
pub use interpreter::{evaluate, evaluate_condition, ArmedCall};
pub use parser::parse;
pub use program::{Declaration, Program};
pub use span::Span;
pub use value::Value;
