use core::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::{span::Span, value::Value};


/// A reference to a name, resolved against the context when evaluated
#[derive(Debug, Clone)]
pub struct Var {
    pub name: String,
    pub span: Span,
}

impl Var {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Span::empty())
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditiveOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

impl ComparisonOp {
    pub fn apply(self, lhs: &Value, rhs: &Value) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Neq => lhs != rhs,
        }
    }
}

// Value-producing nodes. Boolean-producing nodes live in [Condition] so a
// boolean can never end up where a Value is expected.
#[derive(Debug, Clone)]
pub enum Expr {
    Value(Value),
    Var(Var),
    Additive(AdditiveExpr),
    Let(LetExpr),
    Lambda(LambdaExpr),
    Call(FunctionCall),
    If(IfExpr),
}

#[derive(Debug, Clone)]
pub struct AdditiveExpr {
    pub lhs: Box<Expr>,
    pub op: AdditiveOp,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ComparisonExpr {
    pub lhs: Box<Expr>,
    pub op: ComparisonOp,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConditionExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Condition {
    Truthiness(ConditionExpr),
    Comparison(ComparisonExpr),
}

#[derive(Debug, Clone)]
pub struct IfExpr {
    pub condition: Condition,
    pub true_branch: Box<Expr>,
    pub false_branch: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LetExpr {
    pub name: Var,
    pub value: Box<Expr>,
    pub body: Box<Expr>,
    pub span: Span,
}

/// A function definition scoped to a single expression.
///
/// The definition is registered in the current frame for the duration of
/// `usage` and removed afterwards.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub function: Rc<Function>,
    pub usage: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub name: Var,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

/// A named function with fixed arity. `(name, params.len())` is its identity
/// within a frame.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Var,
    pub params: Vec<Var>,
    pub body: Expr,
    pub is_lambda: bool,
    pub span: Span,
}

impl Function {
    pub fn new(name: &str, params: &[&str], body: Expr) -> Self {
        Self {
            name: Var::named(name),
            params: params.iter().map(|param| Var::named(*param)).collect(),
            body,
            is_lambda: false,
            span: Span::empty(),
        }
    }

    pub fn lambda(name: &str, params: &[&str], body: Expr) -> Self {
        Self { is_lambda: true, ..Self::new(name, params, body) }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.params.len() {
            0 => write!(f, "{} ()", self.name),
            _ => write!(f, "{} {}", self.name, self.params.iter().join(" ")),
        }
    }
}

// Builders for hosts that construct trees without source text. Every node
// gets the empty span.
impl Expr {
    pub fn number(number: f64) -> Self {
        Self::Value(Value::from(number))
    }

    pub fn var(name: &str) -> Self {
        Self::Var(Var::named(name))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::additive(lhs, AdditiveOp::Add, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::additive(lhs, AdditiveOp::Sub, rhs)
    }

    pub fn additive(lhs: Expr, op: AdditiveOp, rhs: Expr) -> Self {
        Self::Additive(AdditiveExpr { lhs: Box::new(lhs), op, rhs: Box::new(rhs), span: Span::empty() })
    }

    pub fn call(name: &str, arguments: Vec<Expr>) -> Self {
        Self::Call(FunctionCall { name: Var::named(name), arguments, span: Span::empty() })
    }

    pub fn let_in(name: &str, value: Expr, body: Expr) -> Self {
        Self::Let(LetExpr {
            name: Var::named(name),
            value: Box::new(value),
            body: Box::new(body),
            span: Span::empty(),
        })
    }

    pub fn lambda(name: &str, params: &[&str], value: Expr, usage: Expr) -> Self {
        Self::Lambda(LambdaExpr {
            function: Rc::new(Function::lambda(name, params, value)),
            usage: Box::new(usage),
            span: Span::empty(),
        })
    }

    pub fn if_then_else(condition: Condition, true_branch: Expr, false_branch: Expr) -> Self {
        Self::If(IfExpr {
            condition,
            true_branch: Box::new(true_branch),
            false_branch: Box::new(false_branch),
            span: Span::empty(),
        })
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Value(value) => value.span(),
            Self::Var(var) => &var.span,
            Self::Additive(additive) => &additive.span,
            Self::Let(let_expr) => &let_expr.span,
            Self::Lambda(lambda) => &lambda.span,
            Self::Call(call) => &call.span,
            Self::If(if_expr) => &if_expr.span,
        }
    }
}

impl Condition {
    pub fn truthy(expr: Expr) -> Self {
        Self::Truthiness(ConditionExpr { expr: Box::new(expr), span: Span::empty() })
    }

    pub fn compare(lhs: Expr, op: ComparisonOp, rhs: Expr) -> Self {
        Self::Comparison(ComparisonExpr { lhs: Box::new(lhs), op, rhs: Box::new(rhs), span: Span::empty() })
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Truthiness(condition) => &condition.span,
            Self::Comparison(comparison) => &comparison.span,
        }
    }
}

// Nodes render as the source text they were parsed from
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.span())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.span())
    }
}

#[cfg(test)]
mod tests {
    use crate::{parser::parse, program::Declaration};

    use super::*;

    #[test]
    fn function_signature_display() {
        let sum = Function::new("sum", &["a", "b"], Expr::add(Expr::var("a"), Expr::var("b")));
        let unit = Function::new("three", &[], Expr::number(3.0));

        assert_eq!(sum.to_string(), "sum a b");
        assert_eq!(unit.to_string(), "three ()");
        assert_eq!((sum.arity(), unit.arity()), (2, 0));
    }

    #[test]
    fn lambda_builder_marks_function() {
        let Expr::Lambda(lambda) = Expr::lambda("id", &["x"], Expr::var("x"), Expr::call("id", vec![Expr::number(1.0)])) else {
            panic!("expected a lambda")
        };
        assert!(lambda.function.is_lambda);
        assert_eq!(lambda.function.arity(), 1);
    }

    #[test]
    fn nodes_display_their_source() -> anyhow::Result<()> {
        let declarations = parse("if 1 + 2 > x then 1 else 0")?;
        let [Declaration::Expression(expr)] = declarations.as_slice() else {
            panic!("expected one expression")
        };
        let Expr::If(if_expr) = expr else {
            panic!("expected an if expression")
        };

        assert_eq!(expr.to_string(), "if 1 + 2 > x then 1 else 0");
        assert_eq!(if_expr.condition.to_string(), "1 + 2 > x");
        assert_eq!(Expr::number(1.0).to_string(), "");
        Ok(())
    }
}
