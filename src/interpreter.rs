use tracing::debug;

use crate::{
    ast::{AdditiveExpr, AdditiveOp, ComparisonExpr, Condition, ConditionExpr, Expr, Function, FunctionCall, IfExpr, LambdaExpr, LetExpr},
    context::Context,
    error::{BoiError, ErrorKind, EvalResult},
    span::Span,
    value::Value,
};


/// A function paired with the arguments of one call.
///
/// This is the call-local replacement for storing pending arguments on the
/// function itself: an `ArmedCall` exists only between argument evaluation
/// and the call, so recursive calls through the same [Function] each carry
/// their own arguments.
#[derive(Debug)]
pub struct ArmedCall<'f> {
    function: &'f Function,
    arguments: Vec<Value>,
    call_span: Span,
}

impl Function {
    pub fn arm(&self, arguments: Vec<Value>, call_span: &Span) -> EvalResult<ArmedCall<'_>> {
        if arguments.len() != self.arity() {
            return Err(BoiError::new(
                ErrorKind::ArityMismatch,
                format!(
                    "calling function '{}' with {} arguments, but it takes {}",
                    self.name, arguments.len(), self.arity()
                ),
                call_span.clone(),
            ));
        }

        Ok(ArmedCall { function: self, arguments, call_span: call_span.clone() })
    }
}

impl<'f> ArmedCall<'f> {
    /// Ordinary functions run in a new frame. Lambdas bind their parameters
    /// straight into the caller's frame. Both count as one level of call
    /// depth.
    pub fn evaluate(self, context: &mut Context) -> EvalResult<Value> {
        let Self { function, arguments, call_span } = self;
        debug!(function = %function, depth = context.call_depth(), "calling function");

        let run_body = |context: &mut Context| {
            context.with_arguments(&function.params, arguments, |context| evaluate(&function.body, context))
        };

        context.with_call(&call_span, |context| {
            if function.is_lambda {
                run_body(context)
            } else {
                context.with_frame(&call_span, run_body)
            }
        })
    }
}

fn evaluate_additive(additive: &AdditiveExpr, context: &mut Context) -> EvalResult<Value> {
    let lhs = evaluate(&additive.lhs, context)?;
    let rhs = evaluate(&additive.rhs, context)?;

    let number = match additive.op {
        AdditiveOp::Add => &lhs + &rhs,
        AdditiveOp::Sub => &lhs - &rhs,
    };
    Ok(Value::new(number, additive.span.clone()))
}

fn evaluate_comparison(comparison: &ComparisonExpr, context: &mut Context) -> EvalResult<bool> {
    let lhs = evaluate(&comparison.lhs, context)?;
    let rhs = evaluate(&comparison.rhs, context)?;
    Ok(comparison.op.apply(&lhs, &rhs))
}

fn evaluate_truthiness(condition: &ConditionExpr, context: &mut Context) -> EvalResult<bool> {
    evaluate(&condition.expr, context).map(|value| value.is_truthy())
}

fn evaluate_if(if_expr: &IfExpr, context: &mut Context) -> EvalResult<Value> {
    if evaluate_condition(&if_expr.condition, context)? {
        evaluate(&if_expr.true_branch, context)
    } else {
        evaluate(&if_expr.false_branch, context)
    }
}

fn evaluate_let(let_expr: &LetExpr, context: &mut Context) -> EvalResult<Value> {
    let value = evaluate(&let_expr.value, context)?;
    context.with_variable(&let_expr.name, value, |context| evaluate(&let_expr.body, context))
}

fn evaluate_lambda(lambda: &LambdaExpr, context: &mut Context) -> EvalResult<Value> {
    context.with_function(&lambda.function, |context| evaluate(&lambda.usage, context))
}

fn evaluate_call(call: &FunctionCall, context: &mut Context) -> EvalResult<Value> {
    // Resolve before evaluating arguments so an unknown function is reported
    // without side effects from its arguments
    let function = context.lookup_function(&call.name, call.arguments.len())?;

    let arguments = call.arguments.iter()
        .map(|argument| evaluate(argument, context))
        .collect::<EvalResult<Vec<Value>>>()?;

    function.arm(arguments, &call.span)?.evaluate(context)
}

pub fn evaluate_condition(condition: &Condition, context: &mut Context) -> EvalResult<bool> {
    match condition {
        Condition::Truthiness(condition) => evaluate_truthiness(condition, context),
        Condition::Comparison(comparison) => evaluate_comparison(comparison, context),
    }
}

pub fn evaluate(expr: &Expr, context: &mut Context) -> EvalResult<Value> {
    match expr {
        Expr::Value(value) => Ok(value.clone()),
        Expr::Var(var) => context.lookup_variable(var),
        Expr::Additive(additive) => evaluate_additive(additive, context),
        Expr::Let(let_expr) => evaluate_let(let_expr, context),
        Expr::Lambda(lambda) => evaluate_lambda(lambda, context),
        Expr::Call(call) => evaluate_call(call, context),
        Expr::If(if_expr) => evaluate_if(if_expr, context),
    }
}

impl Expr {
    pub fn evaluate(&self, context: &mut Context) -> EvalResult<Value> {
        evaluate(self, context)
    }
}

impl Condition {
    pub fn evaluate(&self, context: &mut Context) -> EvalResult<bool> {
        evaluate_condition(self, context)
    }
}
