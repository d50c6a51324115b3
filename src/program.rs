use std::rc::Rc;

use tracing::debug;

use crate::{ast::{Expr, Function}, config::Config, context::Context, error::{BoiError, EvalResult}, interpreter::evaluate, parser::parse, value::Value};


#[derive(Debug, Clone)]
pub enum Declaration {
    Function(Rc<Function>),
    Expression(Expr),
}

/// An ordered list of top-level declarations sharing one [Context].
///
/// Each declaration is processed exactly once, in order. Functions are
/// registered into the current frame and expressions are evaluated.
#[derive(Debug)]
pub struct Program {
    declarations: Vec<Declaration>,
    processed: usize,
    context: Context,
}

impl Program {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self::with_config(declarations, Config::default())
    }

    pub fn with_config(declarations: Vec<Declaration>, config: Config) -> Self {
        Self { declarations, processed: 0, context: Context::with_config(config) }
    }

    pub fn parse(source: &str) -> EvalResult<Self> {
        Ok(Self::new(parse(source)?))
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn pending(&self) -> usize {
        self.declarations.len() - self.processed
    }

    pub fn extend(&mut self, declarations: impl IntoIterator<Item = Declaration>) {
        self.declarations.extend(declarations)
    }

    /// Processes the next pending declaration. Yields the value of an
    /// expression, or `None` for a registered function. A declaration that
    /// fails is still consumed.
    pub fn step(&mut self) -> Option<EvalResult<Option<Value>>> {
        let declaration = self.declarations.get(self.processed)?;
        self.processed += 1;

        Some(match declaration {
            Declaration::Function(function) if function.is_lambda => Err(BoiError::malformed(
                format!("lambda '{}' cannot be declared at the top level", function.name),
                function.span.clone(),
            )),
            Declaration::Function(function) => {
                self.context.bind_function(Rc::clone(function)).map(|_| None)
            }
            Declaration::Expression(expr) => evaluate(expr, &mut self.context).map(Some),
        })
    }

    /// Processes every pending declaration, discarding expression values and
    /// stopping at the first error.
    pub fn run(&mut self) -> EvalResult<()> {
        debug!(pending = self.pending(), "running program");
        while let Some(result) = self.step() {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use itertools::Itertools;

    use crate::{ast::ComparisonOp, ast::Condition, error::ErrorKind, test_utils::{all_testcases, load_test_pair, EvaluationResult, TestOutput}};

    use super::*;

    fn sum() -> Declaration {
        Declaration::Function(Rc::new(Function::new("sum", &["a", "b"], Expr::add(Expr::var("a"), Expr::var("b")))))
    }

    #[test]
    fn registered_function_is_callable_from_context() -> anyhow::Result<()> {
        let mut program = Program::new(vec![sum()]);
        program.run()?;

        let call = Expr::call("sum", vec![Expr::number(4.0), Expr::number(5.0)]);
        assert_eq!(call.evaluate(program.context_mut())?.number(), 9.0);
        Ok(())
    }

    #[test]
    fn step_yields_expression_values() -> anyhow::Result<()> {
        let mut program = Program::new(vec![
            sum(),
            Declaration::Expression(Expr::call("sum", vec![Expr::number(1.0), Expr::number(2.0)])),
        ]);

        assert!(program.step().transpose()?.flatten().is_none());
        assert_eq!(program.step().transpose()?.flatten().map(|value| value.number()), Some(3.0));
        assert!(program.step().is_none());
        Ok(())
    }

    #[test]
    fn declarations_are_processed_in_order() {
        let mut program = Program::new(vec![
            Declaration::Expression(Expr::call("later", vec![])),
            Declaration::Function(Rc::new(Function::new("later", &[], Expr::number(1.0)))),
        ]);

        assert_eq!(program.run().unwrap_err().kind(), ErrorKind::UndefinedFunction);
        assert_eq!(program.pending(), 1);
        assert!(program.run().is_ok());
    }

    #[test]
    fn redeclaring_a_function_is_shadowing() {
        let mut program = Program::new(vec![sum(), sum()]);
        assert_eq!(program.run().unwrap_err().kind(), ErrorKind::Shadowing);
    }

    #[test]
    fn top_level_lambda_is_malformed() {
        let lambda = Function::lambda("f", &[], Expr::number(1.0));
        let mut program = Program::new(vec![Declaration::Function(Rc::new(lambda))]);

        assert_eq!(program.run().unwrap_err().kind(), ErrorKind::MalformedProgram);
        assert_eq!(program.context().current_functions().count(), 0);
    }

    #[test]
    fn extend_appends_pending_declarations() -> anyhow::Result<()> {
        let mut program = Program::new(vec![sum()]);
        program.run()?;

        program.extend([Declaration::Expression(Expr::if_then_else(
            Condition::compare(Expr::call("sum", vec![Expr::number(1.0), Expr::number(1.0)]), ComparisonOp::Gte, Expr::number(2.0)),
            Expr::number(1.0),
            Expr::number(0.0),
        ))]);

        let values = std::iter::from_fn(|| program.step())
            .collect::<EvalResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .map(|value| value.number())
            .collect_vec();
        assert_eq!(values, vec![1.0]);
        Ok(())
    }

    fn compare(value: &Option<Value>, expected: &TestOutput) -> bool {
        match (value, expected) {
            (_, TestOutput::Something(_)) => true,
            (Some(value), TestOutput::Number(number)) => (value.number() - number).abs() < 1.0e-5,
            _ => false
        }
    }

    // Each line is its own chunk of declarations; its result is the value of
    // the last expression on it
    fn evaluate_line(program: &mut Program, source: &str) -> EvalResult<Option<Value>> {
        let mut last = None;
        for declaration in parse(source)? {
            program.extend([declaration]);
            if let Some(value) = program.step().transpose()?.flatten() {
                last = Some(value);
            }
        }
        Ok(last)
    }

    fn assert_run(testcase: usize, entries: Vec<(String, EvaluationResult)>) -> anyhow::Result<()> {
        let mut program = Program::new(Vec::new());
        for (lineno, (source, expected)) in entries.into_iter().enumerate() {
            let result = evaluate_line(&mut program, &source);
            let expected: Result<TestOutput, ErrorKind> = expected.into();

            println!("{}:\n{:?}", source, result);
            match (&result, &expected) {
                (Ok(a), Ok(b)) => assert!(compare(a, b), "Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected),
                (Err(result), Err(expected))
                    => assert_eq!(result.kind(), *expected, "Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected),
                _ => bail!("Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected),
            }

            assert_eq!(program.context().frame_depth(), 1, "Testcase({}, {}): frames leaked", testcase, lineno);
            assert_eq!(program.context().current_variables().count(), 0, "Testcase({}, {}): variables leaked", testcase, lineno);
        }

        Ok(())
    }

    #[test]
    fn evaluate_testcases() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            println!("Running testcase {}", testcase);
            assert_run(testcase, load_test_pair(testcase)?)?;
        }

        Ok(())
    }
}
