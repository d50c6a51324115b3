use std::{collections::{hash_map::Entry, HashMap}, iter, rc::Rc};

use tracing::{debug, trace, warn};

use crate::{ast::{Function, Var}, config::Config, error::{BoiError, ErrorKind, EvalResult}, span::Span, value::Value};


/// One layer of name resolution. Variables are keyed by name, functions by
/// `(name, arity)`.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    variables: HashMap<String, Value>,
    functions: HashMap<(String, usize), Rc<Function>>,
}

/// The evaluation environment: a stack of frames that is never empty.
///
/// The base frame lives as long as the context. Further frames are pushed by
/// calls to ordinary (non-lambda) functions and popped when the call returns.
/// Lookups walk from the topmost frame down to the base frame, so a callee
/// sees every binding of the callers that are still active.
///
/// Every active call counts towards [Config::max_call_depth], lambda calls
/// included even though they push no frame.
///
/// Bindings are at most once per frame: binding a name (or a name/arity pair
/// for functions) that the current frame already holds is a
/// [ErrorKind::Shadowing] error, even though deeper frames are free to
/// hold the same name.
#[derive(Debug)]
pub struct Context {
    base: Frame,
    calls: Vec<Frame>,
    call_depth: usize,
    config: Config,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self { base: Frame::default(), calls: Vec::new(), call_depth: 0, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of live frames, the base frame included
    pub fn frame_depth(&self) -> usize {
        self.calls.len() + 1
    }

    fn current(&self) -> &Frame {
        self.calls.last().unwrap_or(&self.base)
    }

    fn current_mut(&mut self) -> &mut Frame {
        self.calls.last_mut().unwrap_or(&mut self.base)
    }

    // Topmost frame first
    fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.calls.iter().rev().chain(iter::once(&self.base))
    }

    /// Number of calls in progress, lambda calls included
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub fn current_variables(&self) -> impl Iterator<Item = &str> {
        self.current().variables.keys().map(String::as_str)
    }

    pub fn current_functions(&self) -> impl Iterator<Item = (&str, usize)> {
        self.current().functions.keys().map(|(name, arity)| (name.as_str(), *arity))
    }

    fn recursion_limit(&self, span: &Span) -> BoiError {
        BoiError::new(
            ErrorKind::RecursionLimit,
            format!("call depth exceeded the limit of {} frames", self.config.max_call_depth),
            span.clone(),
        )
    }

    pub fn push_frame(&mut self, span: &Span) -> EvalResult<()> {
        if self.frame_depth() >= self.config.max_call_depth {
            return Err(self.recursion_limit(span));
        }

        self.calls.push(Frame::default());
        trace!(depth = self.frame_depth(), "pushed frame");
        Ok(())
    }

    pub fn pop_frame(&mut self) -> EvalResult<()> {
        match self.calls.pop() {
            Some(_) => {
                trace!(depth = self.frame_depth(), "popped frame");
                Ok(())
            }
            None => Err(BoiError::internal("tried to pop the base frame", Span::empty())),
        }
    }

    pub fn bind_variable(&mut self, var: &Var, value: Value) -> EvalResult<()> {
        match self.current_mut().variables.entry(var.name.clone()) {
            Entry::Occupied(_) => Err(BoiError::shadowing(
                format!("variable '{}' is already bound in this frame, and name shadowing is not supported", var.name),
                var.span.clone(),
            )),
            Entry::Vacant(entry) => {
                trace!(name = %var.name, value = %value, "bound variable");
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn unbind_variable(&mut self, var: &Var) -> EvalResult<Value> {
        self.current_mut().variables.remove(&var.name).ok_or_else(|| {
            BoiError::unbind_missing(
                format!("tried to unbind variable '{}' which isn't bound in the current frame", var.name),
                var.span.clone(),
            )
        })
    }

    pub fn bind_function(&mut self, function: Rc<Function>) -> EvalResult<()> {
        let key = (function.name.name.clone(), function.arity());
        match self.current_mut().functions.entry(key) {
            Entry::Occupied(_) => Err(BoiError::shadowing(
                format!(
                    "function '{}' with {} arguments is already defined, and name shadowing is not supported",
                    function.name, function.arity()
                ),
                function.span.clone(),
            )),
            Entry::Vacant(entry) => {
                debug!(function = %function, lambda = function.is_lambda, "registered function");
                entry.insert(function);
                Ok(())
            }
        }
    }

    pub fn unbind_function(&mut self, function: &Function) -> EvalResult<Rc<Function>> {
        let key = (function.name.name.clone(), function.arity());
        self.current_mut().functions.remove(&key).ok_or_else(|| {
            BoiError::unbind_missing(
                format!(
                    "tried to unbind function '{}' with {} arguments which isn't defined in the current frame",
                    function.name, function.arity()
                ),
                function.span.clone(),
            )
        })
    }

    pub fn lookup_variable(&self, var: &Var) -> EvalResult<Value> {
        self.frames()
            .find_map(|frame| frame.variables.get(&var.name))
            .cloned()
            .ok_or_else(|| {
                BoiError::new(ErrorKind::UnboundVariable, format!("no variable with name '{}'", var.name), var.span.clone())
            })
    }

    pub fn lookup_function(&self, name: &Var, arity: usize) -> EvalResult<Rc<Function>> {
        let key = (name.name.clone(), arity);
        self.frames()
            .find_map(|frame| frame.functions.get(&key))
            .cloned()
            .ok_or_else(|| {
                BoiError::new(
                    ErrorKind::UndefinedFunction,
                    format!("no such function '{}' with {} arguments", name.name, arity),
                    name.span.clone(),
                )
            })
    }

    /// Runs `body` as one call, counting it against the depth limit until it
    /// returns. The base frame counts as one level, so at most
    /// `max_call_depth - 1` calls are active at once.
    pub fn with_call<T>(&mut self, span: &Span, body: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        if self.call_depth + 1 >= self.config.max_call_depth {
            return Err(self.recursion_limit(span));
        }

        self.call_depth += 1;
        let result = body(self);
        self.call_depth -= 1;
        result
    }

    /// Runs `body` in a fresh frame, popping it on every exit path.
    pub fn with_frame<T>(&mut self, span: &Span, body: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        let outer = self.calls.len();
        self.push_frame(span)?;
        let depth = self.frame_depth();

        let result = body(self);
        if self.frame_depth() != depth {
            let error = BoiError::internal(
                format!("frame stack is at depth {} after a call entered at depth {}", self.frame_depth(), depth),
                span.clone(),
            );
            self.calls.truncate(outer);
            return release(Err(error), result);
        }

        let popped = self.pop_frame();
        release(result, popped)
    }

    /// Runs `body` with `var` bound in the current frame, unbinding it on
    /// every exit path.
    pub fn with_variable<T>(&mut self, var: &Var, value: Value, body: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.bind_variable(var, value)?;
        let result = body(self);
        let unbound = self.unbind_variable(var);
        release(result, unbound)
    }

    /// Binds `params` to `arguments` left to right in the current frame, runs
    /// `body`, then unbinds them. A failed binding unbinds the parameters
    /// bound before it.
    pub fn with_arguments<T>(
        &mut self,
        params: &[Var],
        arguments: Vec<Value>,
        body: impl FnOnce(&mut Self) -> EvalResult<T>
    ) -> EvalResult<T> {
        if params.len() != arguments.len() {
            return Err(BoiError::internal(
                format!("binding {} arguments to {} parameters", arguments.len(), params.len()),
                Span::empty(),
            ));
        }

        for (bound, (param, value)) in params.iter().zip(arguments).enumerate() {
            if let Err(error) = self.bind_variable(param, value) {
                let unwound = self.unbind_arguments(&params[..bound]);
                return release(Err(error), unwound);
            }
        }

        let result = body(self);
        let unbound = self.unbind_arguments(params);
        release(result, unbound)
    }

    /// Runs `body` with `function` registered in the current frame,
    /// unregistering it on every exit path.
    pub fn with_function<T>(&mut self, function: &Rc<Function>, body: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.bind_function(Rc::clone(function))?;
        let result = body(self);
        let unbound = self.unbind_function(function);
        release(result, unbound)
    }

    fn unbind_arguments(&mut self, params: &[Var]) -> EvalResult<()> {
        let mut outcome = Ok(());
        for param in params.iter().rev() {
            if let Err(error) = self.unbind_variable(param) {
                outcome = outcome.and(Err(error));
            }
        }
        outcome
    }
}

// The body's error wins over a failure to release
fn release<T, U>(result: EvalResult<T>, released: EvalResult<U>) -> EvalResult<T> {
    match (result, released) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(error)) | (Err(error), Ok(_)) => Err(error),
        (Err(error), Err(secondary)) => {
            warn!(%secondary, "release failed while unwinding '{}'", error);
            Err(error)
        }
    }
}
