use std::rc::Rc;

use super::error::ScriptResult;
use super::evaluator::Evaluator;
use super::value::ScriptValue;

/// Native implementation of a script function: `(evaluator, this, arguments)`
pub type NativeFn = Rc<dyn Fn(&mut Evaluator, &ScriptValue, &[ScriptValue]) -> ScriptResult<ScriptValue>>;

/// Callable part of a function object
#[derive(Clone)]
pub struct FunctionObject {
    pub name: String,
    /// Declared parameter count, reported as `length`
    pub arity: usize,
    pub call: NativeFn,
}

impl FunctionObject {
    pub fn new<F>(name: &str, arity: usize, call: F) -> Self
    where
        F: Fn(&mut Evaluator, &ScriptValue, &[ScriptValue]) -> ScriptResult<ScriptValue> + 'static,
    {
        Self { name: name.to_string(), arity, call: Rc::new(call) }
    }
}

/// Argument `index`, or undefined when fewer were passed
pub fn argument(args: &[ScriptValue], index: usize) -> ScriptValue {
    args.get(index).cloned().unwrap_or_default()
}
