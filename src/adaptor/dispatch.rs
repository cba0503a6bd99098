//! Script side of `fire`
//!
//! The base class of every adaptor receives `(args, ordinal)` pairs; an
//! `EventBinding` turns them into a call of the script function stored under
//! the listener method's name on the bound target object.

use log::trace;

use super::generator::{AdaptorMethod, SynthesizedAdaptor};
use crate::runtime::{Evaluator, HostValue, ObjectHandle, ScriptError, ScriptResult, ScriptValue};

#[derive(Debug, Clone)]
pub struct EventBinding {
    methods: Vec<AdaptorMethod>,
    target: ObjectHandle,
}

impl EventBinding {
    pub fn new(adaptor: &SynthesizedAdaptor, target: ObjectHandle) -> Self {
        Self { methods: adaptor.methods.clone(), target }
    }

    pub fn target(&self) -> &ObjectHandle {
        &self.target
    }

    pub fn methods(&self) -> &[AdaptorMethod] {
        &self.methods
    }

    /// Deliver one listener call; `Ok(false)` when the target has no handler for it
    pub fn fire(&self, rt: &mut Evaluator, ordinal: usize, args: Vec<HostValue>) -> ScriptResult<bool> {
        let method = self
            .methods
            .get(ordinal)
            .ok_or(ScriptError::IndexOutOfRange { index: ordinal, len: self.methods.len() })?;
        let handler = rt.get(&self.target, &method.name)?;
        if handler.is_undefined() {
            trace!("no handler for {}", method.name);
            return Ok(false);
        }
        let is_function = handler.as_object().map(|h| h.is_function()).unwrap_or(false);
        if !is_function {
            return Err(ScriptError::NotAFunction(method.name.clone()));
        }
        let args: Vec<ScriptValue> = args.into_iter().map(|arg| rt.wrap(arg)).collect();
        rt.call(&handler, &ScriptValue::Object(self.target.clone()), &args)?;
        Ok(true)
    }

    /// `fire` by listener method name
    pub fn fire_named(&self, rt: &mut Evaluator, name: &str, args: Vec<HostValue>) -> ScriptResult<bool> {
        match self.methods.iter().position(|m| m.name == name) {
            Some(ordinal) => self.fire(rt, ordinal, args),
            None => Ok(false),
        }
    }
}
