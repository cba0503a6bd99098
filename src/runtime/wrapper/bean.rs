use super::{HostStore, PutPolicy, StorePut};
use crate::runtime::error::{ScriptError, ScriptResult};
use crate::runtime::host::{BeanError, BeanRef, HostValue};

/// Bean properties as script properties; writes to read-only ones raise
#[derive(Clone)]
pub struct BeanWrapper {
    bean: BeanRef,
}

impl BeanWrapper {
    pub fn new(bean: BeanRef) -> Self {
        Self { bean }
    }

    pub fn bean(&self) -> &BeanRef {
        &self.bean
    }

    fn error(&self, property: &str, source: BeanError) -> ScriptError {
        ScriptError::Bean { class: self.bean.borrow().class_name().to_string(), property: property.to_string(), source }
    }
}

impl HostStore for BeanWrapper {
    fn put_policy(&self) -> PutPolicy {
        PutPolicy::Throw
    }

    fn get(&self, name: &str) -> ScriptResult<Option<HostValue>> {
        Ok(self.bean.borrow().get_property(name))
    }

    fn put(&self, name: &str, value: HostValue) -> ScriptResult<StorePut> {
        let known = self.bean.borrow().property_names().iter().any(|p| p == name);
        if !known {
            return Ok(StorePut::NotHandled);
        }
        if self.bean.borrow().is_read_only(name) {
            return Ok(StorePut::Rejected);
        }
        let result = self.bean.borrow_mut().set_property(name, value);
        match result {
            Ok(()) => Ok(StorePut::Stored),
            Err(BeanError::ReadOnly) => Ok(StorePut::Rejected),
            Err(e) => Err(self.error(name, e)),
        }
    }

    fn delete(&self, _name: &str) -> ScriptResult<bool> {
        Ok(false)
    }

    fn keys(&self) -> Vec<String> {
        self.bean.borrow().property_names()
    }

    fn invoke(&self, name: &str, args: &[HostValue]) -> Option<ScriptResult<HostValue>> {
        let result = self.bean.borrow_mut().invoke(name, args)?;
        Some(result.map_err(|e| self.error(name, e)))
    }

    fn describe(&self) -> String {
        format!("[object {}]", self.bean.borrow().class_name())
    }
}
