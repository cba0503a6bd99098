use super::{HostStore, PutPolicy, StorePut};
use crate::runtime::error::ScriptResult;
use crate::runtime::host::{ElementRef, HostValue};

/// Path element children as script properties; assignments stay on the wrapper
#[derive(Clone)]
pub struct GenericWrapper {
    element: ElementRef,
}

impl GenericWrapper {
    pub fn new(element: ElementRef) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &ElementRef {
        &self.element
    }
}

impl HostStore for GenericWrapper {
    fn put_policy(&self) -> PutPolicy {
        PutPolicy::Delegate
    }

    fn get(&self, name: &str) -> ScriptResult<Option<HostValue>> {
        Ok(match name {
            "_name" | "_id" => Some(HostValue::String(self.element.element_name())),
            "_parent" => self.element.parent_element(),
            _ => self.element.child_element(name),
        })
    }

    fn put(&self, _name: &str, _value: HostValue) -> ScriptResult<StorePut> {
        Ok(StorePut::Rejected)
    }

    fn delete(&self, _name: &str) -> ScriptResult<bool> {
        Ok(false)
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn prototype_name(&self) -> Option<String> {
        self.element.prototype_name()
    }

    fn describe(&self) -> String {
        format!("[object {}]", self.element.element_name())
    }
}
