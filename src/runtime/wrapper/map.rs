use super::{HostStore, PutPolicy, StorePut};
use crate::runtime::error::ScriptResult;
use crate::runtime::host::{HostValue, MapRef};

/// Map entries as script properties; writes to a read-only map are dropped
#[derive(Clone)]
pub struct MapWrapper {
    map: MapRef,
}

impl MapWrapper {
    pub fn new(map: MapRef) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &MapRef {
        &self.map
    }
}

impl HostStore for MapWrapper {
    fn put_policy(&self) -> PutPolicy {
        PutPolicy::Ignore
    }

    fn get(&self, name: &str) -> ScriptResult<Option<HostValue>> {
        Ok(self.map.borrow().get(name).cloned())
    }

    fn put(&self, name: &str, value: HostValue) -> ScriptResult<StorePut> {
        let mut map = self.map.borrow_mut();
        if map.is_read_only() {
            return Ok(StorePut::Rejected);
        }
        map.insert(name, value);
        Ok(StorePut::Stored)
    }

    fn delete(&self, name: &str) -> ScriptResult<bool> {
        let mut map = self.map.borrow_mut();
        if map.is_read_only() {
            return Ok(false);
        }
        Ok(map.remove(name).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.map.borrow().keys()
    }

    fn describe(&self) -> String {
        "[object Map]".to_string()
    }
}
