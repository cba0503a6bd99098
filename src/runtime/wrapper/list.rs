use super::{HostStore, PutPolicy, StorePut};
use crate::runtime::array::parse_index;
use crate::runtime::error::{ScriptError, ScriptResult};
use crate::runtime::host::{HostValue, ListRef};
use crate::runtime::value::number_to_string;

/// Host list elements as indices; reads and writes go to the shared list
#[derive(Clone)]
pub struct ListWrapper {
    list: ListRef,
}

impl ListWrapper {
    pub fn new(list: ListRef) -> Self {
        Self { list }
    }

    pub fn list(&self) -> &ListRef {
        &self.list
    }
}

impl HostStore for ListWrapper {
    fn put_policy(&self) -> PutPolicy {
        PutPolicy::Throw
    }

    fn get(&self, name: &str) -> ScriptResult<Option<HostValue>> {
        if name == "length" {
            return Ok(Some(HostValue::Integer(self.list.borrow().len() as i64)));
        }
        match parse_index(name) {
            Some(index) => self.get_index(index as usize),
            None => Ok(None),
        }
    }

    fn put(&self, name: &str, value: HostValue) -> ScriptResult<StorePut> {
        if name == "length" {
            return Ok(StorePut::Rejected);
        }
        match parse_index(name) {
            Some(index) => self.put_index(index as usize, value),
            None => Ok(StorePut::NotHandled),
        }
    }

    // Elements cannot be punched out of a host list
    fn delete(&self, _name: &str) -> ScriptResult<bool> {
        Ok(false)
    }

    fn keys(&self) -> Vec<String> {
        (0..self.list.borrow().len()).map(|i| i.to_string()).collect()
    }

    fn get_index(&self, index: usize) -> ScriptResult<Option<HostValue>> {
        Ok(self.list.borrow().get(index).cloned())
    }

    /// Replace an element or append right after the last one
    fn put_index(&self, index: usize, value: HostValue) -> ScriptResult<StorePut> {
        let mut list = self.list.borrow_mut();
        let len = list.len();
        if index < len {
            list[index] = value;
        } else if index == len {
            list.push(value);
        } else {
            return Err(ScriptError::IndexOutOfRange { index, len });
        }
        Ok(StorePut::Stored)
    }

    fn len(&self) -> Option<usize> {
        Some(self.list.borrow().len())
    }

    fn describe(&self) -> String {
        let list = self.list.borrow();
        let mut parts = Vec::with_capacity(list.len());
        for item in list.iter() {
            parts.push(match item {
                HostValue::Null => String::new(),
                HostValue::Boolean(b) => b.to_string(),
                HostValue::Integer(i) => i.to_string(),
                HostValue::Number(n) => number_to_string(*n),
                HostValue::String(s) => s.clone(),
                other => format!("[{}]", other.kind()),
            });
        }
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_writes_reach_the_list() {
        let list: ListRef = Rc::new(RefCell::new(vec![HostValue::Integer(1)]));
        let wrapper = ListWrapper::new(list.clone());
        assert_eq!(wrapper.put("0", HostValue::Integer(9)).unwrap(), StorePut::Stored);
        assert_eq!(wrapper.put_index(1, "b".into()).unwrap(), StorePut::Stored);
        assert!(matches!(list.borrow()[0], HostValue::Integer(9)));
        assert_eq!(wrapper.len(), Some(2));
        assert_eq!(wrapper.keys(), vec!["0".to_string(), "1".to_string()]);
        assert!(matches!(wrapper.get("length").unwrap(), Some(HostValue::Integer(2))));
        assert_eq!(wrapper.describe(), "9,b");
    }

    #[test]
    fn test_gaps_and_length_are_refused() {
        let wrapper = ListWrapper::new(Rc::new(RefCell::new(Vec::new())));
        assert!(matches!(
            wrapper.put_index(3, HostValue::Null),
            Err(ScriptError::IndexOutOfRange { index: 3, len: 0 })
        ));
        assert_eq!(wrapper.put("length", HostValue::Integer(5)).unwrap(), StorePut::Rejected);
        assert_eq!(wrapper.put("tag", "x".into()).unwrap(), StorePut::NotHandled);
        assert!(!wrapper.delete("0").unwrap());
    }
}
