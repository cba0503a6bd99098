//! The property protocol shared by every kind of script object
//!
//! Lookup precedence is own property, then the prototype chain, then the
//! host store of a wrapper. Writes go to an existing own property, then to
//! the host store (subject to the wrapper's put policy), then become a new
//! own property. Enumeration never leaves the object itself.

use log::debug;

use super::array::{element_index, parse_index, to_array_length};
use super::error::{ScriptError, ScriptResult};
use super::evaluator::Evaluator;
use super::object::{ObjectHandle, ObjectKind};
use super::value::ScriptValue;
use super::wrapper::{PutPolicy, StorePut};

/// Find `name` on `object` or its prototypes, ignoring host stores
fn chain_lookup(object: &ObjectHandle, name: &str) -> Option<ScriptValue> {
    if let Some(value) = object.own(name) {
        return Some(value);
    }
    let mut cursor = object.prototype();
    while let Some(proto) = cursor {
        if let Some(value) = proto.own(name) {
            return Some(value);
        }
        cursor = proto.prototype();
    }
    None
}

/// Whether an inherited read-only property shadows assignments to `name`
fn inherited_read_only(object: &ObjectHandle, name: &str) -> bool {
    let mut cursor = object.prototype();
    while let Some(proto) = cursor {
        if let Some(property) = proto.borrow().properties.get(name) {
            return property.read_only;
        }
        cursor = proto.prototype();
    }
    false
}

fn array_length(object: &ObjectHandle) -> Option<usize> {
    match &object.borrow().kind {
        ObjectKind::Array(elements) => Some(elements.len() as usize),
        _ => None,
    }
}

impl Evaluator {
    /// Property value, or undefined when nothing along the lookup path has it
    pub fn get(&mut self, object: &ObjectHandle, name: &str) -> ScriptResult<ScriptValue> {
        if let Some(len) = array_length(object) {
            if name == "length" {
                return Ok(ScriptValue::Number(len as f64));
            }
            if let Some(index) = parse_index(name) {
                return self.get_index(object, index as usize);
            }
        }
        if let Some(value) = chain_lookup(object, name) {
            return Ok(value);
        }
        if let Some(binding) = object.binding() {
            if let Some(host) = binding.store().get(name)? {
                return Ok(self.wrap(host));
            }
        }
        Ok(ScriptValue::Undefined)
    }

    pub fn has_property(&mut self, object: &ObjectHandle, name: &str) -> ScriptResult<bool> {
        if let ObjectKind::Array(elements) = &object.borrow().kind {
            if name == "length" {
                return Ok(true);
            }
            if let Some(index) = parse_index(name) {
                return Ok(elements.contains(index));
            }
        }
        if chain_lookup(object, name).is_some() {
            return Ok(true);
        }
        match object.binding() {
            Some(binding) => Ok(binding.store().get(name)?.is_some()),
            None => Ok(false),
        }
    }

    pub fn put(&mut self, object: &ObjectHandle, name: &str, value: ScriptValue) -> ScriptResult<()> {
        if array_length(object).is_some() {
            if name == "length" {
                return self.set_array_length(object, &value);
            }
            if let Some(index) = parse_index(name) {
                return self.put_index(object, index as usize, value);
            }
        }
        {
            let mut target = object.borrow_mut();
            if let Some(property) = target.properties.get_mut(name) {
                if !property.read_only {
                    property.value = value;
                }
                return Ok(());
            }
        }
        if inherited_read_only(object, name) {
            return Ok(());
        }
        if let Some(binding) = object.binding() {
            let host = self.to_host(&value)?;
            match binding.store().put(name, host)? {
                StorePut::Stored => return Ok(()),
                StorePut::NotHandled => {}
                StorePut::Rejected => match binding.store().put_policy() {
                    PutPolicy::Throw => return Err(ScriptError::ReadOnly { property: name.to_string() }),
                    PutPolicy::Ignore => {
                        debug!("ignoring write to read-only {} on {}", name, binding.describe());
                        return Ok(());
                    }
                    PutPolicy::Delegate => {}
                },
            }
        }
        object.define(name, value);
        Ok(())
    }

    fn set_array_length(&mut self, object: &ObjectHandle, value: &ScriptValue) -> ScriptResult<()> {
        let length = to_array_length(value.to_number())
            .ok_or_else(|| ScriptError::RangeError(format!("invalid array length {}", value)))?;
        if let ObjectKind::Array(elements) = &mut object.borrow_mut().kind {
            elements.set_len(length);
        }
        Ok(())
    }

    /// Remove an own property, and the store entry of a wrapper; never touches prototypes
    pub fn delete(&mut self, object: &ObjectHandle, name: &str) -> ScriptResult<bool> {
        if let Some(index) = parse_index(name) {
            if let ObjectKind::Array(elements) = &mut object.borrow_mut().kind {
                return Ok(elements.remove(index));
            }
        }
        let removed_own = object.borrow_mut().properties.remove(name).is_some();
        let removed_store = match object.binding() {
            Some(binding) => binding.store().delete(name)?,
            None => false,
        };
        Ok(removed_own || removed_store)
    }

    /// Visible names of the object itself: array indices, own properties, then store keys
    pub fn enumerate(&self, object: &ObjectHandle) -> Vec<String> {
        let mut names: Vec<String> = match &object.borrow().kind {
            ObjectKind::Array(elements) => elements.indices().map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        };
        names.extend(object.borrow().properties.visible_names());
        if let Some(binding) = object.binding() {
            for key in binding.store().keys() {
                if !names.contains(&key) {
                    names.push(key);
                }
            }
        }
        names
    }

    /// Element count of arrays and indexed stores
    pub fn length_of(&self, object: &ObjectHandle) -> Option<usize> {
        array_length(object).or_else(|| object.binding().and_then(|b| b.store().len()))
    }

    pub fn get_index(&mut self, object: &ObjectHandle, index: usize) -> ScriptResult<ScriptValue> {
        if let (ObjectKind::Array(elements), Some(index)) = (&object.borrow().kind, element_index(index)) {
            return Ok(elements.get(index).cloned().unwrap_or_default());
        }
        if let Some(binding) = object.binding() {
            if binding.store().len().is_some() {
                return Ok(match binding.store().get_index(index)? {
                    Some(host) => self.wrap(host),
                    None => ScriptValue::Undefined,
                });
            }
        }
        self.get(object, &index.to_string())
    }

    /// Indices past `MAX_ARRAY_INDEX` on an array are ordinary properties
    pub fn put_index(&mut self, object: &ObjectHandle, index: usize, value: ScriptValue) -> ScriptResult<()> {
        if let (ObjectKind::Array(elements), Some(index)) = (&mut object.borrow_mut().kind, element_index(index)) {
            elements.set(index, value);
            return Ok(());
        }
        if let Some(binding) = object.binding() {
            if binding.store().len().is_some() {
                let host = self.to_host(&value)?;
                return match binding.store().put_index(index, host)? {
                    StorePut::Rejected if binding.store().put_policy() == PutPolicy::Throw => {
                        Err(ScriptError::ReadOnly { property: index.to_string() })
                    }
                    _ => Ok(()),
                };
            }
        }
        self.put(object, &index.to_string(), value)
    }

    /// Call the function stored under `name` with `object` as `this`, falling
    /// back to a host method of a wrapper
    pub fn invoke(&mut self, object: &ObjectHandle, name: &str, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        let target = self.get(object, name)?;
        if target.as_object().map(ObjectHandle::is_function).unwrap_or(false) {
            return self.call(&target, &ScriptValue::Object(object.clone()), args);
        }
        if let Some(binding) = object.binding() {
            let host_args = args.iter().map(|a| self.to_host(a)).collect::<ScriptResult<Vec<_>>>()?;
            if let Some(result) = binding.store().invoke(name, &host_args) {
                let host = result?;
                return Ok(self.wrap(host));
            }
        }
        Err(ScriptError::NotAFunction(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prototype_fallthrough() {
        let mut rt = Evaluator::new();
        let proto = rt.create_object();
        proto.define("greeting", "hi".into());
        let object = rt.create_object();
        object.set_prototype(Some(proto.clone())).unwrap();
        assert_eq!(rt.get(&object, "greeting").unwrap().to_script_string(), "hi");
        assert!(rt.get(&object, "missing").unwrap().is_undefined());
        rt.put(&object, "greeting", "own".into()).unwrap();
        assert_eq!(rt.get(&proto, "greeting").unwrap().to_script_string(), "hi");
        assert!(rt.delete(&object, "greeting").unwrap());
        assert_eq!(rt.get(&object, "greeting").unwrap().to_script_string(), "hi");
        assert!(!rt.delete(&object, "greeting").unwrap());
    }

    #[test]
    fn test_hidden_properties_are_not_enumerated() {
        let mut rt = Evaluator::new();
        let object = rt.create_object();
        rt.put(&object, "b", 1.into()).unwrap();
        object.define_hidden("secret", 2.into());
        rt.put(&object, "a", 3.into()).unwrap();
        assert_eq!(rt.enumerate(&object), vec!["b", "a"]);
        assert_eq!(rt.get(&object, "secret").unwrap().to_number(), 2.0);
    }

    #[test]
    fn test_array_length_tracks_indices() {
        let mut rt = Evaluator::new();
        let array = rt.create_array(vec![1.into(), 2.into()]);
        rt.put(&array, "4", 5.into()).unwrap();
        assert_eq!(rt.get(&array, "length").unwrap().to_number(), 5.0);
        assert!(rt.get(&array, "3").unwrap().is_undefined());
        rt.put(&array, "length", 1.into()).unwrap();
        assert_eq!(rt.enumerate(&array), vec!["0"]);
        assert!(rt.put(&array, "length", (-1).into()).is_err());
    }

    #[test]
    fn test_read_only_own_property_ignores_writes() {
        let mut rt = Evaluator::new();
        let object = rt.create_object();
        object.define_read_only("fixed", 1.into());
        rt.put(&object, "fixed", 2.into()).unwrap();
        assert_eq!(rt.get(&object, "fixed").unwrap().to_number(), 1.0);
    }

    #[test]
    fn test_far_indices_and_lengths_stay_sparse() {
        let mut rt = Evaluator::new();
        let array = rt.create_array(vec![1.into()]);
        rt.put(&array, "4294967294", 7.into()).unwrap();
        assert_eq!(rt.get(&array, "length").unwrap().to_number(), 4294967295.0);
        assert_eq!(rt.get(&array, "4294967294").unwrap().to_number(), 7.0);
        assert_eq!(rt.enumerate(&array), vec!["0", "4294967294"]);
        assert!(!rt.has_property(&array, "70000").unwrap());

        // Past the last element index a name is an ordinary property
        rt.put(&array, "4294967295", 8.into()).unwrap();
        assert!(array.has_own("4294967295"));
        assert_eq!(rt.length_of(&array), Some(4294967295));

        rt.put(&array, "length", 2.into()).unwrap();
        assert_eq!(rt.enumerate(&array), vec!["0", "4294967295"]);
        rt.put(&array, "length", 4294967295.0.into()).unwrap();
        assert_eq!(rt.length_of(&array), Some(4294967295));
        assert!(matches!(rt.put(&array, "length", 4294967296.0.into()), Err(ScriptError::RangeError(_))));
        assert!(matches!(rt.invoke(&array, "join", &[]), Err(ScriptError::RangeError(_))));
    }

    #[test]
    fn test_put_index_past_last_element_is_a_property() {
        let mut rt = Evaluator::new();
        let array = rt.create_array(Vec::new());
        rt.put_index(&array, u32::MAX as usize, "edge".into()).unwrap();
        assert_eq!(rt.length_of(&array), Some(0));
        assert_eq!(rt.get_index(&array, u32::MAX as usize).unwrap().to_script_string(), "edge");
    }

    #[test]
    fn test_self_containing_array_into_a_map() {
        use crate::runtime::host::{HostMap, HostValue};

        let mut rt = Evaluator::new();
        let array = rt.create_array(vec![1.into()]);
        rt.invoke(&array, "push", &[ScriptValue::Object(array.clone())]).unwrap();
        let map = HostMap::new().shared();
        let wrapper = rt.wrap(HostValue::Map(map.clone()));
        rt.put(wrapper.as_object().unwrap(), "k", ScriptValue::Object(array.clone())).unwrap();

        let stored = map.borrow().get("k").cloned();
        let list = match stored {
            Some(HostValue::List(list)) => list,
            other => panic!("expected a list, got {:?}", other),
        };
        let inner = list.borrow()[1].clone();
        assert!(matches!(inner, HostValue::List(ref again) if std::rc::Rc::ptr_eq(again, &list)));
        assert_eq!(array.default_string(), "1,");
    }
}
