//! Script objects: ordered properties, a prototype link and a kind
//!
//! Objects are shared through `ObjectHandle`. Inherited lookup goes through
//! the `prototype` field rather than through a type hierarchy, so every kind
//! of object (plain, function, array, wrapper) resolves properties the same
//! way.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::warn;

use super::array::ArrayElements;
use super::error::{ScriptError, ScriptResult};
use super::function::FunctionObject;
use super::value::{number_to_string, ScriptValue};
use super::wrapper::HostBinding;

#[derive(Clone, Debug, Default)]
pub struct Property {
    pub value: ScriptValue,
    /// Excluded from enumeration, still found by lookup
    pub hidden: bool,
    /// Assignments are ignored
    pub read_only: bool,
}

impl Property {
    pub fn visible(value: ScriptValue) -> Self {
        Self { value, hidden: false, read_only: false }
    }

    pub fn hidden(value: ScriptValue) -> Self {
        Self { value, hidden: true, read_only: false }
    }
}

/// Properties in insertion order
#[derive(Clone, Debug, Default)]
pub struct PropertyMap {
    entries: Vec<(String, Property)>,
    index: HashMap<String, usize>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Insert or replace; a replaced property keeps its position
    pub fn insert(&mut self, name: &str, property: Property) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 = property,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), property));
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let i = self.index.remove(name)?;
        let (_, property) = self.entries.remove(i);
        for (_, slot) in self.index.iter_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(name, property)| (name.as_str(), property))
    }

    /// Names of non-hidden properties in insertion order
    pub fn visible_names(&self) -> Vec<String> {
        self.entries.iter().filter(|(_, p)| !p.hidden).map(|(name, _)| name.clone()).collect()
    }
}

/// What an object is, beyond its properties
#[derive(Clone)]
pub enum ObjectKind {
    Plain,
    Function(FunctionObject),
    Array(ArrayElements),
    /// Milliseconds since the epoch
    Date(f64),
    /// Proxy over a host store
    Wrapper(HostBinding),
}

impl fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Plain => write!(f, "Plain"),
            ObjectKind::Function(func) => write!(f, "Function({})", func.name),
            ObjectKind::Array(elements) => write!(f, "Array(len={})", elements.len()),
            ObjectKind::Date(ms) => write!(f, "Date({})", ms),
            ObjectKind::Wrapper(binding) => write!(f, "Wrapper({})", binding.variant_name()),
        }
    }
}

#[derive(Debug)]
pub struct ScriptObject {
    pub class_name: String,
    pub properties: PropertyMap,
    pub prototype: Option<ObjectHandle>,
    pub kind: ObjectKind,
}

impl ScriptObject {
    pub fn new(class_name: &str, kind: ObjectKind, prototype: Option<ObjectHandle>) -> Self {
        Self { class_name: class_name.to_string(), properties: PropertyMap::new(), prototype, kind }
    }

    pub fn binding(&self) -> Option<&HostBinding> {
        match &self.kind {
            ObjectKind::Wrapper(binding) => Some(binding),
            _ => None,
        }
    }
}

/// Shared reference to a script object; equality is identity
#[derive(Clone)]
pub struct ObjectHandle(Rc<RefCell<ScriptObject>>);

impl ObjectHandle {
    pub fn new(object: ScriptObject) -> Self {
        ObjectHandle(Rc::new(RefCell::new(object)))
    }

    pub fn plain(prototype: Option<ObjectHandle>) -> Self {
        Self::new(ScriptObject::new("Object", ObjectKind::Plain, prototype))
    }

    pub fn borrow(&self) -> Ref<'_, ScriptObject> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ScriptObject> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the object, stable for its lifetime
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn class_name(&self) -> String {
        self.borrow().class_name.clone()
    }

    pub fn prototype(&self) -> Option<ObjectHandle> {
        self.borrow().prototype.clone()
    }

    /// Link `prototype`, refusing links that would make the chain cyclic
    pub fn set_prototype(&self, prototype: Option<ObjectHandle>) -> ScriptResult<()> {
        let mut cursor = prototype.clone();
        while let Some(current) = cursor {
            if current.ptr_eq(self) {
                return Err(ScriptError::PrototypeCycle(self.class_name()));
            }
            cursor = current.prototype();
        }
        self.borrow_mut().prototype = prototype;
        Ok(())
    }

    pub fn is_function(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Array(_))
    }

    pub fn binding(&self) -> Option<HostBinding> {
        self.borrow().binding().cloned()
    }

    /// Own property value, ignoring the prototype chain and any host store
    pub fn own(&self, name: &str) -> Option<ScriptValue> {
        self.borrow().properties.get(name).map(|p| p.value.clone())
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.borrow().properties.contains(name)
    }

    /// Define or replace an own property that is skipped by enumeration
    pub fn define_hidden(&self, name: &str, value: ScriptValue) {
        self.borrow_mut().properties.insert(name, Property::hidden(value));
    }

    /// Define or replace an own visible property
    pub fn define(&self, name: &str, value: ScriptValue) {
        self.borrow_mut().properties.insert(name, Property::visible(value));
    }

    pub fn define_read_only(&self, name: &str, value: ScriptValue) {
        self.borrow_mut()
            .properties
            .insert(name, Property { value, hidden: true, read_only: true });
    }

    /// String conversion used where no script `toString` is consulted
    pub fn default_string(&self) -> String {
        self.string_guarded(&mut HashSet::new())
    }

    /// Array elements joined by `separator`; an array met again inside
    /// itself renders as the empty string
    pub fn join_elements(&self, separator: &str) -> ScriptResult<String> {
        self.join_guarded(separator, &mut HashSet::new())
            .ok_or_else(|| ScriptError::RangeError("joined array is too long".to_string()))
    }

    fn string_guarded(&self, seen: &mut HashSet<usize>) -> String {
        if self.is_array() {
            return self.join_guarded(",", seen).unwrap_or_else(|| {
                warn!("array {:?} is too long to convert to a string", self);
                String::new()
            });
        }
        let object = self.borrow();
        match &object.kind {
            ObjectKind::Function(func) => format!("function {}() {{ [native code] }}", func.name),
            ObjectKind::Date(ms) => number_to_string(*ms),
            ObjectKind::Wrapper(binding) => binding.describe(),
            ObjectKind::Plain | ObjectKind::Array(_) => format!("[object {}]", object.class_name),
        }
    }

    fn join_guarded(&self, separator: &str, seen: &mut HashSet<usize>) -> Option<String> {
        if !seen.insert(self.id()) {
            return Some(String::new());
        }
        let joined = match &self.borrow().kind {
            ObjectKind::Array(elements) => elements.join_with(separator, |value| match value {
                ScriptValue::Object(handle) => handle.string_guarded(seen),
                other => other.to_script_string(),
            }),
            _ => Some(String::new()),
        };
        seen.remove(&self.id());
        joined
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectHandle {}

impl fmt::Debug for ObjectHandle {
    // Properties may refer back to this object, so only the header is printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(f, "[{} {:?} #{:x}]", object.class_name, object.kind, self.id()),
            Err(_) => write!(f, "[object #{:x}]", self.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_map_keeps_insertion_order() {
        let mut map = PropertyMap::new();
        map.insert("b", Property::visible(1.into()));
        map.insert("a", Property::hidden(2.into()));
        map.insert("c", Property::visible(3.into()));
        map.insert("b", Property::visible(4.into()));
        assert_eq!(map.visible_names(), vec!["b", "c"]);
        assert!(map.remove("b").is_some());
        assert_eq!(map.get("c").map(|p| p.value.to_number()), Some(3.0));
        map.insert("d", Property::visible(5.into()));
        assert_eq!(map.visible_names(), vec!["c", "d"]);
    }

    #[test]
    fn test_prototype_cycle_is_rejected() {
        let a = ObjectHandle::plain(None);
        let b = ObjectHandle::plain(Some(a.clone()));
        assert!(matches!(a.set_prototype(Some(b.clone())), Err(ScriptError::PrototypeCycle(_))));
        assert!(a.set_prototype(Some(ObjectHandle::plain(None))).is_ok());
        assert!(a.set_prototype(Some(a.clone())).is_err());
    }

    #[test]
    fn test_array_default_string() {
        let array = ObjectHandle::new(ScriptObject::new(
            "Array",
            ObjectKind::Array(ArrayElements::from_values(vec![1.into(), ScriptValue::Null, "x".into()])),
            None,
        ));
        assert_eq!(array.default_string(), "1,,x");
    }

    #[test]
    fn test_self_containing_array_renders_once() {
        let inner = ObjectHandle::new(ScriptObject::new("Array", ObjectKind::Array(ArrayElements::new()), None));
        let outer = ObjectHandle::new(ScriptObject::new(
            "Array",
            ObjectKind::Array(ArrayElements::from_values(vec![1.into(), ScriptValue::Object(inner.clone())])),
            None,
        ));
        if let ObjectKind::Array(elements) = &mut inner.borrow_mut().kind {
            elements.push(ScriptValue::Object(outer.clone()));
            elements.push(2.into());
        }
        if let ObjectKind::Array(elements) = &mut outer.borrow_mut().kind {
            elements.push(ScriptValue::Object(outer.clone()));
        }
        assert_eq!(outer.default_string(), "1,,2,");
        assert_eq!(outer.join_elements("|").unwrap(), "1|,2|");
        assert_eq!(ScriptValue::Object(inner).to_script_string(), "1,,,2");
    }
}
