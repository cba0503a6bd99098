//! Global environment: the global object, named prototypes, the scope chain
//! and the wrapper cache of one evaluation context

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use super::array::{to_array_length, ArrayElements};
use super::cache::WrapperCache;
use super::error::{ScriptError, ScriptResult};
use super::function::{argument, FunctionObject};
use super::host::{HostValue, ListRef, Node, NodeRef};
use super::object::{ObjectHandle, ObjectKind, ScriptObject};
use super::scope::ScopeChain;
use super::value::ScriptValue;
use super::wrapper::HostBinding;

pub const OBJECT_PROTOTYPE: &str = "Object";
pub const FUNCTION_PROTOTYPE: &str = "Function";
pub const ARRAY_PROTOTYPE: &str = "Array";
pub const DATE_PROTOTYPE: &str = "Date";
pub const NODE_PROTOTYPE: &str = "HopObject";

/// Prototype objects by type name
#[derive(Debug, Default, Clone)]
pub struct PrototypeRegistry {
    prototypes: HashMap<String, ObjectHandle>,
    order: Vec<String>,
}

impl PrototypeRegistry {
    pub fn get(&self, name: &str) -> Option<ObjectHandle> {
        self.prototypes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prototypes.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, prototype: ObjectHandle) {
        if self.prototypes.insert(name.to_string(), prototype).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

pub struct Evaluator {
    global: ObjectHandle,
    prototypes: PrototypeRegistry,
    cache: WrapperCache,
    scope: ScopeChain,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        let object_proto = ObjectHandle::new(ScriptObject::new(OBJECT_PROTOTYPE, ObjectKind::Plain, None));
        let mut prototypes = PrototypeRegistry::default();
        prototypes.insert(OBJECT_PROTOTYPE, object_proto.clone());
        for name in [FUNCTION_PROTOTYPE, ARRAY_PROTOTYPE, DATE_PROTOTYPE, NODE_PROTOTYPE] {
            let proto = ObjectHandle::new(ScriptObject::new(name, ObjectKind::Plain, Some(object_proto.clone())));
            prototypes.insert(name, proto);
        }
        let global = ObjectHandle::new(ScriptObject::new("global", ObjectKind::Plain, Some(object_proto)));
        let mut evaluator = Self {
            scope: ScopeChain::new(global.clone()),
            global,
            prototypes,
            cache: WrapperCache::new(),
        };
        evaluator.install_builtins();
        evaluator
    }

    pub fn global(&self) -> &ObjectHandle {
        &self.global
    }

    pub fn prototypes(&self) -> &PrototypeRegistry {
        &self.prototypes
    }

    pub fn cache(&self) -> &WrapperCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut WrapperCache {
        &mut self.cache
    }

    pub fn prototype(&self, name: &str) -> ScriptResult<ObjectHandle> {
        self.prototypes.get(name).ok_or_else(|| ScriptError::NoSuchPrototype(name.to_string()))
    }

    fn builtin(&self, name: &str) -> Option<ObjectHandle> {
        self.prototypes.get(name)
    }

    /// Register a named prototype inheriting from `parent` (`Object` when `None`)
    ///
    /// Redefining a name returns the existing prototype, relinked to `parent`.
    pub fn define_prototype(&mut self, name: &str, parent: Option<&str>) -> ScriptResult<ObjectHandle> {
        let parent = self.prototype(parent.unwrap_or(OBJECT_PROTOTYPE))?;
        if let Some(existing) = self.prototypes.get(name) {
            existing.set_prototype(Some(parent))?;
            return Ok(existing);
        }
        let proto = ObjectHandle::new(ScriptObject::new(name, ObjectKind::Plain, Some(parent)));
        debug!("defined prototype {}", name);
        self.prototypes.insert(name, proto.clone());
        Ok(proto)
    }

    // ============================================================================
    // OBJECT CREATION
    // ============================================================================

    pub fn create_object(&self) -> ObjectHandle {
        ObjectHandle::plain(self.builtin(OBJECT_PROTOTYPE))
    }

    /// Plain object inheriting from the named prototype
    pub fn create_instance(&self, prototype: &str) -> ScriptResult<ObjectHandle> {
        let proto = self.prototype(prototype)?;
        Ok(ObjectHandle::new(ScriptObject::new(prototype, ObjectKind::Plain, Some(proto))))
    }

    pub fn create_array(&self, values: Vec<ScriptValue>) -> ObjectHandle {
        self.create_array_from(ArrayElements::from_values(values))
    }

    fn create_array_from(&self, elements: ArrayElements) -> ObjectHandle {
        ObjectHandle::new(ScriptObject::new("Array", ObjectKind::Array(elements), self.builtin(ARRAY_PROTOTYPE)))
    }

    pub fn create_date(&self, millis: f64) -> ObjectHandle {
        ObjectHandle::new(ScriptObject::new("Date", ObjectKind::Date(millis), self.builtin(DATE_PROTOTYPE)))
    }

    pub fn create_function<F>(&self, name: &str, arity: usize, call: F) -> ObjectHandle
    where
        F: Fn(&mut Evaluator, &ScriptValue, &[ScriptValue]) -> ScriptResult<ScriptValue> + 'static,
    {
        let function = ObjectHandle::new(ScriptObject::new(
            "Function",
            ObjectKind::Function(FunctionObject::new(name, arity, call)),
            self.builtin(FUNCTION_PROTOTYPE),
        ));
        function.define_read_only("length", ScriptValue::Number(arity as f64));
        function
    }

    /// Attach a native function to `target` as a hidden property
    pub fn define_function<F>(&self, target: &ObjectHandle, name: &str, arity: usize, call: F)
    where
        F: Fn(&mut Evaluator, &ScriptValue, &[ScriptValue]) -> ScriptResult<ScriptValue> + 'static,
    {
        let function = self.create_function(name, arity, call);
        target.define_hidden(name, ScriptValue::Object(function));
    }

    /// Instantiate the named type: built-ins build their own kind of object,
    /// other prototypes get a plain instance passed to their `constructor`
    pub fn construct(&mut self, name: &str, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        let object = match name {
            OBJECT_PROTOTYPE => self.create_object(),
            ARRAY_PROTOTYPE => match args {
                [ScriptValue::Number(n)] => {
                    let length = to_array_length(*n)
                        .ok_or_else(|| ScriptError::RangeError(format!("invalid array length {}", n)))?;
                    self.create_array_from(ArrayElements::with_length(length))
                }
                _ => self.create_array(args.to_vec()),
            },
            DATE_PROTOTYPE => match args.first() {
                Some(value) => self.create_date(value.to_number()),
                None => self.create_date(now_millis()),
            },
            NODE_PROTOTYPE => self.wrap_node(Node::new("").shared()),
            other => {
                let proto = self.prototype(other)?;
                if self.inherits_node(&proto) {
                    self.wrap_node(Node::new("").with_prototype(other).shared())
                } else {
                    self.create_instance(other)?
                }
            }
        };
        let constructor = object.prototype().and_then(|proto| proto.own("constructor"));
        if let Some(ctor @ ScriptValue::Object(_)) = constructor {
            let is_builtin = matches!(name, OBJECT_PROTOTYPE | ARRAY_PROTOTYPE | DATE_PROTOTYPE | NODE_PROTOTYPE);
            if !is_builtin {
                self.call(&ctor, &ScriptValue::Object(object.clone()), args)?;
            }
        }
        Ok(ScriptValue::Object(object))
    }

    fn inherits_node(&self, proto: &ObjectHandle) -> bool {
        let Some(node_proto) = self.builtin(NODE_PROTOTYPE) else {
            return false;
        };
        let mut cursor = Some(proto.clone());
        while let Some(current) = cursor {
            if current.ptr_eq(&node_proto) {
                return true;
            }
            cursor = current.prototype();
        }
        false
    }

    // ============================================================================
    // HOST VALUES
    // ============================================================================

    /// Script view of a host value; identity-bearing values are wrapped once
    /// per evaluator and the same wrapper is returned afterwards
    pub fn wrap(&mut self, value: HostValue) -> ScriptValue {
        match value {
            HostValue::Null => ScriptValue::Null,
            HostValue::Boolean(b) => ScriptValue::Boolean(b),
            HostValue::Integer(i) => ScriptValue::Number(i as f64),
            HostValue::Number(n) => ScriptValue::Number(n),
            HostValue::String(s) => ScriptValue::String(s),
            HostValue::Date(ms) => ScriptValue::Object(self.create_date(ms as f64)),
            HostValue::Script(handle) => ScriptValue::Object(handle),
            other => match (other.identity(), HostBinding::for_host(&other)) {
                (Some(identity), Some(binding)) => ScriptValue::Object(self.wrap_binding(identity, binding)),
                _ => ScriptValue::Undefined,
            },
        }
    }

    pub fn wrap_node(&mut self, node: NodeRef) -> ObjectHandle {
        let identity = Rc::as_ptr(&node) as *const () as usize;
        self.wrap_binding(identity, HostBinding::for_node(node))
    }

    fn wrap_binding(&mut self, identity: usize, binding: HostBinding) -> ObjectHandle {
        let fallback = match binding {
            HostBinding::Node(_) => NODE_PROTOTYPE,
            HostBinding::List(_) => ARRAY_PROTOTYPE,
            _ => OBJECT_PROTOTYPE,
        };
        let proto = binding
            .store()
            .prototype_name()
            .and_then(|name| self.prototypes.get(&name))
            .or_else(|| self.prototypes.get(fallback));
        self.cache.get_or_insert_with(identity, || {
            ObjectHandle::new(ScriptObject::new(binding.class_name(), ObjectKind::Wrapper(binding), proto))
        })
    }

    /// Host view of a script value; wrappers give back what they wrap
    ///
    /// Script arrays become fresh host lists. An array reached again while it
    /// is converted maps to the list already built for it, and arrays with
    /// more than `MAX_MATERIALIZED_HOLES` holes are refused.
    pub fn to_host(&self, value: &ScriptValue) -> ScriptResult<HostValue> {
        self.to_host_tracked(value, &mut HashMap::new())
    }

    fn to_host_tracked(&self, value: &ScriptValue, lists: &mut HashMap<usize, ListRef>) -> ScriptResult<HostValue> {
        Ok(match value {
            ScriptValue::Undefined | ScriptValue::Null => HostValue::Null,
            ScriptValue::Boolean(b) => HostValue::Boolean(*b),
            ScriptValue::Number(n) => HostValue::Number(*n),
            ScriptValue::String(s) => HostValue::String(s.clone()),
            ScriptValue::Object(handle) => {
                if let Some(list) = lists.get(&handle.id()) {
                    return Ok(HostValue::List(list.clone()));
                }
                let object = handle.borrow();
                match &object.kind {
                    ObjectKind::Wrapper(binding) => binding.host_value(),
                    ObjectKind::Date(ms) => HostValue::Date(*ms as i64),
                    ObjectKind::Array(elements) => {
                        let values = elements.to_dense().ok_or_else(|| {
                            ScriptError::RangeError(format!(
                                "array of length {} is too sparse for a host list",
                                elements.len()
                            ))
                        })?;
                        let list: ListRef = Rc::new(RefCell::new(Vec::with_capacity(values.len())));
                        lists.insert(handle.id(), list.clone());
                        for value in &values {
                            let item = self.to_host_tracked(value, lists)?;
                            list.borrow_mut().push(item);
                        }
                        HostValue::List(list)
                    }
                    ObjectKind::Plain | ObjectKind::Function(_) => HostValue::Script(handle.clone()),
                }
            }
        })
    }

    // ============================================================================
    // CALLS AND SCOPES
    // ============================================================================

    pub fn call(&mut self, function: &ScriptValue, this: &ScriptValue, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        let callable = match function {
            ScriptValue::Object(handle) => match &handle.borrow().kind {
                ObjectKind::Function(f) => Some(f.call.clone()),
                _ => None,
            },
            _ => None,
        };
        match callable {
            Some(call) => call(self, this, args),
            None => Err(ScriptError::NotAFunction(function.to_script_string())),
        }
    }

    pub fn push_scope(&mut self, scope: ObjectHandle) {
        self.scope.push(scope);
    }

    pub fn pop_scope(&mut self) -> Option<ObjectHandle> {
        self.scope.pop()
    }

    pub fn scope_depth(&self) -> usize {
        self.scope.depth()
    }

    /// Resolve an identifier along the scope chain
    pub fn lookup(&mut self, name: &str) -> ScriptResult<ScriptValue> {
        for scope in self.scope.innermost_first() {
            if self.has_property(&scope, name)? {
                return self.get(&scope, name);
            }
        }
        Err(ScriptError::ReferenceError(name.to_string()))
    }

    /// Assign to the innermost scope that has `name`, else to the global object
    pub fn assign(&mut self, name: &str, value: ScriptValue) -> ScriptResult<()> {
        for scope in self.scope.innermost_first() {
            if self.has_property(&scope, name)? {
                return self.put(&scope, name, value);
            }
        }
        let global = self.global.clone();
        self.put(&global, name, value)
    }

    /// Declare `name` in the innermost scope
    pub fn declare(&mut self, name: &str, value: ScriptValue) {
        if let Some(scope) = self.scope.innermost_first().first() {
            scope.define(name, value);
        }
    }

    // ============================================================================
    // BUILT-INS
    // ============================================================================

    fn install_builtins(&mut self) {
        let global = self.global.clone();
        global.define_read_only("NaN", ScriptValue::Number(f64::NAN));
        global.define_read_only("Infinity", ScriptValue::Number(f64::INFINITY));
        global.define_read_only("undefined", ScriptValue::Undefined);

        for name in [OBJECT_PROTOTYPE, FUNCTION_PROTOTYPE, ARRAY_PROTOTYPE, DATE_PROTOTYPE, NODE_PROTOTYPE] {
            let Some(proto) = self.builtin(name) else { continue };
            let type_name = name.to_string();
            let constructor =
                self.create_function(name, 1, move |rt: &mut Evaluator, _this: &ScriptValue, args: &[ScriptValue]| {
                    rt.construct(&type_name, args)
                });
            constructor.define_read_only("prototype", ScriptValue::Object(proto.clone()));
            proto.define_hidden("constructor", ScriptValue::Object(constructor.clone()));
            global.define_hidden(name, ScriptValue::Object(constructor));
        }

        if let Some(proto) = self.builtin(OBJECT_PROTOTYPE) {
            self.define_function(&proto, "toString", 0, |_, this, _| Ok(ScriptValue::String(this.to_script_string())));
            self.define_function(&proto, "valueOf", 0, |_, this, _| Ok(this.clone()));
            self.define_function(&proto, "hasOwnProperty", 1, |_, this, args| {
                let name = argument(args, 0).to_script_string();
                Ok(ScriptValue::Boolean(this.as_object().map(|o| o.has_own(&name)).unwrap_or(false)))
            });
        }
        if let Some(proto) = self.builtin(FUNCTION_PROTOTYPE) {
            self.define_function(&proto, "call", 1, |rt, this, args| {
                let receiver = argument(args, 0);
                let rest = args.get(1..).unwrap_or(&[]);
                rt.call(this, &receiver, rest)
            });
        }
        if let Some(proto) = self.builtin(ARRAY_PROTOTYPE) {
            self.define_function(&proto, "push", 1, |rt, this, args| {
                let target = this_object(this, "push")?;
                if let ObjectKind::Array(elements) = &mut target.borrow_mut().kind {
                    for value in args {
                        if !elements.push(value.clone()) {
                            return Err(ScriptError::RangeError("array length would exceed 2^32 - 1".to_string()));
                        }
                    }
                    return Ok(ScriptValue::Number(elements.len() as f64));
                }
                let mut len = rt
                    .length_of(&target)
                    .ok_or_else(|| ScriptError::TypeError("push called on a non-array".to_string()))?;
                for value in args {
                    rt.put_index(&target, len, value.clone())?;
                    len += 1;
                }
                Ok(ScriptValue::Number(len as f64))
            });
            self.define_function(&proto, "join", 1, |rt, this, args| {
                let target = this_object(this, "join")?;
                let separator = match argument(args, 0) {
                    ScriptValue::Undefined => ",".to_string(),
                    other => other.to_script_string(),
                };
                if target.is_array() {
                    return Ok(ScriptValue::String(target.join_elements(&separator)?));
                }
                let len = rt
                    .length_of(&target)
                    .ok_or_else(|| ScriptError::TypeError("join called on a non-array".to_string()))?;
                let mut parts = Vec::with_capacity(len);
                for index in 0..len {
                    let value = rt.get_index(&target, index)?;
                    parts.push(if value.is_nullish() { String::new() } else { value.to_script_string() });
                }
                Ok(ScriptValue::String(parts.join(&separator)))
            });
        }
        if let Some(proto) = self.builtin(DATE_PROTOTYPE) {
            self.define_function(&proto, "getTime", 0, |_, this, _| {
                let date = this_object(this, "getTime")?;
                let object = date.borrow();
                match &object.kind {
                    ObjectKind::Date(ms) => Ok(ScriptValue::Number(*ms)),
                    _ => Err(ScriptError::TypeError("getTime called on a non-date".to_string())),
                }
            });
        }
        if let Some(proto) = self.builtin(NODE_PROTOTYPE) {
            self.define_function(&proto, "add", 1, |rt, this, args| {
                let node = this_object(this, "add")?;
                let len = rt.length_of(&node).unwrap_or(0);
                rt.put_index(&node, len, argument(args, 0))?;
                Ok(ScriptValue::Boolean(true))
            });
            self.define_function(&proto, "count", 0, |rt, this, _| {
                let node = this_object(this, "count")?;
                Ok(ScriptValue::Number(rt.length_of(&node).unwrap_or(0) as f64))
            });
            self.define_function(&proto, "get", 1, |rt, this, args| {
                let node = this_object(this, "get")?;
                match argument(args, 0) {
                    ScriptValue::Number(n) if n >= 0.0 && n.fract() == 0.0 => rt.get_index(&node, n as usize),
                    other => rt.get(&node, &other.to_script_string()),
                }
            });
        }
    }
}

fn this_object(this: &ScriptValue, method: &str) -> ScriptResult<ObjectHandle> {
    this.as_object()
        .cloned()
        .ok_or_else(|| ScriptError::TypeError(format!("{} called on {}", method, this.type_of())))
}

fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prototypes_are_registered() {
        let rt = Evaluator::new();
        assert_eq!(rt.prototypes().names(), ["Object", "Function", "Array", "Date", "HopObject"]);
        assert!(matches!(rt.prototype("Nope"), Err(ScriptError::NoSuchPrototype(_))));
        assert!(rt.enumerate(rt.global()).is_empty());
    }

    #[test]
    fn test_scope_chain_resolution() {
        let mut rt = Evaluator::new();
        rt.assign("x", 1.into()).unwrap();
        let local = rt.create_object();
        rt.push_scope(local.clone());
        rt.declare("x", 2.into());
        assert_eq!(rt.lookup("x").unwrap().to_number(), 2.0);
        rt.assign("x", 3.into()).unwrap();
        assert_eq!(local.own("x").unwrap().to_number(), 3.0);
        rt.pop_scope();
        assert_eq!(rt.lookup("x").unwrap().to_number(), 1.0);
        assert!(matches!(rt.lookup("y"), Err(ScriptError::ReferenceError(_))));
        assert!(rt.lookup("Array").unwrap().as_object().unwrap().is_function());
    }

    #[test]
    fn test_user_prototype_constructor() {
        let mut rt = Evaluator::new();
        let point = rt.define_prototype("Point", None).unwrap();
        rt.define_function(&point, "constructor", 2, |rt, this, args| {
            let target = this_object(this, "Point")?;
            rt.put(&target, "x", argument(args, 0))?;
            rt.put(&target, "y", argument(args, 1))?;
            Ok(ScriptValue::Undefined)
        });
        let p = rt.construct("Point", &[1.into(), 2.into()]).unwrap();
        let p = p.as_object().unwrap();
        assert_eq!(rt.enumerate(p), vec!["x", "y"]);
        assert_eq!(p.class_name(), "Point");
    }

    #[test]
    fn test_array_builtins() {
        let mut rt = Evaluator::new();
        let array = rt.construct("Array", &[1.into(), "b".into()]).unwrap();
        let handle = array.as_object().unwrap().clone();
        rt.invoke(&handle, "push", &[3.into()]).unwrap();
        let joined = rt.invoke(&handle, "join", &["-".into()]).unwrap();
        assert_eq!(joined.to_script_string(), "1-b-3");
        assert!(matches!(rt.invoke(&handle, "nothing", &[]), Err(ScriptError::NotAFunction(_))));
    }

    #[test]
    fn test_user_prototype_inheriting_from_node() {
        let mut rt = Evaluator::new();
        rt.define_prototype("Story", Some(NODE_PROTOTYPE)).unwrap();
        let story = rt.construct("Story", &[]).unwrap();
        let story = story.as_object().unwrap().clone();
        assert!(story.binding().is_some());
        rt.put(&story, "title", "Hi".into()).unwrap();
        let node = match story.binding() {
            Some(HostBinding::Node(w)) => w.node().clone(),
            _ => panic!("expected a node wrapper"),
        };
        assert_eq!(node.borrow().prototype(), Some("Story"));
        assert!(node.borrow().get("title").is_some());
    }

    #[test]
    fn test_array_constructor_length() {
        let mut rt = Evaluator::new();
        let sized = rt.construct("Array", &[ScriptValue::Number(4294967295.0)]).unwrap();
        let sized = sized.as_object().unwrap().clone();
        assert_eq!(rt.length_of(&sized), Some(4294967295));
        assert!(rt.enumerate(&sized).is_empty());
        assert!(matches!(rt.to_host(&ScriptValue::Object(sized)), Err(ScriptError::RangeError(_))));
        for bad in [1e15, -1.0, 2.5, f64::NAN] {
            assert!(matches!(rt.construct("Array", &[ScriptValue::Number(bad)]), Err(ScriptError::RangeError(_))));
        }
        let single = rt.construct("Array", &["7".into()]).unwrap();
        assert_eq!(rt.length_of(single.as_object().unwrap()), Some(1));
        let holes = rt.construct("Array", &[3.into()]).unwrap();
        assert_eq!(holes.to_script_string(), ",,");
    }
}
