//! Property protocol across plain objects, prototypes and every wrapper variant

mod common;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use fesi::runtime::{
    Bean, BeanError, Evaluator, HostMap, HostValue, Node, NodeProperty, NodeState, PathElement, ScriptError,
    ScriptValue,
};

struct Point {
    x: i64,
    y: i64,
}

impl Bean for Point {
    fn class_name(&self) -> &str {
        "demo.Point"
    }

    fn property_names(&self) -> Vec<String> {
        vec!["x".to_string(), "y".to_string(), "norm".to_string()]
    }

    fn get_property(&self, name: &str) -> Option<HostValue> {
        match name {
            "x" => Some(HostValue::Integer(self.x)),
            "y" => Some(HostValue::Integer(self.y)),
            "norm" => Some(HostValue::Integer(self.x.abs() + self.y.abs())),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: HostValue) -> Result<(), BeanError> {
        let n = match value {
            HostValue::Integer(n) => n,
            HostValue::Number(n) if n.fract() == 0.0 => n as i64,
            other => return Err(BeanError::TypeMismatch { expected: "integer", found: other.kind() }),
        };
        match name {
            "x" => self.x = n,
            "y" => self.y = n,
            "norm" => return Err(BeanError::ReadOnly),
            _ => return Err(BeanError::NoSuchProperty),
        }
        Ok(())
    }

    fn is_read_only(&self, name: &str) -> bool {
        name == "norm"
    }

    fn invoke(&mut self, name: &str, args: &[HostValue]) -> Option<Result<HostValue, BeanError>> {
        match (name, args) {
            ("scale", [HostValue::Number(k)]) => {
                self.x = (self.x as f64 * k) as i64;
                self.y = (self.y as f64 * k) as i64;
                Some(Ok(HostValue::Null))
            }
            _ => None,
        }
    }
}

struct Directory {
    name: String,
    parent: Option<Rc<Directory>>,
}

impl PathElement for Directory {
    fn element_name(&self) -> String {
        self.name.clone()
    }

    fn child_element(&self, name: &str) -> Option<HostValue> {
        name.strip_prefix("file_").map(|rest| HostValue::String(format!("{}/{}", self.name, rest)))
    }

    fn parent_element(&self) -> Option<HostValue> {
        self.parent.clone().map(|p| HostValue::Element(p))
    }
}

#[test]
fn test_lookup_precedence_and_undefined() {
    common::init_logger();
    let mut rt = Evaluator::new();
    let base = rt.define_prototype("Base", None).unwrap();
    base.define("greeting", ScriptValue::from("hello"));
    let object = rt.create_instance("Base").unwrap();

    assert_eq!(rt.get(&object, "greeting").unwrap().to_script_string(), "hello");
    rt.put(&object, "greeting", ScriptValue::from("own")).unwrap();
    assert_eq!(rt.get(&object, "greeting").unwrap().to_script_string(), "own");
    assert_eq!(base.own("greeting").unwrap().to_script_string(), "hello");
    assert!(rt.get(&object, "missing").unwrap().is_undefined());

    // delete never reaches the prototype
    assert!(rt.delete(&object, "greeting").unwrap());
    assert!(!rt.delete(&object, "greeting").unwrap());
    assert_eq!(rt.get(&object, "greeting").unwrap().to_script_string(), "hello");
}

#[test]
fn test_enumeration_skips_hidden_and_inherited() {
    let mut rt = Evaluator::new();
    let object = rt.create_object();
    rt.put(&object, "b", ScriptValue::from(1)).unwrap();
    rt.put(&object, "a", ScriptValue::from(2)).unwrap();
    object.define_hidden("secret", ScriptValue::from(3));
    rt.put(&object, "c", ScriptValue::from(4)).unwrap();
    assert_eq!(rt.enumerate(&object), vec!["b", "a", "c"]);
    assert!(rt.has_property(&object, "toString").unwrap());
    assert!(!rt.enumerate(&object).contains(&"toString".to_string()));
}

#[test]
fn test_read_only_globals_and_prototype_cycle() {
    let mut rt = Evaluator::new();
    let global = rt.global().clone();
    rt.put(&global, "NaN", ScriptValue::from(1)).unwrap();
    assert!(rt.get(&global, "NaN").unwrap().to_number().is_nan());

    let a = rt.define_prototype("A", None).unwrap();
    let b = rt.define_prototype("B", Some("A")).unwrap();
    assert!(matches!(a.set_prototype(Some(b)), Err(ScriptError::PrototypeCycle(_))));
}

#[test]
fn test_arrays_use_the_indexed_protocol() {
    let mut rt = Evaluator::new();
    let array = rt.create_array(vec![ScriptValue::from(1), ScriptValue::from(2)]);
    rt.put_index(&array, 4, ScriptValue::from("x")).unwrap();
    assert_eq!(rt.length_of(&array), Some(5));
    assert!(rt.get(&array, "3").unwrap().is_undefined());
    assert_eq!(rt.get(&array, "4").unwrap().to_script_string(), "x");
    rt.put(&array, "length", ScriptValue::from(1)).unwrap();
    assert_eq!(rt.get(&array, "length").unwrap().to_number(), 1.0);

    let joined = rt.invoke(&array, "join", &[ScriptValue::from("-")]).unwrap();
    assert_eq!(joined.to_script_string(), "1");
}

#[test]
fn test_map_wrapper_ignores_read_only_writes() {
    let mut rt = Evaluator::new();
    let mut entries = BTreeMap::new();
    entries.insert("mode".to_string(), HostValue::from("fast"));
    let frozen = HostMap::read_only(entries).shared();
    let wrapped = rt.wrap(HostValue::Map(frozen.clone()));
    let object = wrapped.as_object().unwrap().clone();

    rt.put(&object, "mode", ScriptValue::from("slow")).unwrap();
    assert_eq!(rt.get(&object, "mode").unwrap().to_script_string(), "fast");
    assert_eq!(frozen.borrow().get("mode").map(|v| v.kind()), Some("string"));

    let open = HostMap::new().shared();
    let object = rt.wrap(HostValue::Map(open.clone())).as_object().unwrap().clone();
    rt.put(&object, "count", ScriptValue::from(3)).unwrap();
    assert!(matches!(open.borrow().get("count"), Some(HostValue::Number(n)) if *n == 3.0));
    assert_eq!(rt.enumerate(&object), vec!["count"]);
    assert!(rt.delete(&object, "count").unwrap());
    assert!(open.borrow().is_empty());
}

#[test]
fn test_bean_wrapper_raises_on_read_only() {
    let mut rt = Evaluator::new();
    let bean: Rc<RefCell<dyn Bean>> = Rc::new(RefCell::new(Point { x: 3, y: -4 }));
    let object = rt.wrap(HostValue::Bean(bean.clone())).as_object().unwrap().clone();

    assert_eq!(rt.get(&object, "norm").unwrap().to_number(), 7.0);
    rt.put(&object, "x", ScriptValue::from(10)).unwrap();
    assert_eq!(rt.get(&object, "norm").unwrap().to_number(), 14.0);

    assert!(matches!(rt.put(&object, "norm", ScriptValue::from(1)), Err(ScriptError::ReadOnly { .. })));
    assert!(matches!(
        rt.put(&object, "y", ScriptValue::from("wide")),
        Err(ScriptError::Bean { source: BeanError::TypeMismatch { .. }, .. })
    ));

    // Unknown names become expando properties on the wrapper
    rt.put(&object, "tag", ScriptValue::from("p")).unwrap();
    assert!(object.has_own("tag"));

    rt.invoke(&object, "scale", &[ScriptValue::from(2)]).unwrap();
    assert_eq!(rt.get(&object, "x").unwrap().to_number(), 20.0);
    assert!(matches!(rt.invoke(&object, "rotate", &[]), Err(ScriptError::NotAFunction(_))));
}

#[test]
fn test_generic_wrapper_delegates_writes() {
    let mut rt = Evaluator::new();
    let root = Rc::new(Directory { name: "root".to_string(), parent: None });
    let docs: Rc<dyn PathElement> = Rc::new(Directory { name: "docs".to_string(), parent: Some(root) });
    let object = rt.wrap(HostValue::Element(docs)).as_object().unwrap().clone();

    assert_eq!(rt.get(&object, "_name").unwrap().to_script_string(), "docs");
    assert_eq!(rt.get(&object, "file_a").unwrap().to_script_string(), "docs/a");
    let parent = rt.get(&object, "_parent").unwrap();
    let parent = parent.as_object().unwrap().clone();
    assert_eq!(rt.get(&parent, "_name").unwrap().to_script_string(), "root");

    rt.put(&object, "file_a", ScriptValue::from("shadow")).unwrap();
    assert_eq!(rt.get(&object, "file_a").unwrap().to_script_string(), "shadow");
}

#[test]
fn test_node_wrapper_identity_and_subnodes() {
    let mut rt = Evaluator::new();
    let story = Node::persisted("7", "story").shared();
    let first = rt.wrap(HostValue::Node(story.clone()));
    let second = rt.wrap(HostValue::Node(story.clone()));
    assert!(first.strict_equals(&second));
    let object = first.as_object().unwrap().clone();

    rt.put(&object, "title", ScriptValue::from("Hi")).unwrap();
    assert!(matches!(story.borrow().get("title"), Some(NodeProperty::String(s)) if s == "Hi"));
    assert_eq!(story.borrow().state(), NodeState::Modified);

    story.borrow_mut().declare_read_only("author");
    assert!(matches!(rt.put(&object, "author", ScriptValue::from("x")), Err(ScriptError::ReadOnly { .. })));
    assert!(matches!(rt.put(&object, "_id", ScriptValue::from("8")), Err(ScriptError::ReadOnly { .. })));

    let comment = Node::new("comment").shared();
    let comment_value = rt.wrap(HostValue::Node(comment.clone()));
    rt.put_index(&object, 0, comment_value.clone()).unwrap();
    assert_eq!(rt.length_of(&object), Some(1));
    assert!(rt.get_index(&object, 0).unwrap().strict_equals(&comment_value));
    let parent = rt.get(comment_value.as_object().unwrap(), "_parent").unwrap();
    assert!(parent.strict_equals(&first));

    assert!(matches!(
        rt.put_index(&object, 1, ScriptValue::from("text")),
        Err(ScriptError::IndexedPutType { index: 1, expected: "node", .. })
    ));
    assert!(matches!(rt.put_index(&object, 5, comment_value), Err(ScriptError::Node(_))));
}

#[test]
fn test_user_prototype_over_hop_object() {
    let mut rt = Evaluator::new();
    let proto = rt.define_prototype("Story", Some("HopObject")).unwrap();
    rt.define_function(&proto, "constructor", 1, |rt, this, args| {
        let this = this.as_object().cloned().ok_or_else(|| ScriptError::TypeError("no this".to_string()))?;
        let title = args.first().cloned().unwrap_or_default();
        rt.put(&this, "title", title)?;
        Ok(ScriptValue::Undefined)
    });

    let story = rt.construct("Story", &[ScriptValue::from("Launch")]).unwrap();
    let story = story.as_object().unwrap().clone();
    assert_eq!(story.class_name(), "HopObject");
    let node = story.binding().and_then(|b| b.host_value().as_node().cloned()).unwrap();
    assert_eq!(node.borrow().prototype(), Some("Story"));
    assert!(matches!(node.borrow().get("title"), Some(NodeProperty::String(s)) if s == "Launch"));

    let child = rt.construct("HopObject", &[]).unwrap();
    rt.invoke(&story, "add", &[child]).unwrap();
    assert_eq!(rt.invoke(&story, "count", &[]).unwrap().to_number(), 1.0);
}

#[test]
fn test_host_list_wrapper_is_shared() {
    let mut rt = Evaluator::new();
    let list = Rc::new(RefCell::new(vec![HostValue::Integer(1)]));
    let first = rt.wrap(HostValue::List(list.clone()));
    let second = rt.wrap(HostValue::List(list.clone()));
    assert!(first.strict_equals(&second));
    let object = first.as_object().unwrap().clone();

    rt.put_index(&object, 0, ScriptValue::from(9)).unwrap();
    rt.invoke(&object, "push", &[ScriptValue::from("tail")]).unwrap();
    assert!(matches!(list.borrow()[0], HostValue::Number(n) if n == 9.0));
    assert_eq!(list.borrow().len(), 2);
    assert_eq!(rt.get(&object, "length").unwrap().to_number(), 2.0);
    assert_eq!(rt.invoke(&object, "join", &[ScriptValue::from("|")]).unwrap().to_script_string(), "9|tail");
    assert!(matches!(rt.put(&object, "length", ScriptValue::from(0)), Err(ScriptError::ReadOnly { .. })));
    assert!(matches!(rt.put_index(&object, 5, ScriptValue::Null), Err(ScriptError::IndexOutOfRange { .. })));

    // Handing the wrapper back to the host gives the same list
    let map = HostMap::new().shared();
    let holder = rt.wrap(HostValue::Map(map.clone())).as_object().unwrap().clone();
    rt.put(&holder, "items", first).unwrap();
    assert!(matches!(map.borrow().get("items"), Some(HostValue::List(l)) if Rc::ptr_eq(l, &list)));
}

#[test]
fn test_oversized_arrays_are_refused() {
    let mut rt = Evaluator::new();
    let array = rt.create_array(Vec::new());
    rt.put(&array, "4294967294", ScriptValue::from(1)).unwrap();
    assert_eq!(rt.length_of(&array), Some(4294967295));
    rt.put(&array, "length", ScriptValue::from(4294967295.0)).unwrap();
    assert!(matches!(rt.construct("Array", &[ScriptValue::from(1e15)]), Err(ScriptError::RangeError(_))));

    let map = HostMap::new().shared();
    let holder = rt.wrap(HostValue::Map(map.clone())).as_object().unwrap().clone();
    assert!(matches!(
        rt.put(&holder, "huge", ScriptValue::Object(array)),
        Err(ScriptError::RangeError(_))
    ));
    assert!(map.borrow().is_empty());
}
