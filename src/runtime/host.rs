//! Host-side values the script world can wrap
//!
//! Everything that carries identity (beans, maps, nodes, path elements) is
//! shared through `Rc`, and the allocation address is what the wrapper
//! cache keys on.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

use super::object::ObjectHandle;

pub type BeanRef = Rc<RefCell<dyn Bean>>;
pub type MapRef = Rc<RefCell<HostMap>>;
pub type NodeRef = Rc<RefCell<Node>>;
pub type ElementRef = Rc<dyn PathElement>;
pub type ListRef = Rc<RefCell<Vec<HostValue>>>;

/// A value living outside the script world
#[derive(Clone)]
pub enum HostValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    /// Milliseconds since the epoch
    Date(i64),
    List(ListRef),
    Map(MapRef),
    Bean(BeanRef),
    Node(NodeRef),
    Element(ElementRef),
    /// A script object handed out to the host and back
    Script(ObjectHandle),
}

impl HostValue {
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Integer(_) => "integer",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Date(_) => "date",
            HostValue::List(_) => "list",
            HostValue::Map(_) => "map",
            HostValue::Bean(_) => "bean",
            HostValue::Node(_) => "node",
            HostValue::Element(_) => "path element",
            HostValue::Script(_) => "script object",
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            HostValue::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Address of the shared allocation, for values that have identity
    pub fn identity(&self) -> Option<usize> {
        match self {
            HostValue::List(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            HostValue::Map(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            HostValue::Bean(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            HostValue::Node(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            HostValue::Element(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "Null"),
            HostValue::Boolean(b) => write!(f, "Boolean({})", b),
            HostValue::Integer(i) => write!(f, "Integer({})", i),
            HostValue::Number(n) => write!(f, "Number({})", n),
            HostValue::String(s) => write!(f, "String({:?})", s),
            HostValue::Date(ms) => write!(f, "Date({})", ms),
            HostValue::List(list) => write!(f, "List(len={})", list.borrow().len()),
            HostValue::Map(map) => write!(f, "Map(len={})", map.borrow().len()),
            HostValue::Bean(bean) => write!(f, "Bean({})", bean.borrow().class_name()),
            HostValue::Node(node) => write!(f, "Node({})", node.borrow().name()),
            HostValue::Element(element) => write!(f, "Element({})", element.element_name()),
            HostValue::Script(handle) => write!(f, "Script({:?})", handle),
        }
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Integer(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Boolean(value)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeanError {
    #[error("no such property")]
    NoSuchProperty,
    #[error("property is read-only")]
    ReadOnly,
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
    #[error("{0}")]
    Failed(String),
}

/// Reflective access to a host object's properties and methods
pub trait Bean {
    fn class_name(&self) -> &str;

    /// Readable property names in a stable order
    fn property_names(&self) -> Vec<String>;

    fn get_property(&self, name: &str) -> Option<HostValue>;

    fn set_property(&mut self, name: &str, value: HostValue) -> Result<(), BeanError>;

    fn is_read_only(&self, _name: &str) -> bool {
        false
    }

    /// `None` when the bean has no method called `name`
    fn invoke(&mut self, _name: &str, _args: &[HostValue]) -> Option<Result<HostValue, BeanError>> {
        None
    }
}

/// An object addressable by path, like a URL-mapped application object
pub trait PathElement {
    fn element_name(&self) -> String;

    fn child_element(&self, name: &str) -> Option<HostValue>;

    fn parent_element(&self) -> Option<HostValue>;

    /// Name of the script prototype that wrapped elements should use
    fn prototype_name(&self) -> Option<String> {
        None
    }
}

/// Key/value store backing a map wrapper
#[derive(Debug, Clone, Default)]
pub struct HostMap {
    entries: BTreeMap<String, HostValue>,
    read_only: bool,
}

impl HostMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only(entries: BTreeMap<String, HostValue>) -> Self {
        Self { entries, read_only: true }
    }

    pub fn shared(self) -> MapRef {
        Rc::new(RefCell::new(self))
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, value: HostValue) -> Option<HostValue> {
        self.entries.insert(key.to_string(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<HostValue> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("Property {property} of node {node} is read-only")]
    ReadOnly { node: String, property: String },
    #[error("Node {0} has been deleted")]
    Deleted(String),
    #[error("Subnode index {index} out of range for node {node} with {len} subnodes")]
    SubnodeIndex { node: String, index: usize, len: usize },
}

/// Persistence state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Never stored
    Transient,
    /// Scheduled for insertion
    New,
    /// In sync with storage
    Clean,
    /// Stored and changed since
    Modified,
    Deleted,
}

/// Typed property slot of a node
#[derive(Clone, Debug)]
pub enum NodeProperty {
    String(String),
    Boolean(bool),
    Date(i64),
    Integer(i64),
    Float(f64),
    Node(NodeRef),
    Object(HostValue),
}

impl NodeProperty {
    pub fn to_host(&self) -> HostValue {
        match self {
            NodeProperty::String(s) => HostValue::String(s.clone()),
            NodeProperty::Boolean(b) => HostValue::Boolean(*b),
            NodeProperty::Date(ms) => HostValue::Date(*ms),
            NodeProperty::Integer(i) => HostValue::Integer(*i),
            NodeProperty::Float(f) => HostValue::Number(*f),
            NodeProperty::Node(node) => HostValue::Node(node.clone()),
            NodeProperty::Object(value) => value.clone(),
        }
    }

    /// Slot for a host value; `None` for null, which clears the slot
    pub fn from_host(value: HostValue) -> Option<Self> {
        Some(match value {
            HostValue::Null => return None,
            HostValue::String(s) => NodeProperty::String(s),
            HostValue::Boolean(b) => NodeProperty::Boolean(b),
            HostValue::Date(ms) => NodeProperty::Date(ms),
            HostValue::Integer(i) => NodeProperty::Integer(i),
            HostValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => NodeProperty::Integer(n as i64),
            HostValue::Number(n) => NodeProperty::Float(n),
            HostValue::Node(node) => NodeProperty::Node(node),
            other => NodeProperty::Object(other),
        })
    }
}

/// Object-database node with typed properties and ordered subnodes
#[derive(Debug)]
pub struct Node {
    id: String,
    name: String,
    prototype: Option<String>,
    properties: Vec<(String, NodeProperty)>,
    subnodes: Vec<NodeRef>,
    parent: Option<Weak<RefCell<Node>>>,
    read_only: HashSet<String>,
    state: NodeState,
}

impl Node {
    /// A transient node that will never be stored unless made persistent
    pub fn new(name: &str) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            prototype: None,
            properties: Vec::new(),
            subnodes: Vec::new(),
            parent: None,
            read_only: HashSet::new(),
            state: NodeState::Transient,
        }
    }

    /// A node as loaded from storage
    pub fn persisted(id: &str, name: &str) -> Self {
        Self { id: id.to_string(), state: NodeState::Clean, ..Self::new(name) }
    }

    pub fn with_prototype(mut self, prototype: &str) -> Self {
        self.prototype = Some(prototype.to_string());
        self
    }

    pub fn shared(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prototype(&self) -> Option<&str> {
        self.prototype.as_deref()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Schedule a transient node for storage
    pub fn make_persistent(&mut self, id: &str) {
        if self.state == NodeState::Transient {
            self.id = id.to_string();
            self.state = NodeState::New;
        }
    }

    pub fn mark_clean(&mut self) {
        if matches!(self.state, NodeState::New | NodeState::Modified) {
            self.state = NodeState::Clean;
        }
    }

    pub fn mark_deleted(&mut self) {
        self.state = NodeState::Deleted;
    }

    /// Declare `name` as not writable from scripts
    pub fn declare_read_only(&mut self, name: &str) {
        self.read_only.insert(name.to_string());
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.read_only.contains(name)
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    fn check_writable(&self, name: &str) -> Result<(), NodeError> {
        if self.state == NodeState::Deleted {
            return Err(NodeError::Deleted(self.name.clone()));
        }
        if self.read_only.contains(name) {
            return Err(NodeError::ReadOnly { node: self.name.clone(), property: name.to_string() });
        }
        Ok(())
    }

    fn touch(&mut self) {
        if self.state == NodeState::Clean {
            self.state = NodeState::Modified;
        }
    }

    pub fn set(&mut self, name: &str, value: NodeProperty) -> Result<(), NodeError> {
        self.check_writable(name)?;
        match self.properties.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((name.to_string(), value)),
        }
        self.touch();
        Ok(())
    }

    pub fn set_string(&mut self, name: &str, value: &str) -> Result<(), NodeError> {
        self.set(name, NodeProperty::String(value.to_string()))
    }

    pub fn set_integer(&mut self, name: &str, value: i64) -> Result<(), NodeError> {
        self.set(name, NodeProperty::Integer(value))
    }

    /// Remove a property, returning whether it existed
    pub fn unset(&mut self, name: &str) -> Result<bool, NodeError> {
        self.check_writable(name)?;
        let before = self.properties.len();
        self.properties.retain(|(n, _)| n != name);
        let removed = self.properties.len() != before;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub fn subnode_count(&self) -> usize {
        self.subnodes.len()
    }

    pub fn subnode(&self, index: usize) -> Option<NodeRef> {
        self.subnodes.get(index).cloned()
    }

    pub fn subnodes(&self) -> &[NodeRef] {
        &self.subnodes
    }

    /// Append `child` to `parent`'s subnodes and link it back; returns its index
    pub fn add_node(parent: &NodeRef, child: NodeRef) -> Result<usize, NodeError> {
        let index = parent.borrow().subnode_count();
        Node::set_subnode(parent, index, child)?;
        Ok(index)
    }

    /// Replace the subnode at `index`, or append when `index` equals the count
    pub fn set_subnode(parent: &NodeRef, index: usize, child: NodeRef) -> Result<(), NodeError> {
        let evicted = {
            let mut p = parent.borrow_mut();
            if p.state == NodeState::Deleted {
                return Err(NodeError::Deleted(p.name.clone()));
            }
            let len = p.subnodes.len();
            if index > len {
                return Err(NodeError::SubnodeIndex { node: p.name.clone(), index, len });
            }
            let evicted = if index == len {
                p.subnodes.push(child.clone());
                None
            } else {
                Some(std::mem::replace(&mut p.subnodes[index], child.clone()))
            };
            p.touch();
            evicted
        };
        if let Some(old) = evicted {
            let still_linked = Rc::ptr_eq(&old, &child) || parent.borrow().subnodes.iter().any(|n| Rc::ptr_eq(n, &old));
            if !still_linked {
                old.borrow_mut().parent = None;
            }
        }
        child.borrow_mut().parent = Some(Rc::downgrade(parent));
        Ok(())
    }

    pub fn remove_subnode(&mut self, index: usize) -> Option<NodeRef> {
        if index >= self.subnodes.len() {
            return None;
        }
        let child = self.subnodes.remove(index);
        child.borrow_mut().parent = None;
        self.touch();
        Some(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_node_becomes_modified() {
        let mut node = Node::persisted("17", "page");
        assert_eq!(node.state(), NodeState::Clean);
        node.set_string("title", "Home").unwrap();
        assert_eq!(node.state(), NodeState::Modified);
        node.mark_clean();
        assert_eq!(node.state(), NodeState::Clean);
        assert!(!node.unset("missing").unwrap());
        assert_eq!(node.state(), NodeState::Clean);
    }

    #[test]
    fn test_transient_stays_transient_until_made_persistent() {
        let mut node = Node::new("draft");
        node.set_integer("count", 3).unwrap();
        assert_eq!(node.state(), NodeState::Transient);
        node.make_persistent("9");
        assert_eq!(node.state(), NodeState::New);
        node.set_integer("count", 4).unwrap();
        assert_eq!(node.state(), NodeState::New);
    }

    #[test]
    fn test_read_only_and_deleted() {
        let mut node = Node::persisted("1", "user");
        node.declare_read_only("name");
        assert!(matches!(node.set_string("name", "x"), Err(NodeError::ReadOnly { .. })));
        node.mark_deleted();
        assert!(matches!(node.set_string("other", "x"), Err(NodeError::Deleted(_))));
    }

    #[test]
    fn test_subnodes_link_parent() {
        let root = Node::persisted("0", "root").shared();
        let child = Node::new("child").shared();
        assert_eq!(Node::add_node(&root, child.clone()).unwrap(), 0);
        assert!(Rc::ptr_eq(&child.borrow().parent().unwrap(), &root));
        assert_eq!(root.borrow().state(), NodeState::Modified);
        assert!(Node::set_subnode(&root, 5, Node::new("far").shared()).is_err());
        let removed = root.borrow_mut().remove_subnode(0).unwrap();
        assert!(removed.borrow().parent().is_none());
    }

    #[test]
    fn test_replaced_subnode_is_unlinked() {
        let root = Node::new("root").shared();
        let first = Node::new("first").shared();
        let second = Node::new("second").shared();
        Node::add_node(&root, first.clone()).unwrap();
        Node::set_subnode(&root, 0, second.clone()).unwrap();
        assert!(first.borrow().parent().is_none());
        assert!(Rc::ptr_eq(&second.borrow().parent().unwrap(), &root));

        // Re-setting the same child keeps its link
        Node::set_subnode(&root, 0, second.clone()).unwrap();
        assert!(second.borrow().parent().is_some());
    }

    #[test]
    fn test_number_slots() {
        assert!(matches!(NodeProperty::from_host(HostValue::Number(3.0)), Some(NodeProperty::Integer(3))));
        assert!(matches!(NodeProperty::from_host(HostValue::Number(2.5)), Some(NodeProperty::Float(_))));
        assert!(NodeProperty::from_host(HostValue::Null).is_none());
    }
}
