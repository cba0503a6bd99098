//! Wrapper variants: script objects proxying onto host stores
//!
//! Each variant implements [`HostStore`]; the property protocol consults the
//! store after the own properties and the prototype chain. What happens when
//! a store refuses a write is the variant's [`PutPolicy`].

mod bean;
mod generic;
mod list;
mod map;
mod node;

pub use bean::BeanWrapper;
pub use generic::GenericWrapper;
pub use list::ListWrapper;
pub use map::MapWrapper;
pub use node::NodeWrapper;

use super::error::ScriptResult;
use super::host::{HostValue, NodeRef};

/// Reaction to a write the backing store refuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutPolicy {
    /// Raise a read-only error
    Throw,
    /// Drop the write silently
    Ignore,
    /// Keep the value as an own property of the wrapper
    Delegate,
}

/// Outcome of offering a write to a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePut {
    Stored,
    /// The store owns the name but it is not writable
    Rejected,
    /// The store has no slot for this name or value; it becomes an own property
    NotHandled,
}

/// Backing store of a wrapper variant
pub trait HostStore {
    fn put_policy(&self) -> PutPolicy;

    fn get(&self, name: &str) -> ScriptResult<Option<HostValue>>;

    fn put(&self, name: &str, value: HostValue) -> ScriptResult<StorePut>;

    /// Remove `name` from the store if it supports removal
    fn delete(&self, name: &str) -> ScriptResult<bool>;

    /// Enumerable names, in the store's order
    fn keys(&self) -> Vec<String>;

    fn get_index(&self, _index: usize) -> ScriptResult<Option<HostValue>> {
        Ok(None)
    }

    fn put_index(&self, _index: usize, _value: HostValue) -> ScriptResult<StorePut> {
        Ok(StorePut::NotHandled)
    }

    /// Element count for indexed stores
    fn len(&self) -> Option<usize> {
        None
    }

    /// Host method call; `None` when the store has no such method
    fn invoke(&self, _name: &str, _args: &[HostValue]) -> Option<ScriptResult<HostValue>> {
        None
    }

    /// Script prototype wrapped objects of this store should inherit from
    fn prototype_name(&self) -> Option<String> {
        None
    }

    fn describe(&self) -> String;
}

/// The host store behind a wrapper object
#[derive(Clone)]
pub enum HostBinding {
    Bean(BeanWrapper),
    Map(MapWrapper),
    Generic(GenericWrapper),
    Node(NodeWrapper),
    List(ListWrapper),
}

impl HostBinding {
    /// Binding for host values that carry identity
    pub fn for_host(value: &HostValue) -> Option<Self> {
        Some(match value {
            HostValue::Bean(bean) => HostBinding::Bean(BeanWrapper::new(bean.clone())),
            HostValue::Map(map) => HostBinding::Map(MapWrapper::new(map.clone())),
            HostValue::Element(element) => HostBinding::Generic(GenericWrapper::new(element.clone())),
            HostValue::Node(node) => HostBinding::Node(NodeWrapper::new(node.clone())),
            HostValue::List(list) => HostBinding::List(ListWrapper::new(list.clone())),
            _ => return None,
        })
    }

    pub fn for_node(node: NodeRef) -> Self {
        HostBinding::Node(NodeWrapper::new(node))
    }

    pub fn store(&self) -> &dyn HostStore {
        match self {
            HostBinding::Bean(w) => w,
            HostBinding::Map(w) => w,
            HostBinding::Generic(w) => w,
            HostBinding::Node(w) => w,
            HostBinding::List(w) => w,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            HostBinding::Bean(_) => "bean",
            HostBinding::Map(_) => "map",
            HostBinding::Generic(_) => "generic",
            HostBinding::Node(_) => "node",
            HostBinding::List(_) => "list",
        }
    }

    /// Class name of the wrapper object
    pub fn class_name(&self) -> &'static str {
        match self {
            HostBinding::Bean(_) => "JavaBean",
            HostBinding::Map(_) => "Map",
            HostBinding::Generic(_) => "PathElement",
            HostBinding::Node(_) => "HopObject",
            HostBinding::List(_) => "List",
        }
    }

    /// The wrapped host value
    pub fn host_value(&self) -> HostValue {
        match self {
            HostBinding::Bean(w) => HostValue::Bean(w.bean().clone()),
            HostBinding::Map(w) => HostValue::Map(w.map().clone()),
            HostBinding::Generic(w) => HostValue::Element(w.element().clone()),
            HostBinding::Node(w) => HostValue::Node(w.node().clone()),
            HostBinding::List(w) => HostValue::List(w.list().clone()),
        }
    }

    pub fn describe(&self) -> String {
        self.store().describe()
    }
}
