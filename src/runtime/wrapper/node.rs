use super::{HostStore, PutPolicy, StorePut};
use crate::runtime::error::{ScriptError, ScriptResult};
use crate::runtime::host::{HostValue, Node, NodeError, NodeProperty, NodeRef};

/// Names answered by the node itself rather than by its property slots
const RESERVED: &[&str] = &["_id", "_name", "_parent"];

/// Node properties and subnodes as script properties and indices
#[derive(Clone)]
pub struct NodeWrapper {
    node: NodeRef,
}

impl NodeWrapper {
    pub fn new(node: NodeRef) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }
}

impl HostStore for NodeWrapper {
    fn put_policy(&self) -> PutPolicy {
        PutPolicy::Throw
    }

    fn get(&self, name: &str) -> ScriptResult<Option<HostValue>> {
        let node = self.node.borrow();
        Ok(match name {
            "_id" => Some(HostValue::String(node.id().to_string())),
            "_name" => Some(HostValue::String(node.name().to_string())),
            "_parent" => node.parent().map(HostValue::Node),
            _ => node.get(name).map(NodeProperty::to_host),
        })
    }

    fn put(&self, name: &str, value: HostValue) -> ScriptResult<StorePut> {
        if RESERVED.contains(&name) {
            return Ok(StorePut::Rejected);
        }
        // Functions attached at runtime live on the wrapper
        if let HostValue::Script(handle) = &value {
            if handle.is_function() {
                return Ok(StorePut::NotHandled);
            }
        }
        let mut node = self.node.borrow_mut();
        let result = match NodeProperty::from_host(value) {
            Some(property) => node.set(name, property),
            None => node.unset(name).map(|_| ()),
        };
        match result {
            Ok(()) => Ok(StorePut::Stored),
            Err(NodeError::ReadOnly { .. }) => Ok(StorePut::Rejected),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, name: &str) -> ScriptResult<bool> {
        if RESERVED.contains(&name) {
            return Err(ScriptError::ReadOnly { property: name.to_string() });
        }
        match self.node.borrow_mut().unset(name) {
            Ok(removed) => Ok(removed),
            Err(NodeError::ReadOnly { property, .. }) => Err(ScriptError::ReadOnly { property }),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.node.borrow().property_names()
    }

    fn get_index(&self, index: usize) -> ScriptResult<Option<HostValue>> {
        Ok(self.node.borrow().subnode(index).map(HostValue::Node))
    }

    fn put_index(&self, index: usize, value: HostValue) -> ScriptResult<StorePut> {
        match value {
            HostValue::Node(child) => {
                Node::set_subnode(&self.node, index, child)?;
                Ok(StorePut::Stored)
            }
            other => Err(ScriptError::IndexedPutType { index, expected: "node", found: other.kind() }),
        }
    }

    fn len(&self) -> Option<usize> {
        Some(self.node.borrow().subnode_count())
    }

    fn prototype_name(&self) -> Option<String> {
        self.node.borrow().prototype().map(str::to_string)
    }

    fn describe(&self) -> String {
        format!("HopObject {}", self.node.borrow().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_slots() {
        let wrapper = NodeWrapper::new(Node::persisted("4", "story").shared());
        assert_eq!(wrapper.put("title", "Hello".into()).unwrap(), StorePut::Stored);
        assert_eq!(wrapper.put("hits", HostValue::Number(10.0)).unwrap(), StorePut::Stored);
        assert!(matches!(wrapper.node().borrow().get("hits"), Some(NodeProperty::Integer(10))));
        assert!(matches!(wrapper.get("_id").unwrap(), Some(HostValue::String(ref s)) if s == "4"));
        assert_eq!(wrapper.keys(), vec!["title".to_string(), "hits".to_string()]);
        assert_eq!(wrapper.put("title", HostValue::Null).unwrap(), StorePut::Stored);
        assert!(wrapper.get("title").unwrap().is_none());
    }

    #[test]
    fn test_read_only_property_is_rejected() {
        let node = Node::persisted("1", "user");
        let node = node.shared();
        node.borrow_mut().declare_read_only("email");
        let wrapper = NodeWrapper::new(node);
        assert_eq!(wrapper.put("email", "x@y".into()).unwrap(), StorePut::Rejected);
        assert_eq!(wrapper.put("_id", "9".into()).unwrap(), StorePut::Rejected);
        assert!(matches!(wrapper.delete("email"), Err(ScriptError::ReadOnly { .. })));
    }

    #[test]
    fn test_indexed_put_requires_node() {
        let wrapper = NodeWrapper::new(Node::new("list").shared());
        assert_eq!(wrapper.put_index(0, HostValue::Node(Node::new("a").shared())).unwrap(), StorePut::Stored);
        assert_eq!(wrapper.len(), Some(1));
        assert!(matches!(
            wrapper.put_index(1, "text".into()),
            Err(ScriptError::IndexedPutType { index: 1, expected: "node", found: "string" })
        ));
        assert!(matches!(
            wrapper.put_index(5, HostValue::Node(Node::new("b").shared())),
            Err(ScriptError::Node(NodeError::SubnodeIndex { .. }))
        ));
    }
}
