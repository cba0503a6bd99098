//! Script object runtime
//!
//! Prototype-chain objects, the property protocol every object kind shares,
//! wrappers that proxy host stores into the script world, and the global
//! environment that owns prototypes, scopes and the wrapper identity cache.

pub mod array;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod host;
pub mod object;
mod protocol;
pub mod scope;
pub mod value;
pub mod wrapper;

pub use array::{ArrayElements, MAX_ARRAY_INDEX};
pub use cache::WrapperCache;
pub use error::{ScriptError, ScriptResult};
pub use evaluator::{Evaluator, PrototypeRegistry};
pub use function::{FunctionObject, NativeFn};
pub use host::{
    Bean, BeanError, HostMap, HostValue, ListRef, Node, NodeError, NodeProperty, NodeState, PathElement,
};
pub use object::{ObjectHandle, ObjectKind, Property, PropertyMap, ScriptObject};
pub use scope::ScopeChain;
pub use value::ScriptValue;
pub use wrapper::{HostBinding, HostStore, PutPolicy, StorePut};
