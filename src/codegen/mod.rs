//! Class file generation
//!
//! Builds JVM class files in memory: a deduplicating constant pool, member
//! tables, attributes and method bodies, then serializes them in class file
//! order. `inspect` reads the result back.

pub mod attribute;
pub mod class;
pub mod code;
pub mod constpool;
pub mod defs;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod inspect;
pub mod method;
pub mod opcodes;
pub mod writer;

// Re-export commonly used types
pub use attribute::{AttributeBody, CodeAttribute, ExceptionTableEntry, NamedAttribute};
pub use class::ClassFile;
pub use code::CodeBuilder;
pub use constpool::{Constant, ConstantPool};
pub use descriptor::{method_descriptor, type_to_descriptor, JavaType, MethodDescriptor};
pub use error::{BytecodeError, ClassGenerationError, CodeGenResult, ConstPoolError, DescriptorError, InspectError};
pub use field::FieldInfo;
pub use inspect::{inspect, ClassSummary, CodeSummary, MemberSummary};
pub use method::MethodInfo;
pub use writer::ClassfileWritable;
