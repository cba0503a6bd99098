//! Specific error types for class file generation operations

use thiserror::Error;

/// Errors that can occur during constant pool operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConstPoolError {
    #[error("Constant pool is out of space ({slots} slots requested)")]
    OutOfSpace { slots: usize },
    #[error("Invalid constant pool index: {0}")]
    InvalidIndex(u16),
    #[error("Utf8 constant too long: {len} bytes")]
    Utf8TooLong { len: usize },
}

/// Errors that can occur while emitting bytecode
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("Code too long: {length} bytes")]
    CodeTooLong { length: usize },
    #[error("Local variable index out of bounds: {index}")]
    LocalIndexOutOfBounds { index: u32 },
    #[error("Branch target too far: {offset}")]
    BranchTooFar { offset: i32 },
    #[error("Invalid opcode: {opcode:#04x}")]
    InvalidOpcode { opcode: u8 },
    #[error("Opcode {opcode:#04x} expects {expected} operand bytes, got {found}")]
    OperandWidth { opcode: u8, expected: usize, found: usize },
    #[error("Exception range {start}..{end} is empty or outside the code array")]
    InvalidExceptionRange { start: u16, end: u16 },
}

/// Errors that can occur during descriptor generation or parsing
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Invalid type descriptor: {descriptor}")]
    InvalidTypeDescriptor { descriptor: String },
    #[error("Invalid method descriptor: {descriptor}")]
    InvalidMethodDescriptor { descriptor: String },
    #[error("Unsupported type: {type_name}")]
    UnsupportedType { type_name: String },
}

/// Errors that can occur during attribute generation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttributeGenerationError {
    #[error("Attribute data too large: {size} bytes")]
    DataTooLarge { size: usize },
    #[error("Attribute table too large: {count} entries")]
    TooManyEntries { count: usize },
}

/// Errors that can occur during class file generation
#[derive(Error, Debug)]
pub enum ClassGenerationError {
    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),
    #[error("Bytecode generation error: {0}")]
    Bytecode(#[from] BytecodeError),
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error("Attribute generation error: {0}")]
    AttributeGeneration(#[from] AttributeGenerationError),
    #[error("Class file has no {what}")]
    Unresolved { what: &'static str },
    #[error("Too many {what}: {count}")]
    CountOverflow { what: &'static str, count: usize },
    #[error("I/O error while writing class file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a serialized class file back
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InspectError {
    #[error("Bad magic number {found:#010x}")]
    BadMagic { found: u32 },
    #[error("Unexpected end of class file at offset {offset} (needed {needed} bytes)")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("Unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },
    #[error("Constant pool index {0} does not name the expected entry")]
    BadReference(u16),
    #[error("Invalid modified UTF-8 at constant {0}")]
    BadUtf8(u16),
}

/// Generic result type for class file generation operations
pub type CodeGenResult<T> = Result<T, ClassGenerationError>;

/// Generic result type for constant pool operations
pub type ConstPoolResult<T> = Result<T, ConstPoolError>;

/// Generic result type for bytecode operations
pub type BytecodeResult<T> = Result<T, BytecodeError>;

/// Result type for class file inspection
pub type InspectResult<T> = Result<T, InspectError>;
