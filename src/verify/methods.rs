use std::collections::HashSet;

use crate::codegen::attribute::{AttributeBody, CodeAttribute};
use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::defs::MAX_CODE_LENGTH;
use crate::codegen::descriptor::MethodDescriptor;
use crate::codegen::method::MethodInfo;

use super::method_access_flags::{self, MethodAccessFlagsError};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MethodVerifyError {
    #[error("Invalid constant pool index {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Invalid constant pool index type {0}")]
    InvalidConstantPoolIndexType(u16),
    #[error("Invalid method descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Invalid method access flags: 0x{0:04x}")]
    InvalidMethodAccessFlags(u16),
    #[error("Duplicate method: {0}{1}")]
    DuplicateMethod(String, String),
    #[error("Method {0} must have exactly one Code attribute unless abstract or native")]
    MissingCodeAttribute(String),
    #[error("Abstract or native method {0} must not have Code attribute")]
    ForbiddenCodeAttribute(String),
    #[error("Duplicate method attribute: {0}")]
    DuplicateMethodAttribute(&'static str),
    #[error("Invalid code length {0}")]
    InvalidCodeLength(usize),
    #[error("max_locals {max_locals} does not cover {required} argument words")]
    LocalsTooSmall { max_locals: u16, required: u16 },
    #[error("Exception handler {start}..{end} -> {handler} outside code")]
    InvalidExceptionHandler { start: u16, end: u16, handler: u16 },
    #[error("Invalid method attribute: duplicate exceptions declared")]
    DuplicateExceptions,
    #[error("LocalVariableTable entry out of range")]
    LocalVariableOutOfRange,
}

pub type Result<T> = std::result::Result<T, MethodVerifyError>;

impl From<MethodAccessFlagsError> for MethodVerifyError {
    fn from(err: MethodAccessFlagsError) -> Self {
        match err {
            MethodAccessFlagsError::Invalid(bits) => MethodVerifyError::InvalidMethodAccessFlags(bits),
        }
    }
}

/// Verify the ClassFile methods
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let mut seen = HashSet::new();
    for method in &class_file.methods {
        method_access_flags::verify(class_file, method)?;
        let name = utf8(class_file, method.name_index)?;
        let descriptor = utf8(class_file, method.descriptor_index)?;
        let parsed = MethodDescriptor::parse(descriptor)
            .map_err(|_| MethodVerifyError::InvalidDescriptor(descriptor.to_string()))?;
        if !seen.insert((name, descriptor)) {
            return Err(MethodVerifyError::DuplicateMethod(name.to_string(), descriptor.to_string()));
        }
        verify_method_attributes(class_file, method, name, &parsed)?;
    }
    Ok(())
}

fn utf8(class_file: &ClassFile, index: u16) -> Result<&str> {
    match class_file.constant_pool.get(index) {
        Some(Constant::Utf8(s)) => Ok(s.as_str()),
        None => Err(MethodVerifyError::InvalidConstantPoolIndex(index)),
        _ => Err(MethodVerifyError::InvalidConstantPoolIndexType(index)),
    }
}

fn verify_method_attributes(
    class_file: &ClassFile,
    method: &MethodInfo,
    name: &str,
    descriptor: &MethodDescriptor,
) -> Result<()> {
    let code_count = method.code_attribute_count();
    if method.needs_code() && code_count != 1 {
        return Err(MethodVerifyError::MissingCodeAttribute(name.to_string()));
    }
    if !method.needs_code() && code_count != 0 {
        return Err(MethodVerifyError::ForbiddenCodeAttribute(name.to_string()));
    }

    let mut has_exceptions = false;
    for attribute in &method.attributes {
        match &attribute.body {
            AttributeBody::Code(code) => {
                let is_static = method.access_flags & crate::codegen::defs::access_flags::ACC_STATIC != 0;
                let required = descriptor.arg_words() + if is_static { 0 } else { 1 };
                verify_code(class_file, code, required)?;
            }
            AttributeBody::Exceptions(table) => {
                if has_exceptions {
                    return Err(MethodVerifyError::DuplicateMethodAttribute("Exceptions"));
                }
                has_exceptions = true;
                let mut declared = HashSet::new();
                for &index in &table.exception_index_table {
                    match class_file.constant_pool.get(index) {
                        Some(Constant::Class(_)) => {}
                        None => return Err(MethodVerifyError::InvalidConstantPoolIndex(index)),
                        _ => return Err(MethodVerifyError::InvalidConstantPoolIndexType(index)),
                    }
                    if !declared.insert(index) {
                        return Err(MethodVerifyError::DuplicateExceptions);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn verify_code(class_file: &ClassFile, code: &CodeAttribute, required_locals: u16) -> Result<()> {
    let length = code.code.len();
    if length == 0 || length > MAX_CODE_LENGTH {
        return Err(MethodVerifyError::InvalidCodeLength(length));
    }
    if code.max_locals < required_locals {
        return Err(MethodVerifyError::LocalsTooSmall { max_locals: code.max_locals, required: required_locals });
    }
    for entry in &code.exception_table {
        if entry.start_pc >= entry.end_pc || entry.end_pc as usize > length || entry.handler_pc as usize >= length {
            return Err(MethodVerifyError::InvalidExceptionHandler {
                start: entry.start_pc,
                end: entry.end_pc,
                handler: entry.handler_pc,
            });
        }
        if !entry.is_catch_all() {
            match class_file.constant_pool.get(entry.catch_type) {
                Some(Constant::Class(_)) => {}
                None => return Err(MethodVerifyError::InvalidConstantPoolIndex(entry.catch_type)),
                _ => return Err(MethodVerifyError::InvalidConstantPoolIndexType(entry.catch_type)),
            }
        }
    }
    for inner in &code.attributes {
        if let AttributeBody::LocalVariableTable(table) = &inner.body {
            for e in &table.entries {
                if e.start_pc as usize + e.length as usize > length || e.index >= code.max_locals {
                    return Err(MethodVerifyError::LocalVariableOutOfRange);
                }
                utf8(class_file, e.name_index)?;
                utf8(class_file, e.descriptor_index)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::attribute::ExceptionTableEntry;
    use crate::codegen::defs::access_flags::*;
    use crate::codegen::opcodes;

    fn class() -> ClassFile {
        ClassFile::new_class("A", "java.lang.Object", ACC_PUBLIC | ACC_SUPER).unwrap()
    }

    #[test]
    fn test_missing_code() {
        let mut class = class();
        class.add_method(ACC_PUBLIC, "run", "()V", None).unwrap();
        assert_eq!(verify(&class), Err(MethodVerifyError::MissingCodeAttribute("run".to_string())));
    }

    #[test]
    fn test_abstract_without_code() {
        let mut class = class();
        class.access_flags |= ACC_ABSTRACT;
        class.add_method(ACC_PUBLIC | ACC_ABSTRACT, "run", "()V", None).unwrap();
        assert_eq!(verify(&class), Ok(()));
    }

    #[test]
    fn test_locals_cover_arguments() {
        let mut class = class();
        let code = CodeAttribute::new(2, 2, vec![opcodes::RETURN]);
        class.add_method(ACC_PUBLIC, "run", "(J)V", Some(code)).unwrap();
        assert_eq!(verify(&class), Err(MethodVerifyError::LocalsTooSmall { max_locals: 2, required: 3 }));
    }

    #[test]
    fn test_handler_outside_code() {
        let mut class = class();
        let mut code = CodeAttribute::new(2, 1, vec![opcodes::NOP, opcodes::RETURN]);
        code.exception_table.push(ExceptionTableEntry::new(0, 1, 7, 0));
        class.add_method(ACC_PUBLIC, "run", "()V", Some(code)).unwrap();
        assert!(matches!(verify(&class), Err(MethodVerifyError::InvalidExceptionHandler { .. })));
    }

    #[test]
    fn test_duplicate_exceptions() {
        let mut class = class();
        let code = CodeAttribute::new(2, 1, vec![opcodes::RETURN]);
        let m = class.add_method(ACC_PUBLIC, "run", "()V", Some(code)).unwrap();
        class.add_method_exceptions(m, &["java.io.IOException", "java/io/IOException"]).unwrap();
        assert_eq!(verify(&class), Err(MethodVerifyError::DuplicateExceptions));
    }
}
