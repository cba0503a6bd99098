use std::collections::HashSet;

use crate::codegen::attribute::{AttributeBody, NamedAttribute};
use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::defs::access_flags;
use crate::codegen::descriptor::JavaType;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FieldVerifyError {
    #[error("Invalid constant pool index {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Invalid constant pool index type {0}")]
    InvalidConstantPoolIndexType(u16),
    #[error("Invalid field descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Invalid field access flags: 0x{0:04x}")]
    InvalidFieldAccessFlags(u16),
    #[error("Duplicate field: {0}")]
    DuplicateField(String),
    #[error("Duplicate field attribute: {0}")]
    DuplicateFieldAttribute(&'static str),
    #[error("ConstantValue refers to invalid constant kind for field")]
    InvalidConstantValueKind,
}

pub type Result<T> = std::result::Result<T, FieldVerifyError>;

pub fn verify(class_file: &ClassFile) -> Result<()> {
    let mut seen = HashSet::new();
    for field in &class_file.fields {
        let name = utf8(class_file, field.name_index)?;
        let descriptor = utf8(class_file, field.descriptor_index)?;
        let ty = JavaType::parse(descriptor).map_err(|_| FieldVerifyError::InvalidDescriptor(descriptor.to_string()))?;
        if ty == JavaType::Void {
            return Err(FieldVerifyError::InvalidDescriptor(descriptor.to_string()));
        }
        if !seen.insert((name, descriptor)) {
            return Err(FieldVerifyError::DuplicateField(name.to_string()));
        }
        verify_access_flags(class_file, field.access_flags)?;
        verify_attributes(class_file, &ty, &field.attributes)?;
    }
    Ok(())
}

fn utf8(class_file: &ClassFile, index: u16) -> Result<&str> {
    match class_file.constant_pool.get(index) {
        Some(Constant::Utf8(s)) => Ok(s.as_str()),
        None => Err(FieldVerifyError::InvalidConstantPoolIndex(index)),
        _ => Err(FieldVerifyError::InvalidConstantPoolIndexType(index)),
    }
}

fn verify_access_flags(class_file: &ClassFile, flags: u16) -> Result<()> {
    let has = |bit: u16| flags & bit != 0;
    let visibility = has(access_flags::ACC_PUBLIC) as u8
        + has(access_flags::ACC_PROTECTED) as u8
        + has(access_flags::ACC_PRIVATE) as u8;
    if visibility > 1 || (has(access_flags::ACC_FINAL) && has(access_flags::ACC_VOLATILE)) {
        return Err(FieldVerifyError::InvalidFieldAccessFlags(flags));
    }
    if class_file.access_flags & access_flags::ACC_INTERFACE != 0 {
        let required = access_flags::ACC_PUBLIC | access_flags::ACC_STATIC | access_flags::ACC_FINAL;
        if flags & required != required {
            return Err(FieldVerifyError::InvalidFieldAccessFlags(flags));
        }
    }
    Ok(())
}

fn verify_attributes(class_file: &ClassFile, ty: &JavaType, attributes: &[NamedAttribute]) -> Result<()> {
    let mut has_constant_value = false;
    for attribute in attributes {
        if let AttributeBody::ConstantValue(index) = attribute.body {
            if has_constant_value {
                return Err(FieldVerifyError::DuplicateFieldAttribute("ConstantValue"));
            }
            has_constant_value = true;
            let matches_type = match (class_file.constant_pool.get(index), ty) {
                (Some(Constant::Long(_)), JavaType::Long) => true,
                (Some(Constant::Float(_)), JavaType::Float) => true,
                (Some(Constant::Double(_)), JavaType::Double) => true,
                (
                    Some(Constant::Integer(_)),
                    JavaType::Int | JavaType::Short | JavaType::Char | JavaType::Byte | JavaType::Boolean,
                ) => true,
                (Some(Constant::String(_)), JavaType::Object(name)) => name == "java.lang.String",
                (None, _) => return Err(FieldVerifyError::InvalidConstantPoolIndex(index)),
                _ => false,
            };
            if !matches_type {
                return Err(FieldVerifyError::InvalidConstantValueKind);
            }
        }
    }
    Ok(())
}
