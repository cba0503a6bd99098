//! MethodInfo structure and serialization

use super::attribute::{CodeAttribute, ExceptionsAttribute, NamedAttribute};
use super::defs::access_flags::{ACC_ABSTRACT, ACC_NATIVE};

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<NamedAttribute>,
}

impl MethodInfo {
    pub fn new(access_flags: u16, name_index: u16, descriptor_index: u16) -> Self {
        Self { access_flags, name_index, descriptor_index, attributes: Vec::new() }
    }

    /// Abstract and native methods carry no Code attribute
    pub fn needs_code(&self) -> bool {
        self.access_flags & (ACC_ABSTRACT | ACC_NATIVE) == 0
    }

    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(NamedAttribute::as_code)
    }

    pub fn code_attribute_count(&self) -> usize {
        self.attributes.iter().filter(|a| a.as_code().is_some()).count()
    }

    pub fn exceptions(&self) -> Option<&ExceptionsAttribute> {
        self.attributes.iter().find_map(NamedAttribute::as_exceptions)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.access_flags.to_be_bytes());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&self.descriptor_index.to_be_bytes());
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }
}
