//! Core classfile structure: the ClassFile owns its constant pool and member tables

use super::attribute::{CodeAttribute, NamedAttribute};
use super::constpool::ConstantPool;
use super::defs::{DEFAULT_MAJOR_VERSION, DEFAULT_MINOR_VERSION, MAGIC};
use super::error::{ClassGenerationError, CodeGenResult, ConstPoolResult};
use super::field::FieldInfo;
use super::method::MethodInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<NamedAttribute>,
}

impl Default for ClassFile {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassFile {
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            minor_version: DEFAULT_MINOR_VERSION,
            major_version: DEFAULT_MAJOR_VERSION,
            constant_pool: ConstantPool::new(),
            access_flags: 0,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// A class named `name` extending `super_name`
    pub fn new_class(name: &str, super_name: &str, access_flags: u16) -> ConstPoolResult<Self> {
        let mut class = Self::new();
        class.access_flags = access_flags;
        class.set_this_class(name)?;
        class.set_super_class(super_name)?;
        Ok(class)
    }

    pub fn with_version(mut self, major_version: u16, minor_version: u16) -> Self {
        self.major_version = major_version;
        self.minor_version = minor_version;
        self
    }

    pub fn set_this_class(&mut self, name: &str) -> ConstPoolResult<()> {
        self.this_class = self.constant_pool.add_class(name)?;
        Ok(())
    }

    pub fn set_super_class(&mut self, name: &str) -> ConstPoolResult<()> {
        self.super_class = self.constant_pool.add_class(name)?;
        Ok(())
    }

    pub fn add_interface(&mut self, name: &str) -> ConstPoolResult<u16> {
        let index = self.constant_pool.add_class(name)?;
        if !self.interfaces.contains(&index) {
            self.interfaces.push(index);
        }
        Ok(index)
    }

    /// Declare a field and return its position in the field table
    pub fn add_field(&mut self, access_flags: u16, name: &str, descriptor: &str) -> ConstPoolResult<usize> {
        let name_index = self.constant_pool.add_utf8(name)?;
        let descriptor_index = self.constant_pool.add_utf8(descriptor)?;
        self.fields.push(FieldInfo::new(access_flags, name_index, descriptor_index));
        Ok(self.fields.len() - 1)
    }

    /// Declare a method, attaching `code` as its Code attribute when given
    pub fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<CodeAttribute>,
    ) -> ConstPoolResult<usize> {
        let name_index = self.constant_pool.add_utf8(name)?;
        let descriptor_index = self.constant_pool.add_utf8(descriptor)?;
        let mut method = MethodInfo::new(access_flags, name_index, descriptor_index);
        if let Some(code) = code {
            method.attributes.push(NamedAttribute::code(&mut self.constant_pool, code)?);
        }
        self.methods.push(method);
        Ok(self.methods.len() - 1)
    }

    /// Attach `throws` classes to an already declared method
    pub fn add_method_exceptions(&mut self, method: usize, classes: &[&str]) -> CodeGenResult<()> {
        if classes.is_empty() {
            return Ok(());
        }
        let attribute = NamedAttribute::exceptions(&mut self.constant_pool, classes)?;
        let target = self
            .methods
            .get_mut(method)
            .ok_or(ClassGenerationError::Unresolved { what: "method for Exceptions attribute" })?;
        target.attributes.push(attribute);
        Ok(())
    }

    pub fn add_attribute(&mut self, attribute: NamedAttribute) {
        self.attributes.push(attribute);
    }

    pub fn this_class_name(&self) -> Option<&str> {
        self.constant_pool.class_name_at(self.this_class)
    }

    pub fn super_class_name(&self) -> Option<&str> {
        self.constant_pool.class_name_at(self.super_class)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Option<&str> {
        self.constant_pool.utf8_at(method.name_index)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Option<&str> {
        self.constant_pool.utf8_at(method.descriptor_index)
    }

    /// Look a method up by name and descriptor
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            self.method_name(m) == Some(name) && self.method_descriptor(m) == Some(descriptor)
        })
    }

    /// Checks required before the class can be written: this/super resolved
    /// and every table small enough for its u16 count field
    pub fn check_resolvable(&self) -> CodeGenResult<()> {
        if self.this_class_name().is_none() {
            return Err(ClassGenerationError::Unresolved { what: "this_class" });
        }
        // java/lang/Object is the only class allowed a zero super_class
        if self.super_class == 0 {
            if self.this_class_name() != Some("java/lang/Object") {
                return Err(ClassGenerationError::Unresolved { what: "super_class" });
            }
        } else if self.super_class_name().is_none() {
            return Err(ClassGenerationError::Unresolved { what: "super_class" });
        }
        for (what, count) in [
            ("interfaces", self.interfaces.len()),
            ("fields", self.fields.len()),
            ("methods", self.methods.len()),
            ("attributes", self.attributes.len()),
        ] {
            if count > u16::MAX as usize {
                return Err(ClassGenerationError::CountOverflow { what, count });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::defs::access_flags::*;

    #[test]
    fn test_new_class_resolves_names() {
        let class = ClassFile::new_class("FESI.ClassFile.Demo", "java.lang.Object", ACC_PUBLIC | ACC_SUPER).unwrap();
        assert_eq!(class.this_class_name(), Some("FESI/ClassFile/Demo"));
        assert_eq!(class.super_class_name(), Some("java/lang/Object"));
        assert!(class.check_resolvable().is_ok());
    }

    #[test]
    fn test_unresolved_this_class() {
        let class = ClassFile::new();
        assert!(matches!(
            class.check_resolvable(),
            Err(ClassGenerationError::Unresolved { what: "this_class" })
        ));
    }

    #[test]
    fn test_interfaces_are_not_duplicated() {
        let mut class = ClassFile::new_class("A", "java.lang.Object", ACC_PUBLIC).unwrap();
        class.add_interface("java.awt.event.ActionListener").unwrap();
        class.add_interface("java/awt/event/ActionListener").unwrap();
        assert_eq!(class.interfaces.len(), 1);
    }
}
