//! Attributes and exception table structures for Java class files

use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::error::ConstPoolResult;

/// Fixed part of a Code attribute payload: max_stack, max_locals,
/// code_length, exception_table_length and attributes_count
pub const CODE_HEADER_LENGTH: usize = 12;

/// Size of one exception table row
pub const EXCEPTION_ENTRY_LENGTH: usize = 8;

/// An attribute together with the pool index of its name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAttribute {
    pub name_index: u16,
    pub body: AttributeBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeBody {
    Code(CodeAttribute),
    Exceptions(ExceptionsAttribute),
    /// Index of the constant holding the field's initial value
    ConstantValue(u16),
    /// Index of the Utf8 entry naming the source file
    SourceFile(u16),
    LineNumberTable(LineNumberTableAttribute),
    LocalVariableTable(LocalVariableTableAttribute),
    Raw(Vec<u8>),
}

impl NamedAttribute {
    pub fn new(name_index: u16, body: AttributeBody) -> Self {
        Self { name_index, body }
    }

    pub fn code(constant_pool: &mut ConstantPool, code: CodeAttribute) -> ConstPoolResult<Self> {
        let name_index = constant_pool.add_utf8(attribute_names::CODE)?;
        Ok(Self::new(name_index, AttributeBody::Code(code)))
    }

    pub fn exceptions(constant_pool: &mut ConstantPool, classes: &[&str]) -> ConstPoolResult<Self> {
        let name_index = constant_pool.add_utf8(attribute_names::EXCEPTIONS)?;
        let mut table = ExceptionsAttribute::default();
        for class in classes {
            table.exception_index_table.push(constant_pool.add_class(class)?);
        }
        Ok(Self::new(name_index, AttributeBody::Exceptions(table)))
    }

    pub fn constant_value(constant_pool: &mut ConstantPool, value_index: u16) -> ConstPoolResult<Self> {
        let name_index = constant_pool.add_utf8(attribute_names::CONSTANT_VALUE)?;
        Ok(Self::new(name_index, AttributeBody::ConstantValue(value_index)))
    }

    pub fn source_file(constant_pool: &mut ConstantPool, file_name: &str) -> ConstPoolResult<Self> {
        let name_index = constant_pool.add_utf8(attribute_names::SOURCE_FILE)?;
        let file_index = constant_pool.add_utf8(file_name)?;
        Ok(Self::new(name_index, AttributeBody::SourceFile(file_index)))
    }

    pub fn line_number_table(constant_pool: &mut ConstantPool, table: LineNumberTableAttribute) -> ConstPoolResult<Self> {
        let name_index = constant_pool.add_utf8(attribute_names::LINE_NUMBER_TABLE)?;
        Ok(Self::new(name_index, AttributeBody::LineNumberTable(table)))
    }

    pub fn local_variable_table(constant_pool: &mut ConstantPool, table: LocalVariableTableAttribute) -> ConstPoolResult<Self> {
        let name_index = constant_pool.add_utf8(attribute_names::LOCAL_VARIABLE_TABLE)?;
        Ok(Self::new(name_index, AttributeBody::LocalVariableTable(table)))
    }

    /// Attribute payload without the 6-byte name/length header
    pub fn payload(&self) -> Vec<u8> {
        match &self.body {
            AttributeBody::Code(code) => code.to_bytes(),
            AttributeBody::Exceptions(table) => table.to_bytes(),
            AttributeBody::ConstantValue(index) | AttributeBody::SourceFile(index) => index.to_be_bytes().to_vec(),
            AttributeBody::LineNumberTable(table) => table.to_bytes(),
            AttributeBody::LocalVariableTable(table) => table.to_bytes(),
            AttributeBody::Raw(bytes) => bytes.clone(),
        }
    }

    /// Value written into the attribute_length field
    pub fn attribute_length(&self) -> u32 {
        match &self.body {
            AttributeBody::Code(code) => code.attribute_length(),
            _ => self.payload().len() as u32,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut bytes = Vec::with_capacity(6 + payload.len());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }

    pub fn as_code(&self) -> Option<&CodeAttribute> {
        match &self.body {
            AttributeBody::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_exceptions(&self) -> Option<&ExceptionsAttribute> {
        match &self.body {
            AttributeBody::Exceptions(table) => Some(table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<NamedAttribute>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Payload length computed from the parts
    pub fn attribute_length(&self) -> u32 {
        let nested: usize = self.attributes.iter().map(|a| 6 + a.attribute_length() as usize).sum();
        (CODE_HEADER_LENGTH + self.code.len() + EXCEPTION_ENTRY_LENGTH * self.exception_table.len() + nested) as u32
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes.extend_from_slice(&(self.exception_table.len() as u16).to_be_bytes());
        for entry in &self.exception_table {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Class constant of the caught type; 0 catches everything
    pub catch_type: u16,
}

impl ExceptionTableEntry {
    pub fn new(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: u16) -> Self {
        Self { start_pc, end_pc, handler_pc, catch_type }
    }

    pub fn is_catch_all(&self) -> bool {
        self.catch_type == 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(EXCEPTION_ENTRY_LENGTH);
        bytes.extend_from_slice(&self.start_pc.to_be_bytes());
        bytes.extend_from_slice(&self.end_pc.to_be_bytes());
        bytes.extend_from_slice(&self.handler_pc.to_be_bytes());
        bytes.extend_from_slice(&self.catch_type.to_be_bytes());
        bytes
    }
}

/// Checked exceptions a method declares, as Class constant indices
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExceptionsAttribute {
    pub exception_index_table: Vec<u16>,
}

impl ExceptionsAttribute {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.exception_index_table.len() as u16).to_be_bytes());
        for index in &self.exception_index_table {
            bytes.extend_from_slice(&index.to_be_bytes());
        }
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineNumberTableAttribute {
    pub line_number_table: Vec<LineNumberEntry>,
}

impl LineNumberTableAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line_number(&mut self, start_pc: u16, line_number: u16) {
        self.line_number_table.push(LineNumberEntry { start_pc, line_number });
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.line_number_table.len() as u16).to_be_bytes());
        for entry in &self.line_number_table {
            bytes.extend_from_slice(&entry.start_pc.to_be_bytes());
            bytes.extend_from_slice(&entry.line_number.to_be_bytes());
        }
        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalVariableTableAttribute {
    pub entries: Vec<LocalVariableEntry>,
}

impl LocalVariableTableAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a local that is live over `start_pc..start_pc + length`
    pub fn add_local(
        &mut self,
        constant_pool: &mut ConstantPool,
        start_pc: u16,
        length: u16,
        name: &str,
        descriptor: &str,
        index: u16,
    ) -> ConstPoolResult<()> {
        let name_index = constant_pool.add_utf8(name)?;
        let descriptor_index = constant_pool.add_utf8(descriptor)?;
        self.entries.push(LocalVariableEntry { start_pc, length, name_index, descriptor_index, index });
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for e in &self.entries {
            bytes.extend_from_slice(&e.to_bytes());
        }
        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

impl LocalVariableEntry {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.start_pc.to_be_bytes());
        bytes.extend_from_slice(&self.length.to_be_bytes());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&self.descriptor_index.to_be_bytes());
        bytes.extend_from_slice(&self.index.to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_length_matches_serialized_payload() {
        let mut cp = ConstantPool::new();
        let mut code = CodeAttribute::new(2, 1, vec![0x2a, 0xb1]);
        code.exception_table.push(ExceptionTableEntry::new(0, 1, 1, 0));
        let mut lines = LineNumberTableAttribute::new();
        lines.add_line_number(0, 1);
        code.attributes.push(NamedAttribute::line_number_table(&mut cp, lines).unwrap());
        let attribute = NamedAttribute::code(&mut cp, code).unwrap();
        assert_eq!(attribute.attribute_length() as usize, attribute.payload().len());
        assert_eq!(attribute.to_bytes().len(), 6 + attribute.payload().len());
    }

    #[test]
    fn test_exceptions_attribute_interns_classes() {
        let mut cp = ConstantPool::new();
        let attribute = NamedAttribute::exceptions(&mut cp, &["java.io.IOException"]).unwrap();
        let table = attribute.as_exceptions().unwrap();
        assert_eq!(cp.class_name_at(table.exception_index_table[0]), Some("java/io/IOException"));
        assert_eq!(attribute.payload(), vec![0, 1, 0, table.exception_index_table[0] as u8]);
    }
}
