//! Reading serialized class files back into a summary
//!
//! Only the structure this crate writes is decoded in detail: the constant
//! pool, member tables and the Code/Exceptions attributes of methods. Other
//! attributes are skipped by length.

use std::fmt;

use super::constpool::{decode_modified_utf8, Constant};
use super::defs::attribute_names::{CODE as CODE_ATTRIBUTE, EXCEPTIONS as EXCEPTIONS_ATTRIBUTE};
use super::defs::{constant_tags::*, MAGIC};
use super::error::{InspectError, InspectResult};
use super::opcodes;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSummary {
    pub minor_version: u16,
    pub major_version: u16,
    /// Count field as written, one more than the slots in use
    pub constant_pool_count: u16,
    /// Entries with their index
    pub constants: Vec<(u16, Constant)>,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberSummary>,
    pub methods: Vec<MemberSummary>,
    pub attribute_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSummary {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub attribute_names: Vec<String>,
    pub code: Option<CodeSummary>,
    pub exceptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeSummary {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    /// (start, end, handler, catch type name or `None` for catch-all)
    pub exception_table: Vec<(u16, u16, u16, Option<String>)>,
    pub attribute_names: Vec<String>,
    /// Value of the attribute_length field
    pub attribute_length: u32,
}

impl ClassSummary {
    pub fn method(&self, name: &str) -> Option<&MemberSummary> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&MemberSummary> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn utf8(&self, index: u16) -> Option<&str> {
        self.constants.iter().find_map(|(i, c)| match c {
            Constant::Utf8(s) if *i == index => Some(s.as_str()),
            _ => None,
        })
    }
}

impl CodeSummary {
    /// Opcodes of the instruction stream, operands skipped
    pub fn opcodes(&self) -> Vec<u8> {
        let mut ops = Vec::new();
        let mut pc = 0;
        while pc < self.code.len() {
            let op = self.code[pc];
            ops.push(op);
            pc += 1 + instruction_operand_len(&self.code, pc);
        }
        ops
    }
}

/// Operand bytes following the opcode at `pc`
fn instruction_operand_len(code: &[u8], pc: usize) -> usize {
    let op = code[pc];
    match op {
        opcodes::WIDE => match code.get(pc + 1) {
            Some(&opcodes::IINC) => 5,
            Some(_) => 3,
            None => 0,
        },
        opcodes::TABLESWITCH | opcodes::LOOKUPSWITCH => {
            let pad = (4 - (pc + 1) % 4) % 4;
            let base = pc + 1 + pad;
            let read = |at: usize| -> i64 {
                code.get(at..at + 4)
                    .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64)
                    .unwrap_or(0)
            };
            let len = if op == opcodes::TABLESWITCH {
                let low = read(base + 4);
                let high = read(base + 8);
                12 + 4 * (high - low + 1).max(0) as usize
            } else {
                8 + 8 * read(base + 4).max(0) as usize
            };
            pad + len
        }
        _ => opcodes::operand_count(op).unwrap_or(0),
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, needed: usize) -> InspectResult<&'a [u8]> {
        let end = self.offset + needed;
        if end > self.bytes.len() {
            return Err(InspectError::UnexpectedEof { offset: self.offset, needed });
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u1(&mut self) -> InspectResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u2(&mut self) -> InspectResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u4(&mut self) -> InspectResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u4_pair(&mut self) -> InspectResult<u64> {
        let hi = self.u4()? as u64;
        let lo = self.u4()? as u64;
        Ok((hi << 32) | lo)
    }
}

struct Pool {
    constants: Vec<(u16, Constant)>,
}

impl Pool {
    fn get(&self, index: u16) -> Option<&Constant> {
        self.constants.iter().find(|(i, _)| *i == index).map(|(_, c)| c)
    }

    fn utf8(&self, index: u16) -> InspectResult<String> {
        match self.get(index) {
            Some(Constant::Utf8(s)) => Ok(s.clone()),
            _ => Err(InspectError::BadReference(index)),
        }
    }

    fn class_name(&self, index: u16) -> InspectResult<String> {
        match self.get(index) {
            Some(Constant::Class(name_index)) => self.utf8(*name_index),
            _ => Err(InspectError::BadReference(index)),
        }
    }
}

/// Parse a class file
pub fn inspect(bytes: &[u8]) -> InspectResult<ClassSummary> {
    let mut r = Reader { bytes, offset: 0 };
    let magic = r.u4()?;
    if magic != MAGIC {
        return Err(InspectError::BadMagic { found: magic });
    }
    let minor_version = r.u2()?;
    let major_version = r.u2()?;
    let constant_pool_count = r.u2()?;

    let mut constants = Vec::new();
    let mut index = 1u16;
    while index < constant_pool_count {
        let tag = r.u1()?;
        let constant = match tag {
            CONSTANT_UTF8 => {
                let len = r.u2()? as usize;
                let raw = r.take(len)?;
                Constant::Utf8(decode_modified_utf8(raw).ok_or(InspectError::BadUtf8(index))?)
            }
            CONSTANT_INTEGER => Constant::Integer(r.u4()? as i32),
            CONSTANT_FLOAT => Constant::Float(f32::from_bits(r.u4()?)),
            CONSTANT_LONG => Constant::Long(r.u4_pair()? as i64),
            CONSTANT_DOUBLE => Constant::Double(f64::from_bits(r.u4_pair()?)),
            CONSTANT_CLASS => Constant::Class(r.u2()?),
            CONSTANT_STRING => Constant::String(r.u2()?),
            CONSTANT_FIELDREF => Constant::FieldRef(r.u2()?, r.u2()?),
            CONSTANT_METHODREF => Constant::MethodRef(r.u2()?, r.u2()?),
            CONSTANT_INTERFACEMETHODREF => Constant::InterfaceMethodRef(r.u2()?, r.u2()?),
            CONSTANT_NAMEANDTYPE => Constant::NameAndType(r.u2()?, r.u2()?),
            _ => return Err(InspectError::UnknownTag { tag, index }),
        };
        let width = constant.slot_width() as u16;
        constants.push((index, constant));
        index = index.saturating_add(width);
    }
    let pool = Pool { constants };

    let access_flags = r.u2()?;
    let this_class = pool.class_name(r.u2()?)?;
    let super_index = r.u2()?;
    let super_class = if super_index == 0 { None } else { Some(pool.class_name(super_index)?) };

    let interface_count = r.u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(r.u2()?)?);
    }

    let fields = read_members(&mut r, &pool)?;
    let methods = read_members(&mut r, &pool)?;

    let attribute_count = r.u2()?;
    let mut attribute_names = Vec::with_capacity(attribute_count as usize);
    for _ in 0..attribute_count {
        let name = pool.utf8(r.u2()?)?;
        let len = r.u4()? as usize;
        r.take(len)?;
        attribute_names.push(name);
    }

    Ok(ClassSummary {
        minor_version,
        major_version,
        constant_pool_count,
        constants: pool.constants,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attribute_names,
    })
}

fn read_members(r: &mut Reader<'_>, pool: &Pool) -> InspectResult<Vec<MemberSummary>> {
    let count = r.u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = r.u2()?;
        let name = pool.utf8(r.u2()?)?;
        let descriptor = pool.utf8(r.u2()?)?;
        let attribute_count = r.u2()?;
        let mut attribute_names = Vec::new();
        let mut code = None;
        let mut exceptions = Vec::new();
        for _ in 0..attribute_count {
            let attribute_name = pool.utf8(r.u2()?)?;
            let len = r.u4()?;
            let payload = r.take(len as usize)?;
            let mut inner = Reader { bytes: payload, offset: 0 };
            if attribute_name == CODE_ATTRIBUTE {
                code = Some(read_code(&mut inner, pool, len)?);
            } else if attribute_name == EXCEPTIONS_ATTRIBUTE {
                let n = inner.u2()?;
                for _ in 0..n {
                    exceptions.push(pool.class_name(inner.u2()?)?);
                }
            }
            attribute_names.push(attribute_name);
        }
        members.push(MemberSummary { access_flags, name, descriptor, attribute_names, code, exceptions });
    }
    Ok(members)
}

fn read_code(r: &mut Reader<'_>, pool: &Pool, attribute_length: u32) -> InspectResult<CodeSummary> {
    let max_stack = r.u2()?;
    let max_locals = r.u2()?;
    let code_length = r.u4()? as usize;
    let code = r.take(code_length)?.to_vec();
    let table_length = r.u2()?;
    let mut exception_table = Vec::with_capacity(table_length as usize);
    for _ in 0..table_length {
        let start = r.u2()?;
        let end = r.u2()?;
        let handler = r.u2()?;
        let catch_type = r.u2()?;
        let catch_name = if catch_type == 0 { None } else { Some(pool.class_name(catch_type)?) };
        exception_table.push((start, end, handler, catch_name));
    }
    let attribute_count = r.u2()?;
    let mut attribute_names = Vec::new();
    for _ in 0..attribute_count {
        attribute_names.push(pool.utf8(r.u2()?)?);
        let len = r.u4()? as usize;
        r.take(len)?;
    }
    Ok(CodeSummary { max_stack, max_locals, code, exception_table, attribute_names, attribute_length })
}

impl fmt::Display for ClassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "class {} (version {}.{})", self.this_class, self.major_version, self.minor_version)?;
        writeln!(f, "  access flags: {:#06x}", self.access_flags)?;
        if let Some(super_class) = &self.super_class {
            writeln!(f, "  extends {}", super_class)?;
        }
        for interface in &self.interfaces {
            writeln!(f, "  implements {}", interface)?;
        }
        writeln!(f, "  constant pool: {} entries (count {})", self.constants.len(), self.constant_pool_count)?;
        for (index, constant) in &self.constants {
            writeln!(f, "    #{:<4} {:?}", index, constant)?;
        }
        writeln!(f, "  fields: {}", self.fields.len())?;
        for field in &self.fields {
            writeln!(f, "    {:#06x} {} {}", field.access_flags, field.name, field.descriptor)?;
        }
        writeln!(f, "  methods: {}", self.methods.len())?;
        for method in &self.methods {
            writeln!(f, "    {:#06x} {}{}", method.access_flags, method.name, method.descriptor)?;
            if !method.exceptions.is_empty() {
                writeln!(f, "      throws {}", method.exceptions.join(", "))?;
            }
            if let Some(code) = &method.code {
                writeln!(
                    f,
                    "      stack={} locals={} code_length={}",
                    code.max_stack,
                    code.max_locals,
                    code.code.len()
                )?;
                let mnemonics: Vec<&str> = code.opcodes().into_iter().map(opcodes::opcode_name).collect();
                writeln!(f, "      {}", mnemonics.join(" "))?;
                for (start, end, handler, catch) in &code.exception_table {
                    writeln!(
                        f,
                        "      handler {}..{} -> {} ({})",
                        start,
                        end,
                        handler,
                        catch.as_deref().unwrap_or("any")
                    )?;
                }
            }
        }
        if !self.attribute_names.is_empty() {
            writeln!(f, "  attributes: {}", self.attribute_names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic() {
        assert_eq!(inspect(&[0, 0, 0, 0, 0, 0]), Err(InspectError::BadMagic { found: 0 }));
    }

    #[test]
    fn test_truncated() {
        let err = inspect(&[0xCA, 0xFE, 0xBA, 0xBE, 0, 3]).unwrap_err();
        assert!(matches!(err, InspectError::UnexpectedEof { offset: 6, needed: 2 }));
    }

    #[test]
    fn test_opcode_walk_skips_operands() {
        let code = CodeSummary {
            max_stack: 2,
            max_locals: 1,
            code: vec![opcodes::SIPUSH, 1, 0, opcodes::WIDE, opcodes::ILOAD, 1, 0, opcodes::RETURN],
            exception_table: Vec::new(),
            attribute_names: Vec::new(),
            attribute_length: 0,
        };
        assert_eq!(code.opcodes(), vec![opcodes::SIPUSH, opcodes::WIDE, opcodes::RETURN]);
    }
}
