//! Constant pool and constants for Java class files
//!
//! The pool deduplicates by value: interning an entry that is equal (by tag and
//! type-appropriate value) to one already present returns the existing index.
//! Indices are 1-based, assigned in insertion order and never reused. `Long`
//! and `Double` entries occupy two slots, as the class file format requires.

use std::collections::HashMap;

use super::defs::{constant_tags, internal_name, MAX_CONSTANT_POOL_SLOTS};
use super::error::{ConstPoolError, ConstPoolResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
}

/// Hashable identity of a constant; floating point values compare by bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
}

impl Constant {
    /// The class file tag byte for this entry
    pub fn tag(&self) -> u8 {
        use constant_tags::*;
        match self {
            Constant::Utf8(_) => CONSTANT_UTF8,
            Constant::Integer(_) => CONSTANT_INTEGER,
            Constant::Float(_) => CONSTANT_FLOAT,
            Constant::Long(_) => CONSTANT_LONG,
            Constant::Double(_) => CONSTANT_DOUBLE,
            Constant::Class(_) => CONSTANT_CLASS,
            Constant::String(_) => CONSTANT_STRING,
            Constant::FieldRef(..) => CONSTANT_FIELDREF,
            Constant::MethodRef(..) => CONSTANT_METHODREF,
            Constant::InterfaceMethodRef(..) => CONSTANT_INTERFACEMETHODREF,
            Constant::NameAndType(..) => CONSTANT_NAMEANDTYPE,
        }
    }

    /// Number of pool slots the entry occupies
    pub fn slot_width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    fn key(&self) -> ConstKey {
        match self {
            Constant::Utf8(s) => ConstKey::Utf8(s.clone()),
            Constant::Integer(v) => ConstKey::Integer(*v),
            Constant::Float(v) => ConstKey::Float(v.to_bits()),
            Constant::Long(v) => ConstKey::Long(*v),
            Constant::Double(v) => ConstKey::Double(v.to_bits()),
            Constant::Class(i) => ConstKey::Class(*i),
            Constant::String(i) => ConstKey::String(*i),
            Constant::FieldRef(c, n) => ConstKey::FieldRef(*c, *n),
            Constant::MethodRef(c, n) => ConstKey::MethodRef(*c, *n),
            Constant::InterfaceMethodRef(c, n) => ConstKey::InterfaceMethodRef(*c, *n),
            Constant::NameAndType(n, d) => ConstKey::NameAndType(*n, *d),
        }
    }

    /// Serialized form of the entry: tag byte followed by its payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.tag()];
        match self {
            Constant::Utf8(value) => {
                let encoded = encode_modified_utf8(value);
                bytes.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
                bytes.extend_from_slice(&encoded);
            }
            Constant::Integer(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Constant::Float(value) => bytes.extend_from_slice(&value.to_bits().to_be_bytes()),
            Constant::Long(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Constant::Double(value) => bytes.extend_from_slice(&value.to_bits().to_be_bytes()),
            Constant::Class(name_index) => bytes.extend_from_slice(&name_index.to_be_bytes()),
            Constant::String(string_index) => bytes.extend_from_slice(&string_index.to_be_bytes()),
            Constant::FieldRef(a, b)
            | Constant::MethodRef(a, b)
            | Constant::InterfaceMethodRef(a, b)
            | Constant::NameAndType(a, b) => {
                bytes.extend_from_slice(&a.to_be_bytes());
                bytes.extend_from_slice(&b.to_be_bytes());
            }
        }
        bytes
    }
}

/// Encode a string in the JVM's modified UTF-8 form
///
/// NUL becomes the two-byte sequence `C0 80`, characters outside the BMP are
/// written as two encoded surrogates.
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decode modified UTF-8 back into a Rust string
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1)?;
            units.push((((b & 0x1F) as u16) << 6) | (b2 & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1)?;
            let b3 = *bytes.get(i + 2)?;
            units.push((((b & 0x0F) as u16) << 12) | (((b2 & 0x3F) as u16) << 6) | (b3 & 0x3F) as u16);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    /// Slot `i` holds the entry with index `i + 1`; the upper half of a wide entry is `None`
    slots: Vec<Option<Constant>>,
    index: HashMap<ConstKey, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots in use (wide entries count twice)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The `constant_pool_count` value written to the class file
    pub fn count(&self) -> u16 {
        (self.slots.len() + 1) as u16
    }

    /// Number of distinct entries
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    /// Entry stored at a 1-based index
    pub fn get(&self, index: u16) -> Option<&Constant> {
        if index == 0 {
            return None;
        }
        self.slots.get(index as usize - 1).and_then(Option::as_ref)
    }

    /// Entries in index order together with their index
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| ((i + 1) as u16, c)))
    }

    /// Index of an entry equal to `constant`, if one has been interned
    pub fn find(&self, constant: &Constant) -> Option<u16> {
        self.index.get(&constant.key()).copied()
    }

    /// Intern a fully-formed entry, returning the existing index for equal entries
    ///
    /// Reference entries must point at indices already present in this pool.
    pub fn intern(&mut self, constant: Constant) -> ConstPoolResult<u16> {
        let key = constant.key();
        if let Some(&existing) = self.index.get(&key) {
            return Ok(existing);
        }
        if let Constant::Utf8(ref s) = constant {
            let len = encode_modified_utf8(s).len();
            if len > u16::MAX as usize {
                return Err(ConstPoolError::Utf8TooLong { len });
            }
        }
        let width = constant.slot_width();
        let requested = self.slots.len() + width;
        if requested >= MAX_CONSTANT_POOL_SLOTS {
            return Err(ConstPoolError::OutOfSpace { slots: requested });
        }
        let assigned = (self.slots.len() + 1) as u16;
        self.slots.push(Some(constant));
        if width == 2 {
            self.slots.push(None);
        }
        self.index.insert(key, assigned);
        Ok(assigned)
    }

    pub fn add_utf8(&mut self, value: &str) -> ConstPoolResult<u16> {
        self.intern(Constant::Utf8(value.to_string()))
    }

    /// Add a class constant; dotted names are converted to internal form
    pub fn add_class(&mut self, name: &str) -> ConstPoolResult<u16> {
        let name_index = self.add_utf8(&internal_name(name))?;
        self.intern(Constant::Class(name_index))
    }

    pub fn add_string(&mut self, value: &str) -> ConstPoolResult<u16> {
        let utf8_index = self.add_utf8(value)?;
        self.intern(Constant::String(utf8_index))
    }

    pub fn add_integer(&mut self, value: i32) -> ConstPoolResult<u16> {
        self.intern(Constant::Integer(value))
    }

    pub fn add_float(&mut self, value: f32) -> ConstPoolResult<u16> {
        self.intern(Constant::Float(value))
    }

    pub fn add_long(&mut self, value: i64) -> ConstPoolResult<u16> {
        self.intern(Constant::Long(value))
    }

    pub fn add_double(&mut self, value: f64) -> ConstPoolResult<u16> {
        self.intern(Constant::Double(value))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.intern(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::MethodRef(class_index, name_and_type_index))
    }

    pub fn add_interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::InterfaceMethodRef(class_index, name_and_type_index))
    }

    /// String value of a Utf8 entry
    pub fn utf8_at(&self, index: u16) -> Option<&str> {
        match self.get(index) {
            Some(Constant::Utf8(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Internal name referenced by a Class entry
    pub fn class_name_at(&self, index: u16) -> Option<&str> {
        match self.get(index) {
            Some(Constant::Class(name_index)) => self.utf8_at(*name_index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_values_share_a_slot() {
        let mut cp = ConstantPool::new();
        let a = cp.add_string("10").unwrap();
        let b = cp.add_string("10").unwrap();
        assert_eq!(a, b);
        // Utf8 + String
        assert_eq!(cp.len(), 2);
    }

    #[test]
    fn test_string_and_utf8_are_distinct_tags() {
        let mut cp = ConstantPool::new();
        let utf8 = cp.add_utf8("fire").unwrap();
        let string = cp.add_string("fire").unwrap();
        assert_ne!(utf8, string);
        assert_eq!(cp.get(string), Some(&Constant::String(utf8)));
    }

    #[test]
    fn test_wide_entries_take_two_slots() {
        let mut cp = ConstantPool::new();
        let l = cp.add_long(7).unwrap();
        let next = cp.add_integer(7).unwrap();
        assert_eq!(l, 1);
        assert_eq!(next, 3);
        assert_eq!(cp.get(2), None);
        assert_eq!(cp.count(), 4);
    }

    #[test]
    fn test_float_dedup_uses_bit_pattern() {
        let mut cp = ConstantPool::new();
        let pos = cp.add_float(0.0).unwrap();
        let neg = cp.add_float(-0.0).unwrap();
        assert_ne!(pos, neg);
        let nan1 = cp.add_double(f64::NAN).unwrap();
        let nan2 = cp.add_double(f64::NAN).unwrap();
        assert_eq!(nan1, nan2);
    }

    #[test]
    fn test_refs_intern_components_transitively() {
        let mut cp = ConstantPool::new();
        let m = cp.add_method_ref("java.lang.Object", "<init>", "()V").unwrap();
        let class = cp.add_class("java/lang/Object").unwrap();
        match cp.get(m) {
            Some(Constant::MethodRef(c, _)) => assert_eq!(*c, class),
            other => panic!("unexpected entry {:?}", other),
        }
        assert_eq!(cp.class_name_at(class), Some("java/lang/Object"));
        let again = cp.add_method_ref("java/lang/Object", "<init>", "()V").unwrap();
        assert_eq!(m, again);
    }

    #[test]
    fn test_modified_utf8_nul_and_supplementary() {
        assert_eq!(encode_modified_utf8("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        let encoded = encode_modified_utf8("\u{1F600}");
        assert_eq!(encoded.len(), 6);
        assert_eq!(decode_modified_utf8(&encoded).as_deref(), Some("\u{1F600}"));
    }

    #[test]
    fn test_cloned_pool_compares_equal() {
        let mut cp = ConstantPool::new();
        cp.add_class("demo/Copy").unwrap();
        let mut copy = cp.clone();
        assert_eq!(copy, cp);
        copy.add_long(7).unwrap();
        assert_ne!(copy, cp);
        assert_eq!(cp.add_class("demo/Copy").unwrap(), 2);
    }
}
