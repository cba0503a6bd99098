use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::descriptor::{JavaType, MethodDescriptor};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConstantPoolVerifyError {
    #[error("Invalid constant pool index {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Invalid constant pool index type {0}")]
    InvalidConstantPoolIndexType(u16),
    #[error("Malformed descriptor in NameAndType {0}")]
    MalformedDescriptor(u16),
}

pub type Result<T> = std::result::Result<T, ConstantPoolVerifyError>;

/// Verify the ClassFile ConstantPool
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let pool = &class_file.constant_pool;
    for (index, constant) in pool.iter() {
        match constant {
            Constant::Class(name_index) | Constant::String(name_index) => {
                expect(index, pool.get(*name_index), |c| matches!(c, Constant::Utf8(_)))?;
            }
            Constant::FieldRef(class_index, nat_index) => {
                expect(index, pool.get(*class_index), |c| matches!(c, Constant::Class(_)))?;
                expect(index, pool.get(*nat_index), |c| matches!(c, Constant::NameAndType(..)))?;
                if let Some(Constant::NameAndType(_, desc)) = pool.get(*nat_index) {
                    let descriptor = pool.utf8_at(*desc).unwrap_or_default();
                    JavaType::parse(descriptor).map_err(|_| ConstantPoolVerifyError::MalformedDescriptor(*nat_index))?;
                }
            }
            Constant::MethodRef(class_index, nat_index) | Constant::InterfaceMethodRef(class_index, nat_index) => {
                expect(index, pool.get(*class_index), |c| matches!(c, Constant::Class(_)))?;
                expect(index, pool.get(*nat_index), |c| matches!(c, Constant::NameAndType(..)))?;
                if let Some(Constant::NameAndType(_, desc)) = pool.get(*nat_index) {
                    let descriptor = pool.utf8_at(*desc).unwrap_or_default();
                    MethodDescriptor::parse(descriptor)
                        .map_err(|_| ConstantPoolVerifyError::MalformedDescriptor(*nat_index))?;
                }
            }
            Constant::NameAndType(name_index, desc_index) => {
                expect(index, pool.get(*name_index), |c| matches!(c, Constant::Utf8(_)))?;
                expect(index, pool.get(*desc_index), |c| matches!(c, Constant::Utf8(_)))?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn expect(index: u16, target: Option<&Constant>, is_expected: impl Fn(&Constant) -> bool) -> Result<()> {
    match target {
        Some(c) if is_expected(c) => Ok(()),
        None => Err(ConstantPoolVerifyError::InvalidConstantPoolIndex(index)),
        _ => Err(ConstantPoolVerifyError::InvalidConstantPoolIndexType(index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference() {
        let mut class = ClassFile::new();
        let utf8 = class.constant_pool.add_utf8("x").unwrap();
        let bad = class.constant_pool.intern(Constant::Class(utf8 + 10)).unwrap();
        assert_eq!(verify(&class), Err(ConstantPoolVerifyError::InvalidConstantPoolIndex(bad)));
    }

    #[test]
    fn test_wrong_tag() {
        let mut class = ClassFile::new();
        let int = class.constant_pool.add_integer(3).unwrap();
        let bad = class.constant_pool.intern(Constant::String(int)).unwrap();
        assert_eq!(verify(&class), Err(ConstantPoolVerifyError::InvalidConstantPoolIndexType(bad)));
    }

    #[test]
    fn test_malformed_method_descriptor() {
        let mut class = ClassFile::new();
        class.constant_pool.add_method_ref("A", "m", "(V)V").unwrap();
        assert!(matches!(verify(&class), Err(ConstantPoolVerifyError::MalformedDescriptor(_))));
    }
}
