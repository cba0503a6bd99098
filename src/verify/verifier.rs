use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::defs::major_versions;

use super::attributes::AttributesVerifyError;
use super::class_access_flags::ClassAccessFlagsError;
use super::constant_pool::ConstantPoolVerifyError;
use super::fields::FieldVerifyError;
use super::interfaces::InterfacesVerifyError;
use super::methods::MethodVerifyError;
use super::{attributes, class_access_flags, constant_pool, fields, interfaces, methods};

pub type VerifyResult<T> = Result<T, VerifyError>;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("this_class {0} is not a Class constant")]
    InvalidThisClass(u16),
    #[error("super_class {0} is not a Class constant")]
    InvalidSuperClass(u16),
    #[error(transparent)]
    ConstantPool(#[from] ConstantPoolVerifyError),
    #[error(transparent)]
    ClassAccessFlags(#[from] ClassAccessFlagsError),
    #[error(transparent)]
    Interfaces(#[from] InterfacesVerifyError),
    #[error(transparent)]
    Fields(#[from] FieldVerifyError),
    #[error(transparent)]
    Methods(#[from] MethodVerifyError),
    #[error(transparent)]
    Attributes(#[from] AttributesVerifyError),
}

/// Verify the ClassFile by orchestrating all sub-verifiers
pub fn verify(class_file: &ClassFile) -> VerifyResult<()> {
    if class_file.major_version < major_versions::JAVA_1_0 || class_file.major_version > major_versions::JAVA_8 {
        return Err(VerifyError::UnsupportedVersion {
            major: class_file.major_version,
            minor: class_file.minor_version,
        });
    }
    constant_pool::verify(class_file)?;
    class_access_flags::verify(class_file)?;
    verify_this_class(class_file)?;
    verify_super_class(class_file)?;
    interfaces::verify(class_file)?;
    fields::verify(class_file)?;
    methods::verify(class_file)?;
    attributes::verify(class_file)?;
    Ok(())
}

fn verify_this_class(class_file: &ClassFile) -> VerifyResult<()> {
    match class_file.constant_pool.get(class_file.this_class) {
        Some(Constant::Class(_)) => Ok(()),
        _ => Err(VerifyError::InvalidThisClass(class_file.this_class)),
    }
}

fn verify_super_class(class_file: &ClassFile) -> VerifyResult<()> {
    let super_class = class_file.super_class;
    // Only java/lang/Object has no superclass
    if super_class == 0 && class_file.this_class_name() == Some("java/lang/Object") {
        return Ok(());
    }
    match class_file.constant_pool.get(super_class) {
        Some(Constant::Class(_)) => Ok(()),
        _ => Err(VerifyError::InvalidSuperClass(super_class)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::attribute::CodeAttribute;
    use crate::codegen::defs::access_flags::*;
    use crate::codegen::opcodes;

    fn valid_class() -> ClassFile {
        let mut class = ClassFile::new_class("Demo", "java.lang.Object", ACC_PUBLIC | ACC_SUPER).unwrap();
        class
            .add_method(ACC_PUBLIC, "<init>", "()V", Some(CodeAttribute::new(2, 1, vec![opcodes::RETURN])))
            .unwrap();
        class
    }

    #[test]
    fn test_valid_class_passes() {
        assert_eq!(verify(&valid_class()), Ok(()));
    }

    #[test]
    fn test_bad_super_class() {
        let mut class = valid_class();
        class.super_class = class.constant_pool.add_utf8("java/lang/Object").unwrap();
        assert!(matches!(verify(&class), Err(VerifyError::InvalidSuperClass(_))));
    }

    #[test]
    fn test_version_range() {
        let class = valid_class().with_version(60, 0);
        assert_eq!(verify(&class), Err(VerifyError::UnsupportedVersion { major: 60, minor: 0 }));
    }
}
