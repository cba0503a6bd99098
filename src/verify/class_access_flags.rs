use crate::codegen::class::ClassFile;
use crate::codegen::defs::access_flags;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ClassAccessFlagsError {
    #[error("Invalid class access flags: 0x{0:04x}")]
    Invalid(u16),
}

pub type Result<T> = std::result::Result<T, ClassAccessFlagsError>;

const CLASS_FLAGS: u16 = access_flags::ACC_PUBLIC
    | access_flags::ACC_FINAL
    | access_flags::ACC_SUPER
    | access_flags::ACC_INTERFACE
    | access_flags::ACC_ABSTRACT;

/// Verify the ClassFile access flags
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let flags = class_file.access_flags;
    let has = |bit: u16| flags & bit != 0;

    if flags & !CLASS_FLAGS != 0 {
        return Err(ClassAccessFlagsError::Invalid(flags));
    }
    if has(access_flags::ACC_INTERFACE) {
        // interfaces are abstract and never final or super
        if !has(access_flags::ACC_ABSTRACT) || has(access_flags::ACC_FINAL) || has(access_flags::ACC_SUPER) {
            return Err(ClassAccessFlagsError::Invalid(flags));
        }
    } else if has(access_flags::ACC_FINAL) && has(access_flags::ACC_ABSTRACT) {
        return Err(ClassAccessFlagsError::Invalid(flags));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::defs::access_flags::*;

    #[test]
    fn test_flag_combinations() {
        let mut class = ClassFile::new();
        class.access_flags = ACC_PUBLIC | ACC_SUPER;
        assert!(verify(&class).is_ok());
        class.access_flags = ACC_FINAL | ACC_ABSTRACT;
        assert!(verify(&class).is_err());
        class.access_flags = ACC_INTERFACE;
        assert!(verify(&class).is_err());
        class.access_flags = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        assert!(verify(&class).is_ok());
        class.access_flags = ACC_PUBLIC | ACC_STATIC;
        assert!(verify(&class).is_err());
    }
}
